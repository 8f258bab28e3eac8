//! USART Driver - Interrupt-driven receive, blocking transmit
//!
//! # Purpose
//! Serial I/O for one full-duplex USART channel: received bytes are buffered
//! by the receive interrupt in a fixed ring, transmitted bytes are written
//! straight to the hardware after spinning on the data-register-empty flag.
//!
//! # Integration Points
//! - Depends on: `uart-ring` (receive buffer)
//! - Provides to: protocol layers (`spindle-link`), application main loops
//! - Hardware: any [`UsartRegisters`] implementor ([`MmioUsart`] on target,
//!   `SimUsart` on the host)
//!
//! # Architecture
//! ```text
//! wire -> RxHandler::on_interrupt/poll -> RingBuffer -> Uart::read/peek/available
//! Uart::write_byte/write_bytes -> spin on DATA_REGISTER_EMPTY -> data register -> wire
//! ```
//! The receive interrupt owns the ring's `head`; foreground code owns `tail`.
//! No locks are taken on either side.
//!
//! # Error Policy
//! - Receive overflow: the newest byte is dropped silently
//! - Empty read: `None`
//! - Stuck transmitter: `write_byte` never returns; `write_byte_timeout` is
//!   the bounded alternative
//! - Unreachable baud rate: `begin` returns [`UartError`]
//!
//! # Testing Strategy
//! - Unit tests: baud divisors, register layout, facade operations on `SimUsart`
//! - Integration tests: receive interrupt and foreground reader on separate
//!   threads, paced transmitter

#![no_std]

#[cfg(test)]
#[macro_use]
extern crate std;

mod baud;
mod driver;
mod error;
mod mmio;
mod regs;

#[cfg(feature = "sim")]
pub mod sim;

pub use baud::{uses_double_speed, BaudSetting, UartConfig, DEFAULT_CPU_HZ, MAX_DIVISOR};
pub use driver::{RxEvent, RxHandler, SerialPort, SerialWrite, Uart};
pub use error::{Result, UartError};
pub use mmio::{Channel, MmioUsart};
pub use regs::{ControlB, StatusA, UsartRegisters};
pub use uart_ring::{OverflowPolicy, DEFAULT_CAPACITY};
