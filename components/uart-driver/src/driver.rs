//! USART driver facade
//!
//! A [`SerialPort`] owns one register block and one receive ring. Splitting it
//! yields the two halves that run in different execution contexts:
//!
//! - [`RxHandler`]: the receive path. Call [`RxHandler::on_interrupt`] from the
//!   receive-complete interrupt, or [`RxHandler::poll`] from the main loop on
//!   targets without interrupts. It is the only code that can push into the
//!   ring.
//! - [`Uart`]: everything foreground code needs: `begin`/`end`, the
//!   non-blocking reads, `flush`, and the blocking transmit path.
//!
//! ```ignore
//! static mut PORT: SerialPort<MmioUsart> =
//!     SerialPort::new(unsafe { MmioUsart::new(Channel::Usart3) }, UartConfig::new(16_000_000));
//!
//! let (mut uart, rx) = unsafe { PORT.split() };
//! // hand `rx` to the USART3_RX interrupt, keep `uart` in the main loop
//! uart.begin(115_200)?;
//! ```

use core::fmt;

use uart_ring::{Consumer, Producer, RingBuffer, DEFAULT_CAPACITY};

use crate::baud::{BaudSetting, UartConfig};
use crate::error::{Result, UartError};
use crate::regs::{ControlB, StatusA, UsartRegisters};

/// Outcome of handling one received byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxEvent {
    /// The byte is in the receive ring
    Stored(u8),
    /// The ring was full; the byte is gone
    Dropped(u8),
}

/// Blocking byte output
///
/// Implemented by [`Uart`]; protocol layers write through this trait.
pub trait SerialWrite {
    /// Write one byte, waiting for the transmitter as long as it takes
    fn write_byte(&mut self, byte: u8);

    /// Write `bytes` in order, one at a time
    fn write_bytes(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.write_byte(byte);
        }
    }

    /// Write `s` followed by CR LF
    fn write_line(&mut self, s: &str) {
        self.write_bytes(s.as_bytes());
        self.write_bytes(b"\r\n");
    }
}

/// Open/closed state and configured rate; outlives any one split
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PortState {
    setting: Option<BaudSetting>,
    open: bool,
}

impl PortState {
    const CLOSED: Self = Self {
        setting: None,
        open: false,
    };
}

/// One USART channel with its receive ring
pub struct SerialPort<R: UsartRegisters, const N: usize = DEFAULT_CAPACITY> {
    regs: R,
    config: UartConfig,
    state: PortState,
    rx_buffer: RingBuffer<N>,
}

impl<R: UsartRegisters, const N: usize> SerialPort<R, N> {
    pub const fn new(regs: R, config: UartConfig) -> Self {
        Self {
            regs,
            config,
            state: PortState::CLOSED,
            rx_buffer: RingBuffer::new(),
        }
    }

    pub fn config(&self) -> UartConfig {
        self.config
    }

    pub fn is_open(&self) -> bool {
        self.state.open
    }

    /// Rate set by the last successful `begin`
    pub fn baud(&self) -> Option<u32> {
        self.state.setting.map(|s| s.baud)
    }

    /// Split into the foreground facade and the receive handler
    ///
    /// A new port starts closed; call [`Uart::begin`] to enable it. Splitting
    /// again keeps the state left by earlier handles.
    pub fn split(&mut self) -> (Uart<'_, R, N>, RxHandler<'_, R, N>) {
        let (producer, consumer) = self.rx_buffer.split();

        let uart = Uart {
            regs: &self.regs,
            config: self.config,
            rx: consumer,
            state: &mut self.state,
        };
        let handler = RxHandler {
            regs: &self.regs,
            rx: producer,
        };

        (uart, handler)
    }
}

/// Receive path
///
/// Reads one byte from the data register and stores it in the ring. When the
/// ring is full the byte is dropped: no retry, no blocking, no notification.
pub struct RxHandler<'a, R: UsartRegisters, const N: usize = DEFAULT_CAPACITY> {
    regs: &'a R,
    rx: Producer<'a, N>,
}

impl<'a, R: UsartRegisters, const N: usize> RxHandler<'a, R, N> {
    /// Receive-complete interrupt body
    ///
    /// Reading the data register clears the hardware's byte-ready condition.
    #[inline]
    pub fn on_interrupt(&mut self) -> RxEvent {
        let byte = self.regs.read_data();
        self.store(byte)
    }

    /// Polled variant for targets that run without the receive interrupt
    ///
    /// Returns `None` when no byte is waiting in the data register.
    #[inline]
    pub fn poll(&mut self) -> Option<RxEvent> {
        if self.regs.status().contains(StatusA::RX_COMPLETE) {
            Some(self.on_interrupt())
        } else {
            None
        }
    }

    /// Poll until the data register is empty; returns bytes taken
    pub fn drain(&mut self) -> usize {
        let mut taken = 0;
        while self.poll().is_some() {
            taken += 1;
        }
        taken
    }

    #[inline]
    fn store(&mut self, byte: u8) -> RxEvent {
        if self.rx.push(byte) {
            RxEvent::Stored(byte)
        } else {
            RxEvent::Dropped(byte)
        }
    }
}

/// Foreground side of a serial port
pub struct Uart<'a, R: UsartRegisters, const N: usize = DEFAULT_CAPACITY> {
    regs: &'a R,
    config: UartConfig,
    rx: Consumer<'a, N>,
    state: &'a mut PortState,
}

impl<'a, R: UsartRegisters, const N: usize> Uart<'a, R, N> {
    /// Configure the baud rate and enable receiver, transmitter and the
    /// receive interrupt
    ///
    /// May be called again to change the rate. Buffered bytes are kept.
    ///
    /// # Errors
    /// Returns an error, leaving the hardware untouched, if `baud` cannot be
    /// generated from the configured clock.
    pub fn begin(&mut self, baud: u32) -> Result<BaudSetting> {
        let setting = BaudSetting::compute(self.config.cpu_hz, baud)?;

        let mode = if setting.double_speed {
            StatusA::DOUBLE_SPEED
        } else {
            StatusA::empty()
        };
        self.regs.set_status(mode);
        self.regs.set_baud_divisor(setting.divisor);
        self.regs.modify_control(|c| c | ControlB::PORT_ENABLE);

        log::debug!(
            "[{}] open: baud={} divisor={} u2x={} actual={}",
            self.regs.name(),
            baud,
            setting.divisor,
            setting.double_speed,
            setting.actual_baud(self.config.cpu_hz)
        );

        self.state.setting = Some(setting);
        self.state.open = true;
        Ok(setting)
    }

    /// Disable receiver, transmitter and the receive interrupt
    ///
    /// Unread bytes stay in the ring until read or flushed.
    pub fn end(&mut self) {
        self.regs.modify_control(|c| c - ControlB::PORT_ENABLE);
        self.state.open = false;

        log::debug!(
            "[{}] close: {} byte(s) left unread",
            self.regs.name(),
            self.rx.available()
        );
    }

    pub fn is_open(&self) -> bool {
        self.state.open
    }

    /// Rate set by the last successful `begin`
    pub fn baud(&self) -> Option<u32> {
        self.state.setting.map(|s| s.baud)
    }

    pub fn setting(&self) -> Option<BaudSetting> {
        self.state.setting
    }

    /// Number of received bytes waiting to be read
    pub fn available(&self) -> usize {
        self.rx.available()
    }

    /// Next received byte without consuming it
    pub fn peek(&self) -> Option<u8> {
        self.rx.peek()
    }

    /// Next received byte, or `None` if nothing is buffered
    pub fn read(&mut self) -> Option<u8> {
        self.rx.pop()
    }

    /// Read up to `buf.len()` buffered bytes without waiting
    pub fn read_into(&mut self, buf: &mut [u8]) -> usize {
        let mut count = 0;
        for slot in buf.iter_mut() {
            match self.rx.pop() {
                Some(byte) => {
                    *slot = byte;
                    count += 1;
                }
                None => break,
            }
        }
        count
    }

    /// Discard everything in the receive ring
    ///
    /// There is no transmit buffer, so nothing happens on the transmit side.
    pub fn flush(&mut self) {
        self.rx.clear();
    }

    /// Write one byte, giving up after `spins` unsuccessful status polls
    ///
    /// Bounded alternative to [`SerialWrite::write_byte`], which waits forever.
    ///
    /// # Errors
    /// `TransmitTimeout` if the data register never became empty; the byte is
    /// not written.
    pub fn write_byte_timeout(&mut self, byte: u8, spins: u32) -> Result<()> {
        for _ in 0..spins {
            if self.tx_ready() {
                self.regs.write_data(byte);
                return Ok(());
            }
            core::hint::spin_loop();
        }

        log::warn!("[{}] transmitter stuck after {} polls", self.regs.name(), spins);
        Err(UartError::TransmitTimeout { spins })
    }

    #[inline]
    fn tx_ready(&self) -> bool {
        self.regs.status().contains(StatusA::DATA_REGISTER_EMPTY)
    }
}

impl<'a, R: UsartRegisters, const N: usize> SerialWrite for Uart<'a, R, N> {
    /// Spin until the data register is empty, then write `byte`
    ///
    /// Never returns if the hardware never reports ready.
    #[inline]
    fn write_byte(&mut self, byte: u8) {
        while !self.tx_ready() {
            core::hint::spin_loop();
        }
        self.regs.write_data(byte);
    }
}

impl<'a, R: UsartRegisters, const N: usize> fmt::Write for Uart<'a, R, N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write_bytes(s.as_bytes());
        Ok(())
    }
}
