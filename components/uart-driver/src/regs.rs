//! USART register model
//!
//! Bit layouts of the control/status registers and the [`UsartRegisters`]
//! trait the driver talks to. Real hardware implements it with volatile MMIO
//! (see [`crate::mmio`]); host tests use the simulated block in `sim`.

use bitflags::bitflags;

bitflags! {
    /// Control and Status Register A (UCSRnA)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StatusA: u8 {
        /// Multi-processor communication mode
        const MULTI_PROCESSOR = 1 << 0;
        /// Double transmission speed (U2X)
        const DOUBLE_SPEED = 1 << 1;
        const PARITY_ERROR = 1 << 2;
        const DATA_OVERRUN = 1 << 3;
        const FRAME_ERROR = 1 << 4;
        /// Transmit data register empty (UDRE)
        const DATA_REGISTER_EMPTY = 1 << 5;
        const TX_COMPLETE = 1 << 6;
        /// Unread byte in the receive data register (RXC)
        const RX_COMPLETE = 1 << 7;
    }
}

bitflags! {
    /// Control and Status Register B (UCSRnB)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ControlB: u8 {
        const TX_BIT8 = 1 << 0;
        const RX_BIT8 = 1 << 1;
        const CHAR_SIZE_2 = 1 << 2;
        /// Transmitter enable (TXEN)
        const TX_ENABLE = 1 << 3;
        /// Receiver enable (RXEN)
        const RX_ENABLE = 1 << 4;
        const DATA_EMPTY_IRQ = 1 << 5;
        const TX_COMPLETE_IRQ = 1 << 6;
        /// Receive complete interrupt enable (RXCIE)
        const RX_COMPLETE_IRQ = 1 << 7;
    }
}

impl ControlB {
    /// Bits `begin` sets and `end` clears
    pub const PORT_ENABLE: Self = Self::RX_ENABLE
        .union(Self::TX_ENABLE)
        .union(Self::RX_COMPLETE_IRQ);
}

/// Register access for one USART channel
///
/// All methods take `&self`: the receive interrupt and foreground code both
/// hold a shared reference to the same register block.
pub trait UsartRegisters {
    /// Short channel name used in log output
    fn name(&self) -> &'static str {
        "usart"
    }

    fn status(&self) -> StatusA;

    fn set_status(&self, value: StatusA);

    fn control(&self) -> ControlB;

    fn set_control(&self, value: ControlB);

    /// Program the 12-bit baud rate register (UBRRnH:UBRRnL)
    fn set_baud_divisor(&self, divisor: u16);

    /// Read the receive data register; clears `RX_COMPLETE`
    fn read_data(&self) -> u8;

    /// Write the transmit data register
    fn write_data(&self, byte: u8);

    /// Read-modify-write of the control register
    fn modify_control<F>(&self, f: F)
    where
        F: FnOnce(ControlB) -> ControlB,
    {
        self.set_control(f(self.control()));
    }
}

impl<T: UsartRegisters + ?Sized> UsartRegisters for &T {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn status(&self) -> StatusA {
        (**self).status()
    }

    fn set_status(&self, value: StatusA) {
        (**self).set_status(value)
    }

    fn control(&self) -> ControlB {
        (**self).control()
    }

    fn set_control(&self, value: ControlB) {
        (**self).set_control(value)
    }

    fn set_baud_divisor(&self, divisor: u16) {
        (**self).set_baud_divisor(divisor)
    }

    fn read_data(&self) -> u8 {
        (**self).read_data()
    }

    fn write_data(&self, byte: u8) {
        (**self).write_data(byte)
    }
}
