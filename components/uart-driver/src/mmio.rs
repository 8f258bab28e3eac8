//! AVR USART Hardware Interface
//!
//! Volatile access to the memory-mapped USART register blocks of the
//! ATmega640/1280/2560 family.
//! Reference: ATmega640/1280/1281/2560/2561 datasheet, section 22 (USART)

use core::ptr::{read_volatile, write_volatile};

use crate::regs::{ControlB, StatusA, UsartRegisters};

/// Register offsets from the channel base
const UCSRA: usize = 0x0; // Control and Status A
const UCSRB: usize = 0x1; // Control and Status B
const UBRRL: usize = 0x4; // Baud Rate low byte
const UBRRH: usize = 0x5; // Baud Rate high nibble
const UDR: usize = 0x6; // Data Register

/// Physical USART channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Usart0,
    Usart1,
    Usart2,
    Usart3,
}

impl Channel {
    /// Data-space address of the channel's UCSRnA register
    pub const fn base(self) -> usize {
        match self {
            Channel::Usart0 => 0xC0,
            Channel::Usart1 => 0xC8,
            Channel::Usart2 => 0xD0,
            Channel::Usart3 => 0x130,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Channel::Usart0 => "usart0",
            Channel::Usart1 => "usart1",
            Channel::Usart2 => "usart2",
            Channel::Usart3 => "usart3",
        }
    }
}

/// Memory-mapped USART register block
pub struct MmioUsart {
    base: usize,
    channel: Channel,
}

impl MmioUsart {
    /// Create a register block for `channel`
    ///
    /// # Safety
    /// The caller must ensure the channel's registers are mapped at their
    /// datasheet addresses and that no other owner drives this channel.
    pub const unsafe fn new(channel: Channel) -> Self {
        Self {
            base: channel.base(),
            channel,
        }
    }

    /// Create a register block at a relocated base address
    ///
    /// # Safety
    /// `base` must point to a valid USART register block.
    pub const unsafe fn at(base: usize, channel: Channel) -> Self {
        Self { base, channel }
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    #[inline]
    unsafe fn read_reg(&self, offset: usize) -> u8 {
        read_volatile((self.base + offset) as *const u8)
    }

    #[inline]
    unsafe fn write_reg(&self, offset: usize, value: u8) {
        write_volatile((self.base + offset) as *mut u8, value);
    }
}

impl UsartRegisters for MmioUsart {
    fn name(&self) -> &'static str {
        self.channel.name()
    }

    fn status(&self) -> StatusA {
        StatusA::from_bits_retain(unsafe { self.read_reg(UCSRA) })
    }

    fn set_status(&self, value: StatusA) {
        unsafe { self.write_reg(UCSRA, value.bits()) }
    }

    fn control(&self) -> ControlB {
        ControlB::from_bits_retain(unsafe { self.read_reg(UCSRB) })
    }

    fn set_control(&self, value: ControlB) {
        unsafe { self.write_reg(UCSRB, value.bits()) }
    }

    fn set_baud_divisor(&self, divisor: u16) {
        // High byte first: writing UBRRL latches the new rate
        unsafe {
            self.write_reg(UBRRH, (divisor >> 8) as u8 & 0x0F);
            self.write_reg(UBRRL, divisor as u8);
        }
    }

    fn read_data(&self) -> u8 {
        unsafe { self.read_reg(UDR) }
    }

    fn write_data(&self, byte: u8) {
        unsafe { self.write_reg(UDR, byte) }
    }
}

// Plain MMIO address; both contexts reach the registers through `&self`.
unsafe impl Send for MmioUsart {}
unsafe impl Sync for MmioUsart {}
