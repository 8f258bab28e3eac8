//! Simulated USART for host-side testing
//!
//! # WARNING: This is NOT real hardware!
//!
//! Models just enough of a USART channel to drive the receive and transmit
//! paths from ordinary threads:
//! - `inject` latches one byte in the receive data register and raises
//!   `RX_COMPLETE`, as a wire byte arriving would
//! - transmitted bytes are captured in a fixed log
//! - the transmitter is either always ready, or ready once per
//!   [`SimUsart::grant_tx_ready`] call so tests can pace the sender
//!
//! Everything is atomic, so a `&SimUsart` can be shared between the thread
//! playing the interrupt and the thread playing foreground code.

use core::sync::atomic::{AtomicBool, AtomicU16, AtomicU8, AtomicUsize, Ordering};

use crate::regs::{ControlB, StatusA, UsartRegisters};

/// Bytes the transmit log keeps; later writes are counted but not stored
pub const TX_LOG_CAPACITY: usize = 1024;

pub struct SimUsart {
    status: AtomicU8,
    control: AtomicU8,
    divisor: AtomicU16,
    rx_data: AtomicU8,
    rx_ready: AtomicBool,
    tx_paced: AtomicBool,
    tx_credits: AtomicUsize,
    tx_log: [AtomicU8; TX_LOG_CAPACITY],
    tx_len: AtomicUsize,
    status_reads: AtomicUsize,
}

impl SimUsart {
    /// Idle channel with an always-ready transmitter
    pub const fn new() -> Self {
        Self::with_pacing(false)
    }

    /// Channel whose transmitter is ready only after `grant_tx_ready`
    pub const fn paced() -> Self {
        Self::with_pacing(true)
    }

    const fn with_pacing(paced: bool) -> Self {
        Self {
            status: AtomicU8::new(0),
            control: AtomicU8::new(0),
            divisor: AtomicU16::new(0),
            rx_data: AtomicU8::new(0),
            rx_ready: AtomicBool::new(false),
            tx_paced: AtomicBool::new(paced),
            tx_credits: AtomicUsize::new(0),
            tx_log: [const { AtomicU8::new(0) }; TX_LOG_CAPACITY],
            tx_len: AtomicUsize::new(0),
            status_reads: AtomicUsize::new(0),
        }
    }

    /// A byte arrives on the wire
    ///
    /// Overwrites an unread byte, like a hardware overrun.
    pub fn inject(&self, byte: u8) {
        self.rx_data.store(byte, Ordering::Relaxed);
        self.rx_ready.store(true, Ordering::Release);
    }

    /// One "transmit register empty" cycle for a paced transmitter
    pub fn grant_tx_ready(&self) {
        self.tx_credits.fetch_add(1, Ordering::AcqRel);
    }

    /// Number of bytes written to the data register
    pub fn tx_len(&self) -> usize {
        self.tx_len.load(Ordering::Acquire)
    }

    /// Byte at position `index` of the transmit log
    pub fn tx_byte(&self, index: usize) -> Option<u8> {
        if index < self.tx_len().min(TX_LOG_CAPACITY) {
            Some(self.tx_log[index].load(Ordering::Relaxed))
        } else {
            None
        }
    }

    /// Transmitted bytes in order
    pub fn transmitted(&self) -> impl Iterator<Item = u8> + '_ {
        let len = self.tx_len().min(TX_LOG_CAPACITY);
        self.tx_log[..len].iter().map(|b| b.load(Ordering::Relaxed))
    }

    pub fn clear_tx(&self) {
        self.tx_len.store(0, Ordering::Release);
    }

    /// Last value written to the baud rate register
    pub fn divisor(&self) -> u16 {
        self.divisor.load(Ordering::Relaxed)
    }

    /// How many times the status register has been read
    pub fn status_reads(&self) -> usize {
        self.status_reads.load(Ordering::Relaxed)
    }

    fn tx_ready(&self) -> bool {
        !self.tx_paced.load(Ordering::Relaxed) || self.tx_credits.load(Ordering::Acquire) > 0
    }
}

impl Default for SimUsart {
    fn default() -> Self {
        Self::new()
    }
}

impl UsartRegisters for SimUsart {
    fn name(&self) -> &'static str {
        "sim"
    }

    fn status(&self) -> StatusA {
        self.status_reads.fetch_add(1, Ordering::Relaxed);

        let mut status = StatusA::from_bits_retain(self.status.load(Ordering::Relaxed));
        status.set(StatusA::RX_COMPLETE, self.rx_ready.load(Ordering::Acquire));
        status.set(StatusA::DATA_REGISTER_EMPTY, self.tx_ready());
        status
    }

    fn set_status(&self, value: StatusA) {
        // Only the mode bits are writable
        let writable = StatusA::DOUBLE_SPEED | StatusA::MULTI_PROCESSOR;
        self.status.store((value & writable).bits(), Ordering::Relaxed);
    }

    fn control(&self) -> ControlB {
        ControlB::from_bits_retain(self.control.load(Ordering::Relaxed))
    }

    fn set_control(&self, value: ControlB) {
        self.control.store(value.bits(), Ordering::Relaxed);
    }

    fn set_baud_divisor(&self, divisor: u16) {
        self.divisor.store(divisor & 0x0FFF, Ordering::Relaxed);
    }

    fn read_data(&self) -> u8 {
        let byte = self.rx_data.load(Ordering::Relaxed);
        self.rx_ready.store(false, Ordering::Release);
        byte
    }

    fn write_data(&self, byte: u8) {
        if self.tx_paced.load(Ordering::Relaxed) {
            // Consume the ready cycle that allowed this write
            let _ = self
                .tx_credits
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |c| c.checked_sub(1));
        }

        let index = self.tx_len.load(Ordering::Relaxed);
        if index < TX_LOG_CAPACITY {
            self.tx_log[index].store(byte, Ordering::Relaxed);
        }
        self.tx_len.store(index + 1, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::vec::Vec;

    #[test]
    fn test_inject_sets_and_read_clears_rx_complete() {
        let sim = SimUsart::new();
        assert!(!sim.status().contains(StatusA::RX_COMPLETE));

        sim.inject(0x42);
        assert!(sim.status().contains(StatusA::RX_COMPLETE));
        assert_eq!(sim.read_data(), 0x42);
        assert!(!sim.status().contains(StatusA::RX_COMPLETE));
    }

    #[test]
    fn test_paced_transmitter_needs_credit() {
        let sim = SimUsart::paced();
        assert!(!sim.status().contains(StatusA::DATA_REGISTER_EMPTY));

        sim.grant_tx_ready();
        assert!(sim.status().contains(StatusA::DATA_REGISTER_EMPTY));
        sim.write_data(0x10);
        assert!(!sim.status().contains(StatusA::DATA_REGISTER_EMPTY));
        assert_eq!(sim.transmitted().collect::<Vec<_>>(), vec![0x10]);
    }

    #[test]
    fn test_status_mode_bits_only() {
        let sim = SimUsart::new();
        sim.set_status(StatusA::DOUBLE_SPEED | StatusA::FRAME_ERROR);
        let status = sim.status();
        assert!(status.contains(StatusA::DOUBLE_SPEED));
        assert!(!status.contains(StatusA::FRAME_ERROR));
    }

    #[test]
    fn test_tx_log_and_clear() {
        let sim = SimUsart::new();
        for b in b"abc" {
            sim.write_data(*b);
        }
        assert_eq!(sim.tx_len(), 3);
        assert_eq!(sim.tx_byte(1), Some(b'b'));
        assert_eq!(sim.tx_byte(3), None);

        sim.clear_tx();
        assert_eq!(sim.tx_len(), 0);
        assert_eq!(sim.transmitted().count(), 0);
    }
}
