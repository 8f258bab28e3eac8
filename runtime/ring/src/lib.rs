//! UART Receive Ring - Lock-free byte ring shared with an interrupt handler
//!
//! # Purpose
//! Buffers bytes written by the receive interrupt until foreground code reads
//! them. The ring has a fixed capacity, never allocates, and never blocks.
//!
//! # Integration Points
//! - Depends on: nothing (pure `core`)
//! - Provides to: `uart-driver` (receive path and driver facade)
//!
//! # Architecture
//! Two cursors index a `[u8; N]` array:
//! - `head`: next slot to write, owned by the producer (interrupt context)
//! - `tail`: next slot to read, owned by the consumer (foreground)
//!
//! The ring is empty when `head == tail` and full when advancing `head` would
//! land on `tail`, so one slot is always unused and `N - 1` bytes fit. There is
//! no shared counter: each context stores only the cursor it owns and loads the
//! other one, which keeps single-producer/single-consumer access lock-free.
//!
//! # Overflow
//! A push into a full ring drops the incoming byte and reports `false`
//! ([`OverflowPolicy::DropNewest`]). Nothing is counted and nobody is notified.
//!
//! # Memory Ordering
//! - Producer: writes the slot, then stores `head` with `Release`
//! - Consumer: loads `head` with `Acquire` before reading the slot, then
//!   stores `tail` with `Release`
//! - Producer loads `tail` with `Acquire` before reusing a freed slot

#![no_std]

#[cfg(test)]
#[macro_use]
extern crate std;

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicUsize, Ordering};

use static_assertions::const_assert;

/// Receive capacity used by the stock driver (127 usable bytes)
pub const DEFAULT_CAPACITY: usize = 128;

const_assert!(DEFAULT_CAPACITY.is_power_of_two());

/// What happens to a byte pushed into a full ring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// The incoming byte is discarded; buffered bytes are untouched
    DropNewest,
}

/// Fixed-capacity circular byte buffer
///
/// # Type Parameters
/// * `N` - Storage length. Any `N >= 2` works; `N - 1` bytes are usable.
///
/// # Access
/// The `&mut self` methods are for exclusive, single-context use. To share the
/// ring between an interrupt handler and foreground code, [`split`] it into a
/// [`Producer`] and a [`Consumer`].
///
/// [`split`]: RingBuffer::split
pub struct RingBuffer<const N: usize> {
    storage: UnsafeCell<[u8; N]>,
    head: AtomicUsize,
    tail: AtomicUsize,
}

// Storage is only written through `&mut self` or the unique `Producer` handle,
// and only read at slots the producer has published via `head`.
unsafe impl<const N: usize> Sync for RingBuffer<N> {}

impl<const N: usize> RingBuffer<N> {
    /// Overflow behaviour of every ring
    pub const OVERFLOW_POLICY: OverflowPolicy = OverflowPolicy::DropNewest;

    const VALID_CAPACITY: () = assert!(N >= 2, "ring storage needs at least two slots");

    /// Create an empty ring
    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::VALID_CAPACITY;

        Self {
            storage: UnsafeCell::new([0; N]),
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
        }
    }

    /// Number of bytes the ring can hold (`N - 1`)
    pub const fn capacity(&self) -> usize {
        N - 1
    }

    /// Store one byte; returns `false` and drops `byte` if the ring is full
    pub fn push(&mut self, byte: u8) -> bool {
        self.push_shared(byte)
    }

    /// Remove the oldest byte
    pub fn pop(&mut self) -> Option<u8> {
        self.pop_shared()
    }

    /// Look at the oldest byte without removing it
    pub fn peek(&self) -> Option<u8> {
        self.peek_shared()
    }

    /// Number of unread bytes
    pub fn available(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        (N + head - tail) % N
    }

    pub fn is_empty(&self) -> bool {
        self.head.load(Ordering::Acquire) == self.tail.load(Ordering::Acquire)
    }

    pub fn is_full(&self) -> bool {
        let head = self.head.load(Ordering::Acquire);
        Self::advance(head) == self.tail.load(Ordering::Acquire)
    }

    /// Discard all unread bytes by moving `tail` up to `head`
    ///
    /// Storage is not zeroed.
    pub fn clear(&mut self) {
        self.clear_shared()
    }

    /// Split into producer and consumer halves
    ///
    /// The halves borrow the ring, so no other access is possible while they
    /// are alive. Each half writes only the cursor it owns.
    pub fn split(&mut self) -> (Producer<'_, N>, Consumer<'_, N>) {
        (Producer { ring: self }, Consumer { ring: self })
    }

    #[inline]
    const fn advance(index: usize) -> usize {
        if index + 1 == N {
            0
        } else {
            index + 1
        }
    }

    #[inline]
    fn slot(&self, index: usize) -> *mut u8 {
        debug_assert!(index < N);
        // Stays inside the array; no reference to the whole storage is formed.
        unsafe { self.storage.get().cast::<u8>().add(index) }
    }

    // Producer side. Caller must be the only producer.
    fn push_shared(&self, byte: u8) -> bool {
        let head = self.head.load(Ordering::Relaxed);
        let next = Self::advance(head);

        if next == self.tail.load(Ordering::Acquire) {
            return false;
        }

        unsafe {
            self.slot(head).write(byte);
        }
        self.head.store(next, Ordering::Release);
        true
    }

    // Consumer side. Caller must be the only consumer.
    fn pop_shared(&self) -> Option<u8> {
        let tail = self.tail.load(Ordering::Relaxed);
        if tail == self.head.load(Ordering::Acquire) {
            return None;
        }

        let byte = unsafe { self.slot(tail).read() };
        self.tail.store(Self::advance(tail), Ordering::Release);
        Some(byte)
    }

    fn peek_shared(&self) -> Option<u8> {
        let tail = self.tail.load(Ordering::Relaxed);
        if tail == self.head.load(Ordering::Acquire) {
            None
        } else {
            Some(unsafe { self.slot(tail).read() })
        }
    }

    fn clear_shared(&self) {
        // Only `tail` moves; moving `head` here could race the producer and
        // make an empty ring look full.
        let head = self.head.load(Ordering::Acquire);
        self.tail.store(head, Ordering::Release);
    }
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> core::fmt::Debug for RingBuffer<N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RingBuffer")
            .field("capacity", &(N - 1))
            .field("head", &self.head.load(Ordering::Relaxed))
            .field("tail", &self.tail.load(Ordering::Relaxed))
            .finish()
    }
}

/// Producer handle (interrupt side)
///
/// Only allows `push`. Moves `head`, reads `tail`.
pub struct Producer<'a, const N: usize> {
    ring: &'a RingBuffer<N>,
}

impl<'a, const N: usize> Producer<'a, N> {
    /// Store one byte; returns `false` and drops `byte` if the ring is full
    #[inline]
    pub fn push(&mut self, byte: u8) -> bool {
        self.ring.push_shared(byte)
    }

    pub fn is_full(&self) -> bool {
        self.ring.is_full()
    }
}

/// Consumer handle (foreground side)
///
/// Moves `tail`, reads `head`.
pub struct Consumer<'a, const N: usize> {
    ring: &'a RingBuffer<N>,
}

impl<'a, const N: usize> Consumer<'a, N> {
    pub fn pop(&mut self) -> Option<u8> {
        self.ring.pop_shared()
    }

    pub fn peek(&self) -> Option<u8> {
        self.ring.peek_shared()
    }

    pub fn available(&self) -> usize {
        self.ring.available()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Discard all unread bytes
    pub fn clear(&mut self) {
        self.ring.clear_shared()
    }

    pub fn capacity(&self) -> usize {
        N - 1
    }
}
