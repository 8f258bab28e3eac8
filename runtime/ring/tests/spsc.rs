//! Producer/consumer tests for the receive ring
//!
//! These run the two halves of a split ring on separate threads, standing in
//! for the receive interrupt and the foreground loop.

use std::sync::atomic::{AtomicBool, Ordering};

use uart_ring::RingBuffer;

/// Scenario from the driver documentation: capacity 8, 7 usable slots
#[test]
fn test_capacity_eight_scenario() {
    let mut ring: RingBuffer<8> = RingBuffer::new();

    for byte in 1..=7u8 {
        assert!(ring.push(byte), "push {} should succeed", byte);
    }
    assert_eq!(ring.available(), 7);

    assert!(!ring.push(8));
    assert_eq!(ring.available(), 7);

    for expected in 1..=4u8 {
        assert_eq!(ring.pop(), Some(expected));
    }
    assert_eq!(ring.available(), 3);

    assert!(ring.push(9));

    let mut rest = Vec::new();
    while let Some(byte) = ring.pop() {
        rest.push(byte);
    }
    assert_eq!(rest, vec![5, 6, 7, 9]);
    assert_eq!(ring.available(), 0);
}

/// Any `N - 1` pushes are accepted and come back in order
#[test]
fn test_fill_to_capacity_for_several_sizes() {
    fn fill<const N: usize>() {
        let mut ring: RingBuffer<N> = RingBuffer::new();
        for i in 0..N - 1 {
            assert!(ring.push(i as u8));
            assert_eq!(ring.available(), i + 1);
        }
        assert!(!ring.push(0xEE));
        assert_eq!(ring.available(), N - 1);
        for i in 0..N - 1 {
            assert_eq!(ring.pop(), Some(i as u8));
        }
        assert_eq!(ring.pop(), None);
    }

    fill::<2>();
    fill::<3>();
    fill::<8>();
    fill::<100>();
    fill::<128>();
}

#[test]
fn test_flush_empties_full_ring() {
    let mut ring: RingBuffer<16> = RingBuffer::new();
    while ring.push(0x55) {}
    assert!(ring.is_full());

    ring.clear();
    assert_eq!(ring.available(), 0);
    assert_eq!(ring.peek(), None);
}

/// Concurrent producer and consumer: every stored byte is seen exactly once,
/// in order. Bytes the producer saw rejected are not expected.
#[test]
fn test_interleaved_producer_consumer() {
    const TOTAL: usize = 200_000;

    let mut ring: RingBuffer<32> = RingBuffer::new();
    let (mut producer, mut consumer) = ring.split();

    let done = AtomicBool::new(false);

    let (stored, received) = crossbeam::thread::scope(|s| {
        let done = &done;

        let producer_thread = s.spawn(move |_| {
            let mut stored = Vec::with_capacity(TOTAL);
            for i in 0..TOTAL {
                // Repeating sequence lets the comparison catch loss or duplication
                let byte = (i % 251) as u8;
                if producer.push(byte) {
                    stored.push(byte);
                }
            }
            done.store(true, Ordering::Release);
            stored
        });

        let consumer_thread = s.spawn(move |_| {
            let mut received = Vec::with_capacity(TOTAL);
            loop {
                let finished = done.load(Ordering::Acquire);
                let before = consumer.available();
                match consumer.pop() {
                    Some(byte) => {
                        assert!(before >= 1);
                        received.push(byte);
                    }
                    None if finished => break,
                    None => std::hint::spin_loop(),
                }
            }
            received
        });

        let stored = producer_thread.join().unwrap();
        let received = consumer_thread.join().unwrap();
        (stored, received)
    })
    .unwrap();

    assert!(!stored.is_empty());
    assert_eq!(received, stored);
}

/// Same as above but the consumer drains with `clear` now and then; whatever
/// it does read must still be an in-order subsequence of what was stored.
#[test]
fn test_interleaved_with_clear_preserves_order() {
    const TOTAL: usize = 50_000;

    let mut ring: RingBuffer<16> = RingBuffer::new();
    let (mut producer, mut consumer) = ring.split();

    let (stored, received) = crossbeam::thread::scope(|s| {
        let p = s.spawn(move |_| {
            let mut stored = Vec::new();
            for i in 0..TOTAL {
                let value = (i % 256) as u8;
                if producer.push(value) {
                    stored.push(value);
                }
            }
            stored
        });

        let c = s.spawn(move |_| {
            let mut received = Vec::new();
            for round in 0..TOTAL {
                if round % 97 == 0 {
                    consumer.clear();
                } else if let Some(byte) = consumer.pop() {
                    received.push(byte);
                }
            }
            while let Some(byte) = consumer.pop() {
                received.push(byte);
            }
            received
        });

        (p.join().unwrap(), c.join().unwrap())
    })
    .unwrap();

    // `received` must be a subsequence of `stored`
    let mut it = stored.iter();
    for byte in &received {
        assert!(it.any(|b| b == byte), "byte {} out of order or duplicated", byte);
    }
}
