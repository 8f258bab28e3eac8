use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use uart_ring::{RingBuffer, DEFAULT_CAPACITY};

fn push_pop(c: &mut Criterion) {
    c.bench_function("push_pop_single", |b| {
        let mut ring: RingBuffer<DEFAULT_CAPACITY> = RingBuffer::new();
        b.iter(|| {
            ring.push(black_box(0x5A));
            black_box(ring.pop())
        })
    });

    c.bench_function("fill_drain_127", |b| {
        let mut ring: RingBuffer<DEFAULT_CAPACITY> = RingBuffer::new();
        b.iter(|| {
            let mut byte = 0u8;
            while ring.push(byte) {
                byte = byte.wrapping_add(1);
            }
            while let Some(v) = ring.pop() {
                black_box(v);
            }
        })
    });

    c.bench_function("split_push_pop", |b| {
        let mut ring: RingBuffer<DEFAULT_CAPACITY> = RingBuffer::new();
        let (mut producer, mut consumer) = ring.split();
        b.iter(|| {
            producer.push(black_box(0xA5));
            black_box(consumer.pop())
        })
    });
}

criterion_group!(benches, push_pop);
criterion_main!(benches);
