//! Property-based tests for the public Queue API, covering the laws listed
//! in SPEC_FULL.md §8.

use proptest::prelude::*;
use ringqueue::Queue;

proptest! {
    /// FIFO: with a single producer and single consumer, the sequence of
    /// bytes pushed equals the sequence popped, regardless of batch sizing.
    #[test]
    fn prop_fifo_round_trip(
        bytes in prop::collection::vec(any::<u8>(), 0..512),
        push_batch in 1usize..64,
        pop_batch in 1usize..64,
    ) {
        let (producer, consumer) = Queue::new(1, 0).unwrap();

        for chunk in bytes.chunks(push_batch) {
            producer.push(chunk, chunk.len());
        }
        drop(producer);

        let mut received = Vec::with_capacity(bytes.len());
        let mut buf = vec![0u8; pop_batch];
        loop {
            let n = consumer.pop(&mut buf, pop_batch);
            if n == 0 {
                break;
            }
            received.extend_from_slice(&buf[..n]);
        }

        prop_assert_eq!(received, bytes);
    }

    /// Capacity bound: `max_cap` is always the next power of two at or above
    /// the requested limit, and a burst within that bound never blocks a
    /// solitary producer/consumer pair that drains it back out immediately.
    #[test]
    fn prop_capacity_bound(
        limit in 1usize..64,
        pushes in prop::collection::vec(1usize..16, 0..20),
    ) {
        let (producer, consumer) = Queue::new(1, limit).unwrap();
        let max_cap = producer.max_cap();
        prop_assert!(max_cap >= limit);
        prop_assert!(max_cap.is_power_of_two());

        for count in pushes {
            let count = count.min(max_cap);
            let data = vec![0u8; count];
            producer.push(&data, count);
            let mut buf = vec![0u8; count];
            prop_assert_eq!(consumer.pop(&mut buf, count), count);
        }
    }

    /// Shrink idempotence: after draining a queue to empty, repeated empty
    /// pops against an already-minimal buffer never panic or hang.
    #[test]
    fn prop_drain_then_idle_pops_are_harmless(
        bytes in prop::collection::vec(any::<u8>(), 0..256),
    ) {
        let (producer, consumer) = Queue::new(1, 0).unwrap();
        producer.push(&bytes, bytes.len());
        drop(producer);

        let mut buf = vec![0u8; bytes.len().max(1)];
        let mut total = 0;
        loop {
            let n = consumer.pop(&mut buf, buf.len());
            if n == 0 {
                break;
            }
            total += n;
        }
        prop_assert_eq!(total, bytes.len());
        // Further pops against the now-released ring must keep returning 0.
        prop_assert_eq!(consumer.pop(&mut buf, 1), 0);
    }
}
