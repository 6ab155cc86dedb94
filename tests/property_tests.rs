//! Property-based tests for the invariants a bounded MPMC channel must hold
//! under any interleaving of sends and receives.
//!
//! Coverage:
//! - length never exceeds capacity
//! - `is_empty`/`is_full`/`len` agree with each other at every step
//! - FIFO order is preserved for a single producer / single consumer pair
//! - values are conserved (never duplicated, never lost) across an MPMC run
//! - closing is monotonic: once closed, always closed

use proptest::prelude::*;
use ringmpmc_rs::{Channel, TryRecvError, TrySendError};

proptest! {
    /// The length of the channel never exceeds its capacity, and `is_full`
    /// agrees with `len() == capacity`.
    #[test]
    fn prop_length_bounded_by_capacity(
        capacity in 1usize..32,
        ops in prop::collection::vec(prop::bool::ANY, 0..200),
    ) {
        let channel = Channel::<u64>::new(capacity).unwrap();
        let mut model_len = 0usize;

        for (i, is_send) in ops.into_iter().enumerate() {
            if is_send {
                match channel.try_send(i as u64) {
                    Ok(()) => model_len += 1,
                    Err(TrySendError::Full(_)) => {}
                    Err(TrySendError::Closed(_)) => unreachable!(),
                }
            } else if channel.try_recv().is_ok() {
                model_len -= 1;
            }

            prop_assert!(channel.len() <= capacity);
            prop_assert_eq!(channel.len(), model_len);
            prop_assert_eq!(channel.is_empty(), model_len == 0);
            prop_assert_eq!(channel.is_full(), model_len == capacity);
        }
    }

    /// A single producer / single consumer pair observes values in exactly
    /// the order they were sent, even when sends and receives interleave
    /// arbitrarily against a small ring.
    #[test]
    fn prop_fifo_order_single_producer_single_consumer(
        capacity in 1usize..8,
        values in prop::collection::vec(0u64..10_000, 0..300),
    ) {
        let channel = Channel::<u64>::new(capacity).unwrap();
        let mut received = Vec::with_capacity(values.len());

        for &v in &values {
            // Retry until the value is accepted; a proptest-shrunk capacity
            // of 1 with many values forces genuine full/drain cycling.
            loop {
                match channel.try_send(v) {
                    Ok(()) => break,
                    Err(TrySendError::Full(returned)) => {
                        if let Ok(got) = channel.try_recv() {
                            received.push(got);
                        }
                        prop_assert_eq!(returned, v);
                    }
                    Err(TrySendError::Closed(_)) => unreachable!(),
                }
            }
        }

        while let Ok(v) = channel.try_recv() {
            received.push(v);
        }

        prop_assert_eq!(received, values);
    }

    /// Across a handful of concurrent producers and consumers, every sent
    /// value is received exactly once (no duplication, no loss).
    #[test]
    fn prop_values_conserved_under_concurrency(
        n_producers in 1usize..4,
        items_per_producer in 1u64..200,
    ) {
        use std::sync::Arc;
        use std::thread;

        let channel = Arc::new(Channel::<u64>::new(8).unwrap());
        let total = n_producers as u64 * items_per_producer;

        let producers: Vec<_> = (0..n_producers)
            .map(|id| {
                let ch = Arc::clone(&channel);
                thread::spawn(move || {
                    for i in 0..items_per_producer {
                        // Pack producer id into the high bits so duplicate
                        // detection across producers is unambiguous.
                        ch.send((id as u64) << 32 | i).ensure_success();
                    }
                })
            })
            .collect();

        let ch = Arc::clone(&channel);
        let consumer = thread::spawn(move || {
            let mut received = Vec::new();
            while received.len() < total as usize {
                match ch.try_recv() {
                    Ok(v) => received.push(v),
                    Err(TryRecvError::Empty) => thread::yield_now(),
                    Err(TryRecvError::Closed) => break,
                }
            }
            received
        });

        for p in producers {
            p.join().unwrap();
        }
        let mut received = consumer.join().unwrap();

        prop_assert_eq!(received.len(), total as usize);
        received.sort_unstable();
        received.dedup();
        prop_assert_eq!(received.len(), total as usize);
    }

    /// Once `try_close` succeeds, the channel stays closed and reports it
    /// consistently regardless of further activity.
    #[test]
    fn prop_close_is_monotonic(
        capacity in 1usize..8,
        pre_sends in 0usize..8,
    ) {
        let channel = Channel::<u64>::new(capacity).unwrap();
        for i in 0..pre_sends {
            let _ = channel.try_send(i as u64);
        }

        prop_assert!(!channel.is_closed());
        prop_assert!(channel.try_close());
        prop_assert!(channel.is_closed());

        // Further closes report false but the channel remains closed.
        for _ in 0..5 {
            prop_assert!(!channel.try_close());
            prop_assert!(channel.is_closed());
        }

        prop_assert!(matches!(channel.try_send(0), Err(TrySendError::Closed(_))));
        prop_assert!(channel.is_closed());
    }
}
