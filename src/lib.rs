//! A bounded, lock-free, multi-producer multi-consumer in-process channel.
//!
//! [`Channel<T>`] is a fixed-capacity ring buffer in the style of Dmitry
//! Vyukov's bounded MPMC queue: every slot carries its own sequence number
//! (its "target lap"), so producers racing each other on the tail cursor and
//! consumers racing each other on the head cursor never need a lock — each
//! slot's target-lap protocol hands exactly one producer, then exactly one
//! consumer, exclusive access to that slot during any given lap.
//!
//! There is no separate sender/receiver type: [`Channel::clone`] yields
//! another handle to the same queue (an `Arc` bump), and any handle can send
//! or receive. Both non-blocking (`try_send`/`try_recv`) and blocking
//! (`send`/`recv`) flavors are provided; the blocking flavors park the
//! calling thread via a small per-side wait queue rather than spinning
//! indefinitely.
//!
//! ```
//! use ringmpmc_rs::Channel;
//!
//! let channel = Channel::new(4).unwrap();
//! channel.try_send(1).unwrap();
//! channel.try_send(2).unwrap();
//! assert_eq!(channel.try_recv(), Ok(1));
//! assert_eq!(channel.try_recv(), Ok(2));
//! ```
//!
//! Closing a channel ([`Channel::try_close`]) unblocks every parked producer
//! and consumer. Producers fail immediately once closed; consumers continue
//! draining already-published values in FIFO order and only then start
//! observing the channel as closed.

mod backoff;
mod channel;
mod error;
mod invariants;
mod parking;
mod position;
mod slot;

pub use channel::Channel;
pub use error::{CapacityError, ChannelClosedError, RecvOutcome, SendOutcome, TryRecvError, TrySendError};
