use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_utils::CachePadded;

use crate::backoff::Backoff;
use crate::error::{CapacityError, RecvOutcome, SendOutcome, TryRecvError, TrySendError};
use crate::invariants::{
    debug_assert_bounded_count, debug_assert_index_in_bounds, debug_assert_monotonic,
};
use crate::parking::ParkingSet;
use crate::position::{wrap_add_lap, Position};
use crate::slot::Slot;

/// Outcome of a single, non-looping attempt to acquire a slot for writing.
enum SendAttempt {
    Acquired { index: usize, publish_lap: u32 },
    Full,
    Closed,
    /// This producer lost the tail CAS to another producer. Transient;
    /// paced with `Backoff::spin` per spec step 3.
    CasLost,
    /// A concurrent producer has reserved this slot but not yet published
    /// its value. Transient; paced with `Backoff::snooze` per spec step 5.
    Reserved,
}

/// Outcome of a single, non-looping attempt to acquire a slot for reading.
enum RecvAttempt {
    Acquired { index: usize, publish_lap: u32 },
    Empty,
    Closed,
    /// This consumer lost the head CAS to another consumer. Transient;
    /// paced with `Backoff::spin`.
    CasLost,
    /// A concurrent consumer has reserved this slot but not yet published
    /// its read. Transient; paced with `Backoff::snooze`.
    Reserved,
}

struct Inner<T> {
    /// Popped from by consumers. Lap is always odd. Cache-padded away from
    /// `tail` so a producer's CAS traffic doesn't bounce the cache line a
    /// consumer is spinning on, and vice versa.
    head: CachePadded<AtomicU64>,
    /// Pushed to by producers. Lap is always even; its closed bit is the
    /// channel's closed flag.
    tail: CachePadded<AtomicU64>,
    slots: Box<[Slot<T>]>,
    capacity: usize,
    /// Producers blocked while the channel is full.
    writers: ParkingSet,
    /// Consumers blocked while the channel is empty (and not closed).
    readers: ParkingSet,
}

impl<T> Inner<T> {
    #[inline]
    fn slot_index(&self, position: Position) -> usize {
        let index = position.index() as usize;
        debug_assert_index_in_bounds!(index, self.capacity);
        index
    }

    fn try_acquire_send(&self) -> SendAttempt {
        let tail_word = self.tail.load(Ordering::SeqCst);
        let tail = Position::decode(tail_word);
        if tail.is_closed() {
            return SendAttempt::Closed;
        }

        let index = self.slot_index(tail);
        let slot = &self.slots[index];
        let w = slot.target_lap.load(Ordering::Acquire);
        let tail_lap = tail.lap();

        if tail_lap == w {
            let next = if index + 1 < self.capacity {
                tail.advance_index()
            } else {
                tail.advance_lap()
            };
            return match self.tail.compare_exchange_weak(
                tail_word,
                next.encode(),
                Ordering::SeqCst,
                Ordering::Relaxed,
            ) {
                Ok(_) => {
                    debug_assert_monotonic!(tail_lap, tail.index(), next.lap(), next.index());
                    SendAttempt::Acquired {
                        index,
                        publish_lap: wrap_add_lap(tail_lap, 1),
                    }
                }
                Err(_) => SendAttempt::CasLost,
            };
        }

        if tail_lap == wrap_add_lap(w, 1) {
            return SendAttempt::Full;
        }

        SendAttempt::Reserved
    }

    /// # Safety
    ///
    /// Must only be called with an `index`/`publish_lap` pair just returned
    /// by `try_acquire_send` from `Acquired`, and exactly once per
    /// acquisition.
    unsafe fn publish_send(&self, index: usize, publish_lap: u32, value: T) {
        let slot = &self.slots[index];
        slot.write(value);
        slot.target_lap.store(publish_lap, Ordering::Release);
        self.readers.unblock_next();
    }

    fn try_acquire_recv(&self) -> RecvAttempt {
        let head_word = self.head.load(Ordering::SeqCst);
        let head = Position::decode(head_word);

        let index = self.slot_index(head);
        let slot = &self.slots[index];
        let w = slot.target_lap.load(Ordering::Acquire);
        let head_lap = head.lap();

        if head_lap == w {
            let next = if index + 1 < self.capacity {
                head.advance_index()
            } else {
                head.advance_lap()
            };
            return match self.head.compare_exchange_weak(
                head_word,
                next.encode(),
                Ordering::SeqCst,
                Ordering::Relaxed,
            ) {
                Ok(_) => {
                    debug_assert_monotonic!(head_lap, head.index(), next.lap(), next.index());
                    RecvAttempt::Acquired {
                        index,
                        publish_lap: wrap_add_lap(head_lap, 1),
                    }
                }
                Err(_) => RecvAttempt::CasLost,
            };
        }

        if head_lap == wrap_add_lap(w, 1) {
            // This lap's write hasn't landed yet. Only "closed" if the tail
            // is closed and, re-checked, the channel is still in this state.
            let tail = Position::decode(self.tail.load(Ordering::SeqCst));
            return if tail.is_closed() {
                RecvAttempt::Closed
            } else {
                RecvAttempt::Empty
            };
        }

        RecvAttempt::Reserved
    }

    /// # Safety
    ///
    /// Must only be called with an `index`/`publish_lap` pair just returned
    /// by `try_acquire_recv` from `Acquired`, and exactly once per
    /// acquisition.
    unsafe fn publish_recv(&self, index: usize, publish_lap: u32) -> T {
        let slot = &self.slots[index];
        let value = slot.read();
        slot.target_lap.store(publish_lap, Ordering::Release);
        self.writers.unblock_next();
        value
    }

    fn len(&self) -> usize {
        loop {
            let t1 = self.tail.load(Ordering::SeqCst);
            let h = self.head.load(Ordering::SeqCst);
            let t2 = self.tail.load(Ordering::SeqCst);
            if t1 != t2 {
                continue;
            }

            let tail = Position::decode(t1);
            let head = Position::decode(h);

            let len = if head.index() < tail.index() {
                (tail.index() - head.index()) as usize
            } else if head.index() > tail.index() {
                self.capacity - head.index() as usize + tail.index() as usize
            } else if head.lap() == wrap_add_lap(tail.lap(), 1) {
                0
            } else {
                self.capacity
            };

            debug_assert_bounded_count!(len, self.capacity);
            return len;
        }
    }

    fn is_empty(&self) -> bool {
        let head = Position::decode(self.head.load(Ordering::SeqCst));
        let tail = Position::decode(self.tail.load(Ordering::SeqCst));
        head.index() == tail.index() && head.lap() == wrap_add_lap(tail.lap(), 1)
    }

    fn is_full(&self) -> bool {
        let head = Position::decode(self.head.load(Ordering::SeqCst));
        let tail = Position::decode(self.tail.load(Ordering::SeqCst));
        head.index() == tail.index() && wrap_add_lap(head.lap(), 1) == tail.lap()
    }

    fn is_closed(&self) -> bool {
        Position::decode(self.tail.load(Ordering::SeqCst)).is_closed()
    }
}

impl<T> Drop for Inner<T> {
    fn drop(&mut self) {
        // Single-threaded at this point (we own the only reference left),
        // so plain loads via get_mut suffice.
        let head = Position::decode(*self.head.get_mut());
        let tail = Position::decode(*self.tail.get_mut());

        let count = if head.index() < tail.index() {
            (tail.index() - head.index()) as usize
        } else if head.index() > tail.index() {
            self.capacity - head.index() as usize + tail.index() as usize
        } else if head.lap() == wrap_add_lap(tail.lap(), 1) {
            0
        } else {
            self.capacity
        };

        let start = head.index() as usize;
        for i in 0..count {
            let idx = (start + i) % self.capacity;
            // Safety: these `count` slots, starting at `head`, are exactly
            // the slots holding a live, un-read value at the moment the
            // channel is dropped.
            unsafe {
                self.slots[idx].drop_in_place();
            }
        }
    }
}

/// A bounded, lock-free, multi-producer multi-consumer channel.
///
/// Cloning a `Channel` is cheap (an `Arc` bump) and yields another handle to
/// the same underlying queue; there is no separate sender/receiver split —
/// any handle may `send`/`recv`. The queue is a slot-sequenced ring buffer in
/// the style of Dmitry Vyukov's bounded MPMC queue: producers and consumers
/// race independently on `tail`/`head` via compare-and-swap, and each slot's
/// own sequence number (its "target lap") serializes the single producer and
/// single consumer that may touch it during any one lap.
pub struct Channel<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Channel<T> {
    /// Creates a channel with the given fixed capacity.
    ///
    /// # Errors
    ///
    /// Returns [`CapacityError`] if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self, CapacityError> {
        Self::with_start_laps(capacity, 0, 1)
    }

    /// Creates a channel with explicit starting laps for the tail and head
    /// cursors.
    ///
    /// This exists to exercise wrap-around behavior near the 2^31 lap
    /// boundary in tests; production code should use [`Channel::new`], which
    /// starts the tail at lap 0 and the head at lap 1 (the one-lap offset
    /// that makes an empty channel distinguishable from a full one).
    ///
    /// # Errors
    ///
    /// Returns [`CapacityError`] if `capacity` is zero.
    pub fn with_start_laps(
        capacity: usize,
        tail_lap: u32,
        head_lap: u32,
    ) -> Result<Self, CapacityError> {
        if capacity == 0 {
            return Err(CapacityError);
        }

        let slots = (0..capacity)
            .map(|_| Slot::new(tail_lap))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Ok(Self {
            inner: Arc::new(Inner {
                head: CachePadded::new(AtomicU64::new(Position::new(head_lap, 0).encode())),
                tail: CachePadded::new(AtomicU64::new(Position::new(tail_lap, 0).encode())),
                slots,
                capacity,
                writers: ParkingSet::new(),
                readers: ParkingSet::new(),
            }),
        })
    }

    /// The fixed capacity this channel was constructed with.
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Attempts to send `value` without blocking.
    ///
    /// Gives up and returns `value` back to the caller once the channel is
    /// genuinely full, the channel is closed, or transient contention with
    /// another producer outlasts the backoff's patience.
    pub fn try_send(&self, value: T) -> Result<(), TrySendError<T>> {
        let mut backoff = Backoff::new();
        loop {
            match self.inner.try_acquire_send() {
                SendAttempt::Acquired { index, publish_lap } => {
                    unsafe {
                        self.inner.publish_send(index, publish_lap, value);
                    }
                    return Ok(());
                }
                SendAttempt::Closed => return Err(TrySendError::Closed(value)),
                SendAttempt::Full => {
                    if backoff.is_completed() {
                        return Err(TrySendError::Full(value));
                    }
                    backoff.snooze();
                }
                SendAttempt::CasLost => {
                    // Never exhausts on its own (see `Backoff::spin`); the
                    // `Full` branch above is what eventually gives up.
                    backoff.spin();
                }
                SendAttempt::Reserved => {
                    if backoff.is_completed() {
                        return Err(TrySendError::Full(value));
                    }
                    backoff.snooze();
                }
            }
        }
    }

    /// Attempts to receive a value without blocking.
    pub fn try_recv(&self) -> Result<T, TryRecvError> {
        let mut backoff = Backoff::new();
        loop {
            match self.inner.try_acquire_recv() {
                RecvAttempt::Acquired { index, publish_lap } => {
                    return Ok(unsafe { self.inner.publish_recv(index, publish_lap) });
                }
                RecvAttempt::Closed => return Err(TryRecvError::Closed),
                RecvAttempt::Empty => {
                    if backoff.is_completed() {
                        return Err(TryRecvError::Empty);
                    }
                    backoff.snooze();
                }
                RecvAttempt::CasLost => {
                    // Never exhausts on its own (see `Backoff::spin`); the
                    // `Empty` branch above is what eventually gives up.
                    backoff.spin();
                }
                RecvAttempt::Reserved => {
                    if backoff.is_completed() {
                        return Err(TryRecvError::Empty);
                    }
                    backoff.snooze();
                }
            }
        }
    }

    /// Sends `value`, blocking the calling thread while the channel is full.
    ///
    /// Returns [`SendOutcome::Closed`] if the channel is closed before the
    /// value can be delivered (in which case `value` is dropped).
    pub fn send(&self, value: T) -> SendOutcome {
        let mut value = value;
        loop {
            match self.try_send(value) {
                Ok(()) => return SendOutcome::Success,
                Err(TrySendError::Closed(_)) => return SendOutcome::Closed,
                Err(TrySendError::Full(v)) => value = v,
            }

            let registration = match self.inner.writers.try_register() {
                Some(r) => r,
                None => return SendOutcome::Closed,
            };

            // Re-check under the registration's happens-before: a lost
            // wakeup here would mean this producer sleeps through room that
            // already opened up.
            if self.inner.is_closed() {
                registration.cancel();
                return SendOutcome::Closed;
            }
            if !self.inner.is_full() {
                registration.cancel();
                continue;
            }

            registration.wait();
            // Woken (or, rarely, a spurious park return): loop back to the
            // fast path and re-attempt from scratch.
        }
    }

    /// Receives a value, blocking the calling thread while the channel is
    /// empty.
    ///
    /// Returns [`RecvOutcome::Closed`] once the channel is closed and has
    /// been fully drained.
    pub fn recv(&self) -> RecvOutcome<T> {
        loop {
            match self.try_recv() {
                Ok(v) => return RecvOutcome::Success(v),
                Err(TryRecvError::Closed) => return RecvOutcome::Closed,
                Err(TryRecvError::Empty) => {}
            }

            let registration = match self.inner.readers.try_register() {
                Some(r) => r,
                None => return RecvOutcome::Closed,
            };

            if !self.inner.is_empty() {
                registration.cancel();
                continue;
            }
            if self.inner.is_closed() {
                registration.cancel();
                return RecvOutcome::Closed;
            }

            registration.wait();
        }
    }

    /// Snapshot length, in `[0, capacity]`. Lock-free.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// `true` iff the channel held no values at the moment of the call.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// `true` iff the channel held `capacity` values at the moment of the
    /// call.
    pub fn is_full(&self) -> bool {
        self.inner.is_full()
    }

    /// `true` iff [`Channel::try_close`] has succeeded at least once.
    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    /// Closes the channel, unblocking every currently-parked sender and
    /// receiver.
    ///
    /// Returns `true` the first time it is called, `false` on every
    /// subsequent call. After closing: all further sends fail; receives
    /// continue to drain already-published values in FIFO order until the
    /// channel is empty, after which they fail too.
    pub fn try_close(&self) -> bool {
        // A fetch-or on just the closed bit lets this race freely against a
        // producer's concurrent CAS on the lap/index bits of the same word,
        // with no retry loop needed.
        let previous = self
            .inner
            .tail
            .fetch_or(crate::position::CLOSED_BIT as u64, Ordering::SeqCst);

        if Position::decode(previous).is_closed() {
            return false;
        }

        self.inner.writers.close();
        self.inner.readers.close();
        true
    }
}

impl<T> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

// Safety: `Channel<T>` is Send + Sync as long as T is Send. The slot array
// guards cross-thread access to each payload cell with the target-lap
// protocol; no `T: Sync` bound is needed since at most one thread ever
// observes a given value.
unsafe impl<T: Send> Send for Channel<T> {}
unsafe impl<T: Send> Sync for Channel<T> {}
