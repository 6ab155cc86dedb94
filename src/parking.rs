//! A closable FIFO of parked waiters, one instantiated per side of the channel.
//!
//! Mirrors the teacher crate's habit of keeping synchronization primitives in
//! their own small module (`backoff.rs`) rather than folding them into the
//! channel core: the wakeup protocol here is independent of ring-buffer
//! mechanics and is exercised by its own unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use crossbeam_utils::sync::{Parker, Unparker};

struct Waiter {
    id: u64,
    unparker: Unparker,
}

struct ParkingSetInner {
    waiters: VecDeque<Waiter>,
    closed: bool,
}

/// A FIFO of single-shot waiters guarded by a single mutex, with a lock-free
/// fast-check for "definitely nothing parked".
pub(crate) struct ParkingSet {
    inner: Mutex<ParkingSetInner>,
    non_empty: AtomicBool,
    next_id: AtomicU64,
}

impl ParkingSet {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(ParkingSetInner {
                waiters: VecDeque::new(),
                closed: false,
            }),
            non_empty: AtomicBool::new(false),
            next_id: AtomicU64::new(0),
        }
    }

    /// Registers a new waiter, unless the set is closed.
    pub(crate) fn try_register(&self) -> Option<Registration<'_>> {
        let parker = Parker::new();
        let unparker = parker.unparker().clone();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let mut guard = self.inner.lock().unwrap();
        if guard.closed {
            return None;
        }
        guard.waiters.push_back(Waiter { id, unparker });
        self.non_empty.store(true, Ordering::Release);
        drop(guard);

        Some(Registration {
            set: self,
            id,
            parker,
            disposed: false,
        })
    }

    /// Removes a registration from the FIFO if it is still present.
    ///
    /// Idempotent: cancelling an id that was already woken or cancelled is a
    /// no-op.
    fn cancel(&self, id: u64) {
        let mut guard = self.inner.lock().unwrap();
        if let Some(pos) = guard.waiters.iter().position(|w| w.id == id) {
            guard.waiters.remove(pos);
        }
        self.non_empty.store(!guard.waiters.is_empty(), Ordering::Release);
    }

    /// Wakes the oldest registered waiter, if any.
    pub(crate) fn unblock_next(&self) {
        if !self.non_empty.load(Ordering::Acquire) {
            return;
        }
        let mut guard = self.inner.lock().unwrap();
        let woken = guard.waiters.pop_front();
        self.non_empty.store(!guard.waiters.is_empty(), Ordering::Release);
        drop(guard);
        if let Some(waiter) = woken {
            waiter.unparker.unpark();
        }
    }

    /// Wakes every pending waiter and marks the set closed; further
    /// registrations fail from this point on.
    pub(crate) fn close(&self) {
        let mut guard = self.inner.lock().unwrap();
        guard.closed = true;
        let drained: Vec<Waiter> = guard.waiters.drain(..).collect();
        self.non_empty.store(false, Ordering::Release);
        drop(guard);
        for waiter in drained {
            waiter.unparker.unpark();
        }
    }
}

/// An RAII handle to a single registered waiter.
///
/// Exactly one of [`Registration::wait`] or [`Registration::cancel`] must be
/// called to retire the registration; the thread-parking token underneath is
/// otherwise single-shot and tied to this registration's lifetime.
pub(crate) struct Registration<'a> {
    set: &'a ParkingSet,
    id: u64,
    parker: Parker,
    disposed: bool,
}

impl<'a> Registration<'a> {
    /// Blocks the calling thread until woken by `unblock_next` or `close`.
    ///
    /// A wakeup issued before `wait` is called is latched: `wait` returns
    /// immediately in that case, so there is no lost-wakeup window between
    /// registering and parking.
    pub(crate) fn wait(mut self) {
        self.parker.park();
        self.disposed = true;
    }

    /// Removes this registration from its parking set without waiting.
    pub(crate) fn cancel(mut self) {
        self.set.cancel(self.id);
        self.disposed = true;
    }
}

impl<'a> Drop for Registration<'a> {
    fn drop(&mut self) {
        // Guards against a future code path forgetting to call wait/cancel
        // explicitly: an undisposed registration could otherwise linger in
        // the FIFO and accumulate a wakeup nobody consumes.
        if !self.disposed {
            self.set.cancel(self.id);
        }
    }
}
