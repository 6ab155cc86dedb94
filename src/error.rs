//! Error and status types for channel operations.
//!
//! The taxonomy is deliberately tiny: construction validation is a single
//! `CapacityError`, non-blocking operations hand the value back to the
//! caller on failure (`TrySendError<T>` / `TryRecvError`), and blocking
//! operations return a status value (`SendOutcome` / `RecvOutcome<T>`) with
//! an `ensure_success` escape hatch for callers who would rather panic than
//! match.

use thiserror::Error;

/// Returned by [`crate::Channel::new`] and
/// [`crate::Channel::with_start_laps`] when `capacity` is not positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("channel capacity must be positive")]
pub struct CapacityError;

/// The panic payload raised by [`SendOutcome::ensure_success`] and
/// [`RecvOutcome::ensure_success`] when the channel turned out to be closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("channel is closed")]
pub struct ChannelClosedError;

/// Error returned by [`crate::Channel::try_send`].
///
/// Carries the value back to the caller so it isn't lost on failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TrySendError<T> {
    /// The channel has no free slot right now.
    #[error("channel is full")]
    Full(T),
    /// The channel has been closed.
    #[error("channel is closed")]
    Closed(T),
}

impl<T> TrySendError<T> {
    /// Unwraps the value regardless of which variant this is.
    pub fn into_inner(self) -> T {
        match self {
            TrySendError::Full(v) | TrySendError::Closed(v) => v,
        }
    }
}

/// Error returned by [`crate::Channel::try_recv`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TryRecvError {
    /// The channel has no value ready right now.
    #[error("channel is empty")]
    Empty,
    /// The channel is closed and has been fully drained.
    #[error("channel is closed")]
    Closed,
}

/// The status returned by [`crate::Channel::send`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The value was delivered into the channel.
    Success,
    /// The channel was closed before the value could be delivered.
    Closed,
}

impl SendOutcome {
    /// Returns `()` on success, panics with [`ChannelClosedError`] otherwise.
    ///
    /// For callers who would rather treat "send on a closed channel" as an
    /// exceptional condition than match on the outcome.
    pub fn ensure_success(self) {
        match self {
            SendOutcome::Success => {}
            SendOutcome::Closed => panic!("{}", ChannelClosedError),
        }
    }

    /// Returns `true` if the send succeeded.
    pub fn is_success(self) -> bool {
        matches!(self, SendOutcome::Success)
    }
}

/// The status returned by [`crate::Channel::recv`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecvOutcome<T> {
    /// A value was delivered from the channel.
    Success(T),
    /// The channel was closed and is empty.
    Closed,
}

impl<T> RecvOutcome<T> {
    /// Returns the received value, panics with [`ChannelClosedError`]
    /// otherwise.
    pub fn ensure_success(self) -> T {
        match self {
            RecvOutcome::Success(v) => v,
            RecvOutcome::Closed => panic!("{}", ChannelClosedError),
        }
    }

    /// Returns `true` if a value was delivered.
    pub fn is_success(&self) -> bool {
        matches!(self, RecvOutcome::Success(_))
    }
}
