//! # Errors
//!
//! Every public operation validates its arguments before touching shared
//! state, so an `Err` always means nothing was changed.

use thiserror::Error;

/// Errors returned by the public timer API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TimerError {
    /// Timer id is outside `0..NUM_TIMERS`.
    #[error("timer id {0} out of range")]
    InvalidId(u8),
    /// Raw timer kind is neither repeating nor one-shot.
    #[error("unknown timer kind {0}")]
    InvalidKind(u8),
    /// Repeating timer with a period the layer cannot service.
    #[error("repeating period {0} too short")]
    InvalidPeriod(u32),
    /// `stop` on a slot that is not running.
    #[error("timer {0} is not active")]
    NotActive(u8),
    /// The hardware clock rejected its configuration.
    #[error("clock: {0}")]
    Clock(#[from] ClockError),
}

/// Errors reported by a hardware clock driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ClockError {
    /// Prescaler index is stopped (0) or unknown.
    #[error("invalid prescaler index {0}")]
    InvalidScale(u8),
    /// The requested interval does not fit the counter at this rate.
    #[error("interval not representable at this rate")]
    RateOutOfRange,
}

/// Outcome of a rejected deferred-work submission.
///
/// Never surfaced through `start`/`stop`; the fire-handling routine turns it
/// into a retry on the next batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("dispatcher saturated")]
    Saturated,
}
