//! # Interval Scheduler
//!
//! Derives the single hardware compare value from the set of running
//! logical timers.
//!
//! ## Time base
//!
//! Countdowns and compare values share one origin: the last compare match,
//! where the hardware counter restarts at 0. A countdown of `t` therefore
//! means "fire when the counter reaches `t`", and can be programmed as-is.
//!
//! ## Reprogramming rules
//!
//! 1. **Floor**: never program less than `counter + SCHEDULE_MARGIN`; a
//!    compare value at or behind the counter would only match after the
//!    8-bit counter wraps.
//! 2. **Ceiling**: never program more than `MAX_INTERVAL`.
//! 3. **Eager shortening, lazy widening**: `start` reprograms only when
//!    the new deadline is sooner than the current one. Widening waits for
//!    the next fire-handling pass, since an early interrupt costs one
//!    wasted wakeup while a late one would miss a deadline.

use crate::config::{MAX_INTERVAL, SCHEDULE_MARGIN};

/// Countdown for a timer started now: the requested interval measured
/// from the last compare match. Saturates at `i32::MAX`.
pub fn start_deadline(interval: u32, counter: u8) -> i32 {
    let ticks = interval.saturating_add(counter as u32);
    i32::try_from(ticks).unwrap_or(i32::MAX)
}

/// Compare value to program on `start`, if the new deadline beats the one
/// already scheduled.
pub fn earlier_interval(deadline: i32, counter: u8, scheduled: u8) -> Option<u8> {
    if deadline >= scheduled as i32 {
        return None;
    }
    let next = clamp(deadline, counter);
    (next < scheduled).then_some(next)
}

/// Compare value after a fire-handling pass. `None` means no timer is
/// running, which parks the hardware on the idle heartbeat.
pub fn next_interval(min_ticks_left: Option<i32>, counter: u8) -> u8 {
    match min_ticks_left {
        Some(ticks) => clamp(ticks, counter),
        None => MAX_INTERVAL,
    }
}

#[inline]
fn clamp(ticks: i32, counter: u8) -> u8 {
    let floor = counter as i32 + SCHEDULE_MARGIN as i32;
    // Ceiling wins when the counter is already within the margin of it
    ticks.max(floor).min(MAX_INTERVAL as i32) as u8
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
