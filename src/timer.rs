//! # Logical Timer Registry
//!
//! Fixed table of logical timer slots plus the active-set bitmask. Bit `i`
//! of the mask is set exactly when slot `i` is running; a slot's countdown
//! is meaningless while its bit is clear.
//!
//! ## Slot state machine
//!
//! ```text
//!                  start()
//!   ┌──────────┐ ─────────► ┌──────────┐ ──┐
//!   │ Inactive │            │  Active  │   │ repeating fire (re-arm)
//!   └──────────┘ ◄───────── └──────────┘ ◄─┘
//!        one-shot fire / stop()
//! ```

use crate::config::{MIN_PERIOD, NUM_TIMERS};
use crate::error::TimerError;

/// Identifier of a logical timer slot, `0..NUM_TIMERS`.
pub type TimerId = u8;

/// Firing behaviour of a logical timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TimerKind {
    /// Fires every `period` ticks until stopped.
    Repeating = 0,
    /// Fires once, then goes inactive.
    OneShot = 1,
}

impl TryFrom<u8> for TimerKind {
    type Error = TimerError;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(TimerKind::Repeating),
            1 => Ok(TimerKind::OneShot),
            other => Err(TimerError::InvalidKind(other)),
        }
    }
}

/// Per-slot countdown state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogicalTimer {
    pub kind: TimerKind,
    /// Ticks between fires (repeating) or the requested delay (one-shot).
    pub period: u32,
    /// Signed countdown to the next fire, in hardware ticks. Drops below
    /// zero when coalesced elapsed time overshoots the deadline.
    pub ticks_left: i32,
}

impl LogicalTimer {
    pub const EMPTY: Self = Self {
        kind: TimerKind::OneShot,
        period: 0,
        ticks_left: 0,
    };
}

/// Point-in-time copy of one slot, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerSnapshot {
    pub id: TimerId,
    pub active: bool,
    pub kind: TimerKind,
    pub period: u32,
    pub ticks_left: i32,
}

/// Reject a `start` request before any state is touched.
pub fn validate_start(id: TimerId, kind: TimerKind, interval: u32) -> Result<usize, TimerError> {
    let slot = validate_id(id)?;
    if kind == TimerKind::Repeating && interval <= MIN_PERIOD {
        return Err(TimerError::InvalidPeriod(interval));
    }
    Ok(slot)
}

#[inline]
pub fn validate_id(id: TimerId) -> Result<usize, TimerError> {
    let slot = id as usize;
    if slot >= NUM_TIMERS {
        return Err(TimerError::InvalidId(id));
    }
    Ok(slot)
}

/// Slot table and active set.
#[derive(Debug, Clone)]
pub struct Registry {
    slots: [LogicalTimer; NUM_TIMERS],
    active: u32,
}

impl Registry {
    pub const fn new() -> Self {
        Self {
            slots: [LogicalTimer::EMPTY; NUM_TIMERS],
            active: 0,
        }
    }

    #[inline]
    const fn bit(slot: usize) -> u32 {
        1 << slot
    }

    /// Install a countdown and mark the slot running.
    pub fn arm(&mut self, slot: usize, kind: TimerKind, period: u32, ticks_left: i32) {
        self.slots[slot] = LogicalTimer {
            kind,
            period,
            ticks_left,
        };
        self.active |= Self::bit(slot);
    }

    /// Clear the slot's active bit. Returns whether it was running.
    pub fn disarm(&mut self, slot: usize) -> bool {
        let was_active = self.is_active(slot);
        self.active &= !Self::bit(slot);
        was_active
    }

    #[inline]
    pub fn is_active(&self, slot: usize) -> bool {
        self.active & Self::bit(slot) != 0
    }

    #[inline]
    pub fn is_idle(&self) -> bool {
        self.active == 0
    }

    #[inline]
    pub fn active_mask(&self) -> u32 {
        self.active
    }

    pub fn slot(&self, slot: usize) -> &LogicalTimer {
        &self.slots[slot]
    }

    /// Charge `elapsed` ticks against an active slot's countdown.
    ///
    /// Returns the slot's kind when the countdown has reached the firing
    /// threshold. Inactive slots are left untouched.
    pub fn charge(&mut self, slot: usize, elapsed: i32) -> Option<TimerKind> {
        if !self.is_active(slot) {
            return None;
        }
        let timer = &mut self.slots[slot];
        timer.ticks_left = timer.ticks_left.saturating_sub(elapsed);
        (timer.ticks_left <= MIN_PERIOD as i32).then_some(timer.kind)
    }

    /// Commit an accepted fire: re-arm a repeating timer with phase carry,
    /// retire a one-shot.
    pub fn complete_fire(&mut self, slot: usize) {
        let timer = &mut self.slots[slot];
        match timer.kind {
            TimerKind::Repeating => {
                let period = i32::try_from(timer.period).unwrap_or(i32::MAX);
                timer.ticks_left = timer.ticks_left.saturating_add(period);
            }
            TimerKind::OneShot => {
                self.active &= !Self::bit(slot);
            }
        }
    }

    /// Postpone a fire the dispatcher could not accept.
    pub fn defer(&mut self, slot: usize, ticks_left: i32) {
        self.slots[slot].ticks_left = ticks_left;
    }

    /// Smallest countdown among running slots.
    pub fn min_ticks_left(&self) -> Option<i32> {
        self.active_slots().map(|slot| self.slots[slot].ticks_left).min()
    }

    /// Indices of running slots, ascending.
    pub fn active_slots(&self) -> impl Iterator<Item = usize> + '_ {
        (0..NUM_TIMERS).filter(move |&slot| self.is_active(slot))
    }

    pub fn snapshot(&self, slot: usize) -> TimerSnapshot {
        let timer = self.slots[slot];
        TimerSnapshot {
            id: slot as TimerId,
            active: self.is_active(slot),
            kind: timer.kind,
            period: timer.period,
            ticks_left: timer.ticks_left,
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
