//! # Hardware Clock Interface
//!
//! The single physical alarm the timer layer multiplexes. The model is an
//! 8-bit compare-match counter: the counter climbs from 0 to the programmed
//! interval, raises the interrupt, and restarts at 0. One full period is
//! therefore `interval + 1` ticks.

use crate::config::CLOCK_BASE_HZ;
use crate::error::ClockError;

/// Access to the hardware alarm. Implemented by the board port
/// (`arch::cortex_m4::SysTickClock`) and by a simulation for host tests.
pub trait HardwareClock {
    /// Start the counter at the rate selected by `scale` with `interval`
    /// as the first compare value.
    fn set_rate(&mut self, interval: u8, scale: u8) -> Result<(), ClockError>;

    /// Ticks elapsed since the last compare match.
    fn read_counter(&self) -> u8;

    /// Currently programmed compare value.
    fn interval(&self) -> u8;

    /// Program a new compare value. The counter keeps its phase.
    fn set_interval(&mut self, interval: u8);

    /// Called first thing in the interval-elapsed interrupt.
    fn acknowledge(&mut self) {}
}

/// Prescaler selection, as an index into the divisor table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scale(u8);

impl Scale {
    const DIVISORS: [u32; 7] = [1, 8, 32, 64, 128, 256, 1024];

    /// Validate a raw prescaler index. Index 0 means "stopped" and is
    /// rejected along with anything past the table.
    pub const fn new(index: u8) -> Result<Self, ClockError> {
        if index == 0 || index as usize > Self::DIVISORS.len() {
            return Err(ClockError::InvalidScale(index));
        }
        Ok(Self(index))
    }

    pub const fn divisor(self) -> u32 {
        Self::DIVISORS[self.0 as usize - 1]
    }

    /// Hardware ticks per second at this prescaler.
    pub const fn tick_hz(self) -> u32 {
        CLOCK_BASE_HZ / self.divisor()
    }
}

#[cfg(test)]
pub(crate) use sim::SimClock;
