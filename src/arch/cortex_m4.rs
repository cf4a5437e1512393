//! # Cortex-M4 Port Layer
//!
//! Drives the timer layer from the SysTick peripheral.
//!
//! ## Compare-match emulation
//!
//! The timer layer expects an 8-bit counter that climbs from 0 to a
//! compare value and raises an interrupt on the match. SysTick instead
//! counts a 24-bit reload value down to zero. One hardware tick is
//! `cycles_per_tick` core cycles, and the emulated counter is
//!
//! ```text
//! counter = base + (RVR - CVR) / cycles_per_tick
//! ```
//!
//! where `base` is the counter value at the last time SysTick was
//! restarted. Reprogramming mid-period restarts SysTick for only the
//! remaining ticks and records the current counter as `base`, so the
//! full period still spans `interval + 1` ticks.
//!
//! ## Interrupt priority
//!
//! SysTick runs at the lowest priority (0xFF) so the timer interrupt
//! never delays application ISRs.

use cortex_m::peripheral::SYST;

use crate::clock::{HardwareClock, Scale};
use crate::config::SYSTEM_CLOCK_HZ;
use crate::error::ClockError;

const CSR_ENABLE: u32 = 1 << 0;
const CSR_TICKINT: u32 = 1 << 1;
const CSR_CLKSOURCE: u32 = 1 << 2;

/// Largest SysTick reload value (24 bits).
const MAX_RELOAD: u32 = 0x00FF_FFFF;

/// SysTick-backed compare-match clock.
pub struct SysTickClock {
    cycles_per_tick: u32,
    interval: u8,
    base: u8,
}

impl SysTickClock {
    pub const fn new() -> Self {
        Self {
            cycles_per_tick: 0,
            interval: 0,
            base: 0,
        }
    }

    /// Restart SysTick so the next interrupt arrives after `ticks` ticks.
    /// Does nothing until `set_rate` has run.
    fn restart(&self, ticks: u32) {
        let Some(reload) = reload_for(ticks, self.cycles_per_tick) else {
            return;
        };
        // SAFETY: SysTick is owned by this driver; every caller holds a
        // critical section, so no other code writes these registers.
        unsafe {
            let syst = &*SYST::PTR;
            syst.rvr.write(reload);
            // Any write clears CVR; the counter reloads from RVR next cycle
            syst.cvr.write(0);
        }
    }
}

/// SysTick reload value for a period of `ticks` hardware ticks, or `None`
/// while the tick rate is unconfigured.
fn reload_for(ticks: u32, cycles_per_tick: u32) -> Option<u32> {
    if cycles_per_tick == 0 {
        return None;
    }
    let cycles = ticks.max(1).saturating_mul(cycles_per_tick);
    Some((cycles - 1).min(MAX_RELOAD))
}

impl Default for SysTickClock {
    fn default() -> Self {
        Self::new()
    }
}

impl HardwareClock for SysTickClock {
    fn set_rate(&mut self, interval: u8, scale: u8) -> Result<(), ClockError> {
        let scale = Scale::new(scale)?;
        let cycles = SYSTEM_CLOCK_HZ / scale.tick_hz();
        let period = cycles as u64 * (u8::MAX as u64 + 1);
        if cycles == 0 || period > MAX_RELOAD as u64 + 1 {
            return Err(ClockError::RateOutOfRange);
        }

        self.cycles_per_tick = cycles;
        self.interval = interval;
        self.base = 0;
        self.restart(interval as u32 + 1);

        set_systick_priority();
        // SAFETY: see `restart`.
        unsafe {
            (*SYST::PTR).csr.write(CSR_ENABLE | CSR_TICKINT | CSR_CLKSOURCE);
        }
        Ok(())
    }

    fn read_counter(&self) -> u8 {
        if self.cycles_per_tick == 0 {
            return 0;
        }
        let elapsed = SYST::get_reload().saturating_sub(SYST::get_current()) / self.cycles_per_tick;
        (self.base as u32 + elapsed).min(u8::MAX as u32) as u8
    }

    fn interval(&self) -> u8 {
        self.interval
    }

    fn set_interval(&mut self, interval: u8) {
        let now = self.read_counter();
        let remaining = (interval as u32 + 1).saturating_sub(now as u32);
        self.interval = interval;
        self.base = now;
        self.restart(remaining);
    }

    fn acknowledge(&mut self) {
        // A shortened period must not repeat; restart for a full one.
        // Cycles spent between the wrap and this point are lost.
        self.base = 0;
        self.restart(self.interval as u32 + 1);
    }
}

// ---------------------------------------------------------------------------
// Interrupt priority configuration
// ---------------------------------------------------------------------------

/// Set SysTick to the lowest interrupt priority.
fn set_systick_priority() {
    // SAFETY: read-modify-write of SHPR3 inside the caller's critical
    // section. Bits [31:24] hold the SysTick priority.
    unsafe {
        let shpr3: *mut u32 = 0xE000_ED20 as *mut u32;
        let val = core::ptr::read_volatile(shpr3);
        core::ptr::write_volatile(shpr3, val | (0xFF << 24));
    }
}

// ---------------------------------------------------------------------------
// SysTick handler
// ---------------------------------------------------------------------------

/// SysTick exception handler: the compare match of the emulated counter.
#[cfg(target_arch = "arm")]
#[no_mangle]
pub extern "C" fn SysTick() {
    crate::kernel::timers().interval_elapsed();
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
