//! # VTimer Example Firmware
//!
//! Runs three logical timers off the single SysTick alarm:
//!
//! | Timer | Kind | Interval | Behavior |
//! |-------|------|----------|----------|
//! | `HEARTBEAT` | Repeating | 512 ticks (0.5 s) | Counts beats |
//! | `SAMPLE` | Repeating | 37 ticks | Counts samples, stops itself after 100 |
//! | `WATCHDOG` | One-shot | 3072 ticks (3 s) | Restarts the sampler once |
//!
//! At 1024 ticks per second the heartbeat exceeds `MAX_INTERVAL`, so the
//! hardware is reprogrammed across several idle heartbeats per beat.
//!
//! Build with `--features rt` for a `thumbv7em-none-eabihf` target.

#![no_std]
#![no_main]

use core::sync::atomic::{AtomicU32, Ordering};

use cortex_m_rt::entry;
use panic_halt as _;

use vtimer::kernel;
use vtimer::{TimerId, TimerKind};

const HEARTBEAT: TimerId = 0;
const SAMPLE: TimerId = 1;
const WATCHDOG: TimerId = 2;

static BEATS: AtomicU32 = AtomicU32::new(0);
static SAMPLES: AtomicU32 = AtomicU32::new(0);

// ---------------------------------------------------------------------------
// Fired handlers (run from the deferred work loop, never from the ISR)
// ---------------------------------------------------------------------------

fn on_heartbeat(_id: TimerId) {
    BEATS.fetch_add(1, Ordering::Relaxed);
}

fn on_sample(id: TimerId) {
    let n = SAMPLES.fetch_add(1, Ordering::Relaxed) + 1;
    if n % 100 == 0 {
        let _ = kernel::stop_timer(id);
    }
}

fn on_watchdog(_id: TimerId) {
    // Sampler stopped itself; kick it off again once
    let _ = kernel::start_timer(SAMPLE, TimerKind::Repeating, 37);
}

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

/// Firmware entry point. Initializes the timer layer, starts the demo
/// timers and enters the deferred work loop. Does not return.
#[entry]
fn main() -> ! {
    kernel::init().expect("clock configuration");

    kernel::set_fired_handler(HEARTBEAT, on_heartbeat).expect("heartbeat handler");
    kernel::set_fired_handler(SAMPLE, on_sample).expect("sample handler");
    kernel::set_fired_handler(WATCHDOG, on_watchdog).expect("watchdog handler");

    kernel::start_timer(HEARTBEAT, TimerKind::Repeating, 512).expect("heartbeat");
    kernel::start_timer(SAMPLE, TimerKind::Repeating, 37).expect("sampler");
    kernel::start_timer(WATCHDOG, TimerKind::OneShot, 3072).expect("watchdog");

    kernel::run()
}
