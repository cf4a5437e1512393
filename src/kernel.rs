//! # Kernel
//!
//! Process-wide timer service and the public API application code calls.
//!
//! The deferred task queue and the timer service are statics, constructed
//! at compile time and reset by [`init`]. They live for the life of the
//! firmware and are never torn down.
//!
//! ## Startup Sequence
//!
//! ```text
//! reset_handler (cortex-m-rt)
//!   └─► main()
//!         ├─► kernel::init()               ← start SysTick on the heartbeat
//!         ├─► kernel::set_fired_handler()  ← (×N)
//!         ├─► kernel::start_timer()        ← (×N)
//!         └─► kernel::run()                ← deferred work loop (no return)
//! ```

use crate::arch::cortex_m4::SysTickClock;
use crate::config::TASK_QUEUE_DEPTH;
use crate::dispatch::TaskQueue;
use crate::error::TimerError;
use crate::service::{FiredHandler, TimerService};
use crate::timer::{TimerId, TimerKind};

/// Concrete service type wired to SysTick and the kernel task queue.
pub type KernelTimers = TimerService<'static, SysTickClock, TaskQueue<TASK_QUEUE_DEPTH>>;

static TASKS: TaskQueue<TASK_QUEUE_DEPTH> = TaskQueue::new();

static TIMERS: KernelTimers = TimerService::new(SysTickClock::new(), &TASKS);

/// The global timer service. Used by the SysTick handler.
#[inline]
pub fn timers() -> &'static KernelTimers {
    &TIMERS
}

/// Initialize the timer layer.
///
/// Drops any queued deferred work, stops every logical timer and starts
/// SysTick on the idle heartbeat. Call once from `main` before starting
/// timers; calling it again resets everything.
///
/// # Returns
/// - `Ok(())`: SysTick is running at `CLOCK_SCALE`.
/// - `Err(TimerError::Clock(_))`: the prescaler or core clock cannot be
///   represented by SysTick.
pub fn init() -> Result<(), TimerError> {
    TASKS.clear();
    TIMERS.init()
}

/// Start (or restart) logical timer `id`.
///
/// The first fire comes `interval` ticks from now. A repeating timer then
/// fires every `interval` ticks, keeping its phase; a one-shot stops after
/// its single fire. If this deadline is the soonest, SysTick is
/// reprogrammed before returning.
///
/// # Parameters
/// - `id`: Slot index, `0..NUM_TIMERS`.
/// - `kind`: [`TimerKind::Repeating`] or [`TimerKind::OneShot`].
/// - `interval`: Period in hardware ticks. Must exceed `MIN_PERIOD` for a
///   repeating timer.
///
/// # Returns
/// - `Ok(())`: The timer is running.
/// - `Err(TimerError::InvalidId(id))`: `id` is out of range.
/// - `Err(TimerError::InvalidPeriod(interval))`: repeating period too short.
///
/// # Example
/// ```ignore
/// kernel::start_timer(0, TimerKind::Repeating, 512)?;
/// ```
pub fn start_timer(id: TimerId, kind: TimerKind, interval: u32) -> Result<(), TimerError> {
    TIMERS.start(id, kind, interval)
}

/// Start logical timer `id` from a raw kind code.
///
/// # Parameters
/// - `kind`: `0` repeating, `1` one-shot.
///
/// # Returns
/// As [`start_timer`], plus `Err(TimerError::InvalidKind(kind))` for any
/// other code.
pub fn start_timer_raw(id: TimerId, kind: u8, interval: u32) -> Result<(), TimerError> {
    let kind = TimerKind::try_from(kind)?;
    TIMERS.start(id, kind, interval)
}

/// Stop logical timer `id`.
///
/// Takes effect immediately. SysTick is widened on the next fire-handling
/// pass, and a notification already queued for this timer is still
/// delivered.
///
/// # Returns
/// - `Ok(())`: The timer was running and is now stopped.
/// - `Err(TimerError::InvalidId(id))`: `id` is out of range.
/// - `Err(TimerError::NotActive(id))`: The timer was not running.
pub fn stop_timer(id: TimerId) -> Result<(), TimerError> {
    TIMERS.stop(id)
}

/// Register the callback invoked each time timer `id` fires.
///
/// The handler runs from the deferred work loop, never from the SysTick
/// interrupt, so it may start or stop timers.
///
/// # Example
/// ```ignore
/// fn on_tick(id: TimerId) { /* ... */ }
/// kernel::set_fired_handler(0, on_tick)?;
/// ```
pub fn set_fired_handler(id: TimerId, handler: FiredHandler) -> Result<(), TimerError> {
    TIMERS.set_fired_handler(id, handler)
}

/// Restore the no-op handler for timer `id`. The timer keeps running.
pub fn clear_fired_handler(id: TimerId) -> Result<(), TimerError> {
    TIMERS.clear_fired_handler(id)
}

/// Run one queued work item. Returns `false` if the queue was empty.
pub fn run_pending() -> bool {
    match TASKS.next() {
        Some(item) => {
            TIMERS.run(item);
            true
        }
        None => false,
    }
}

/// Deferred work loop. **Does not return.**
///
/// Drains the task queue, then sleeps until the next interrupt.
pub fn run() -> ! {
    loop {
        while run_pending() {}

        // Check-then-sleep with interrupts masked: an interrupt arriving
        // after the check still wakes WFI.
        cortex_m::interrupt::disable();
        if TASKS.is_empty() {
            cortex_m::asm::wfi();
        }
        // SAFETY: re-enables exactly what was disabled above; no critical
        // section is open at this point.
        unsafe { cortex_m::interrupt::enable() };
    }
}
