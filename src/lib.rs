//! # VTimer — Virtual Timers
//!
//! Multiplexes one hardware alarm into many independent logical timers for
//! ARM Cortex-M4 microcontrollers.
//!
//! ## Overview
//!
//! Application code starts and stops up to `NUM_TIMERS` logical timers,
//! repeating or one-shot. The layer keeps the single hardware compare value
//! pointed at the soonest deadline, and turns each compare-match interrupt
//! into deferred work so the interrupt itself stays tiny:
//!
//! - **Coalescing**: interrupts that arrive before the deferred pass runs
//!   only add to an outstanding-tick count; nothing is lost or counted twice
//! - **Backpressure**: a fire the dispatcher cannot accept is retried on the
//!   next pass, never dropped
//! - **Short critical sections**: interrupts are masked only around single
//!   reads and writes of shared state
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │                    Application Code                     │
//! ├────────────────────────────────────────────────────────┤
//! │                 Kernel API (kernel.rs)                  │
//! │     init() · start_timer() · stop_timer() · run()      │
//! ├────────────────────────────────────────────────────────┤
//! │               Timer Service (service.rs)                │
//! │  interval_elapsed() · handle_fire() · signal_one()     │
//! ├──────────────┬───────────────┬────────────┬────────────┤
//! │  Registry    │  Scheduler    │  Dispatch  │   Sync     │
//! │  timer.rs    │  scheduler.rs │ dispatch.rs│  sync.rs   │
//! ├──────────────┴───────────────┴────────────┴────────────┤
//! │        Hardware Clock Interface (clock.rs)              │
//! ├────────────────────────────────────────────────────────┤
//! │        Arch Port (arch/cortex_m4.rs) · SysTick          │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Memory Model
//!
//! - **No heap**: All state is statically allocated
//! - **No `alloc`**: Pure `core` only
//! - **Fixed-size slot table**: `[LogicalTimer; NUM_TIMERS]`
//! - **Critical sections**: `critical_section::with()` for shared state

#![no_std]

pub mod config;
pub mod error;
pub mod sync;
pub mod clock;
pub mod dispatch;
pub mod timer;
pub mod scheduler;
pub mod service;
#[cfg(any(target_arch = "arm", test))]
pub mod arch;
#[cfg(target_arch = "arm")]
pub mod kernel;

pub use clock::HardwareClock;
pub use dispatch::{Dispatcher, Priority, TaskQueue, WorkItem};
pub use error::{ClockError, DispatchError, TimerError};
pub use service::{FiredHandler, TimerService};
pub use timer::{TimerId, TimerKind, TimerSnapshot};
