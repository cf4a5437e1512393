//! # VTimer Configuration
//!
//! Compile-time constants governing the timer layer and the clock it drives.
//! All limits are fixed at compile time; no dynamic allocation.

/// Number of logical timer slots. Bounds the static slot table and the
/// pending-fire queue. The active set is a single `u32`, so this must not
/// exceed 32.
pub const NUM_TIMERS: usize = 8;

/// Largest hardware interval ever programmed, in hardware ticks. Also the
/// idle heartbeat used when no logical timer is running.
pub const MAX_INTERVAL: u8 = 230;

/// Countdowns at or below this many ticks are treated as expired, and
/// repeating periods at or below it are rejected. Processing latency makes
/// anything shorter unserviceable.
pub const MIN_PERIOD: u32 = 2;

/// Minimum distance, in ticks, between the current counter reading and a
/// newly programmed deadline. Guarantees the compare value lands ahead of
/// the counter.
pub const SCHEDULE_MARGIN: u8 = 3;

/// Prescaler index programmed by `init()`. Index 3 divides the base clock
/// by 32, giving 1024 hardware ticks per second.
pub const CLOCK_SCALE: u8 = 3;

/// Reference frequency the prescaler divides, in Hz.
pub const CLOCK_BASE_HZ: u32 = 32_768;

/// System clock frequency in Hz (default for STM32F4 at 16 MHz HSI).
pub const SYSTEM_CLOCK_HZ: u32 = 16_000_000;

/// Capacity of the deferred task queue shared by the kernel.
pub const TASK_QUEUE_DEPTH: usize = 16;

/// Priority of the fire-handling routine. Runs ahead of notifications so
/// tick accounting is never starved by application callbacks.
pub const HANDLE_FIRE_PRIORITY: u8 = 12;

/// Priority of a single fired notification.
pub const SIGNAL_PRIORITY: u8 = 7;

const _: () = assert!(NUM_TIMERS <= 32, "active set is a u32 bitmask");
const _: () = assert!(NUM_TIMERS <= u8::MAX as usize, "timer ids are u8");
