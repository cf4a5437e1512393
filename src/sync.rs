//! # Synchronization Primitives
//!
//! Interrupt-safe critical section abstractions. All state crossing the
//! interrupt/deferred boundary lives in a [`Shared`] and is only reachable
//! inside a critical section.
//!
//! On target the critical section is provided by `cortex-m`
//! (`critical-section-single-core`: PRIMASK save/restore). Host tests link
//! the `critical-section` std implementation instead.

use core::cell::RefCell;

pub use critical_section::CriticalSection;

/// Execute a closure within a critical section (interrupts disabled).
///
/// Interrupts are restored on every exit path, including unwinding.
///
/// # Performance
/// Keep critical sections as short as possible to minimize interrupt latency.
/// Never post deferred work, log, or re-enter another critical section from
/// inside `f`.
#[inline]
pub fn critical_section<F, R>(f: F) -> R
where
    F: FnOnce(CriticalSection<'_>) -> R,
{
    critical_section::with(f)
}

/// Mutable state shared between interrupt and task context.
///
/// The only way in is [`Shared::lock`], which hands out `&mut T` for the
/// duration of one critical section.
pub struct Shared<T> {
    inner: critical_section::Mutex<RefCell<T>>,
}

impl<T> Shared<T> {
    pub const fn new(value: T) -> Self {
        Self {
            inner: critical_section::Mutex::new(RefCell::new(value)),
        }
    }

    /// Run `f` with exclusive access to the shared value.
    #[inline]
    pub fn lock<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        critical_section(|cs| f(&mut self.inner.borrow_ref_mut(cs)))
    }
}
