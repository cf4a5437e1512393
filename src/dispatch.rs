//! # Deferred Task Dispatch
//!
//! Work that must not run in interrupt context is posted as a [`WorkItem`]
//! and executed later from the main loop. The queue is bounded: a full queue
//! rejects the post, and the caller decides how to degrade.
//!
//! ```text
//!  SysTick ISR ──post(HandleFire, 12)──►┌───────────┐
//!                                       │ TaskQueue │──next()──► main loop
//!  handle_fire ─post(SignalOne, 7)─────►└───────────┘              │
//!                                                                  ▼
//!                                                   TimerService::run(item)
//! ```

use core::cmp::Ordering;

use heapless::binary_heap::{BinaryHeap, Max};

use crate::error::DispatchError;
use crate::sync::Shared;

/// A unit of deferred work understood by the timer layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkItem {
    /// Drain the coalesced elapsed ticks and fire due timers.
    HandleFire,
    /// Deliver one notification from the pending-fire queue.
    SignalOne,
}

/// Dispatch priority. Higher values run first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Priority(pub u8);

/// Accepts deferred work. `post` must be callable from interrupt context.
pub trait Dispatcher {
    fn post(&self, item: WorkItem, priority: Priority) -> Result<(), DispatchError>;
}

/// Queued work item with its arrival order.
#[derive(Debug, Clone, Copy)]
struct Entry {
    priority: Priority,
    seq: u32,
    item: WorkItem,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    // Max-heap: higher priority first, then the older sequence number.
    // Sequence numbers wrap, so age is compared by signed distance.
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| (other.seq.wrapping_sub(self.seq) as i32).cmp(&0))
    }
}

struct QueueState<const N: usize> {
    heap: BinaryHeap<Entry, Max, N>,
    next_seq: u32,
}

/// Bounded priority queue of deferred work, FIFO within a priority.
pub struct TaskQueue<const N: usize> {
    state: Shared<QueueState<N>>,
}

impl<const N: usize> TaskQueue<N> {
    pub const fn new() -> Self {
        Self {
            state: Shared::new(QueueState {
                heap: BinaryHeap::new(),
                next_seq: 0,
            }),
        }
    }

    /// Pop the most urgent item, if any.
    pub fn next(&self) -> Option<WorkItem> {
        self.state.lock(|s| s.heap.pop().map(|e| e.item))
    }

    pub fn len(&self) -> usize {
        self.state.lock(|s| s.heap.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop everything queued.
    pub fn clear(&self) {
        self.state.lock(|s| s.heap.clear());
    }
}

impl<const N: usize> Default for TaskQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Dispatcher for TaskQueue<N> {
    fn post(&self, item: WorkItem, priority: Priority) -> Result<(), DispatchError> {
        self.state.lock(|s| {
            let entry = Entry {
                priority,
                seq: s.next_seq,
                item,
            };
            s.heap.push(entry).map_err(|_| DispatchError::Saturated)?;
            s.next_seq = s.next_seq.wrapping_add(1);
            Ok(())
        })
    }
}
