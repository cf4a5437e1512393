//! # Timer Service
//!
//! Multiplexes one hardware alarm into `NUM_TIMERS` logical timers.
//!
//! ## Control flow
//!
//! ```text
//! compare match (ISR)
//!   └─► interval_elapsed()       outstanding += interval + 1
//!         └─► post(HandleFire)   only when nothing is already pending
//!
//! main loop
//!   ├─► handle_fire()            drain outstanding, charge every slot
//!   │     ├─► post(SignalOne)    per expired slot, id → pending queue
//!   │     └─► adjust_interval()  reprogram the compare value
//!   └─► signal_one()             pop one id, call its fired handler
//! ```
//!
//! ## Concurrency
//!
//! Two contexts touch this state: the compare-match interrupt and the
//! deferred main loop. The interrupt can preempt the main loop anywhere;
//! nothing preempts the interrupt. Every access goes through one short
//! critical section, and the dispatcher is only called with interrupts
//! enabled.

use heapless::Deque;
use log::{debug, trace, warn};

use crate::clock::HardwareClock;
use crate::config::{CLOCK_SCALE, HANDLE_FIRE_PRIORITY, MAX_INTERVAL, NUM_TIMERS, SIGNAL_PRIORITY};
use crate::dispatch::{Dispatcher, Priority, WorkItem};
use crate::error::TimerError;
use crate::scheduler;
use crate::sync::Shared;
use crate::timer::{self, Registry, TimerId, TimerKind, TimerSnapshot};

/// Notification hook invoked once per fire, with the timer's id.
pub type FiredHandler = fn(TimerId);

fn ignore_fire(_id: TimerId) {}

/// Everything shared between interrupt and deferred context.
struct Core<C> {
    clock: C,
    registry: Registry,
    /// Expired ids awaiting their `SignalOne`, oldest first.
    pending: Deque<TimerId, NUM_TIMERS>,
    handlers: [FiredHandler; NUM_TIMERS],
    /// Elapsed ticks not yet charged against any countdown.
    outstanding: u32,
    /// Whether a `HandleFire` is queued for the current outstanding batch.
    fire_posted: bool,
    /// Last compare value written to the clock.
    scheduled: u8,
    needs_recompute: bool,
}

impl<C: HardwareClock> Core<C> {
    fn reset(&mut self) {
        self.registry = Registry::new();
        self.pending.clear();
        self.handlers = [ignore_fire as FiredHandler; NUM_TIMERS];
        self.outstanding = 0;
        self.fire_posted = false;
        self.scheduled = MAX_INTERVAL;
        self.needs_recompute = false;
    }

    fn program(&mut self, interval: u8) {
        self.scheduled = interval;
        self.clock.set_interval(interval);
        self.needs_recompute = false;
    }
}

/// The timer virtualization layer, generic over the hardware clock and the
/// deferred task dispatcher it posts to.
pub struct TimerService<'d, C, D> {
    core: Shared<Core<C>>,
    dispatcher: &'d D,
}

impl<'d, C, D> TimerService<'d, C, D>
where
    C: HardwareClock,
    D: Dispatcher,
{
    pub const fn new(clock: C, dispatcher: &'d D) -> Self {
        Self {
            core: Shared::new(Core {
                clock,
                registry: Registry::new(),
                pending: Deque::new(),
                handlers: [ignore_fire as FiredHandler; NUM_TIMERS],
                outstanding: 0,
                fire_posted: false,
                scheduled: MAX_INTERVAL,
                needs_recompute: false,
            }),
            dispatcher,
        }
    }

    /// Reset every slot and start the clock on the idle heartbeat.
    pub fn init(&self) -> Result<(), TimerError> {
        self.core.lock(|core| {
            core.reset();
            core.clock.set_rate(MAX_INTERVAL, CLOCK_SCALE)
        })?;
        debug!("timers: clock running, interval {} scale {}", MAX_INTERVAL, CLOCK_SCALE);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Public start/stop API
    // -----------------------------------------------------------------------

    /// Start (or restart) logical timer `id`, firing after `interval` ticks.
    ///
    /// Reprograms the hardware at once if this deadline is the soonest.
    pub fn start(&self, id: TimerId, kind: TimerKind, interval: u32) -> Result<(), TimerError> {
        let slot = timer::validate_start(id, kind, interval)?;

        let reprogrammed = self.core.lock(|core| {
            let counter = core.clock.read_counter();
            let deadline = scheduler::start_deadline(interval, counter);
            core.registry.arm(slot, kind, interval, deadline);

            let next = scheduler::earlier_interval(deadline, counter, core.scheduled)?;
            core.program(next);
            Some(next)
        });

        debug!("timer {}: start {:?} every {} ticks", id, kind, interval);
        if let Some(next) = reprogrammed {
            trace!("timers: interval shortened to {}", next);
        }
        Ok(())
    }

    /// Stop logical timer `id`.
    ///
    /// The hardware interval is left alone; the next fire-handling pass
    /// widens it. A notification already queued for this timer is still
    /// delivered.
    pub fn stop(&self, id: TimerId) -> Result<(), TimerError> {
        let slot = timer::validate_id(id)?;

        self.core.lock(|core| {
            if !core.registry.disarm(slot) {
                return Err(TimerError::NotActive(id));
            }
            if core.registry.is_idle() {
                core.needs_recompute = true;
            }
            Ok(())
        })?;

        debug!("timer {}: stop", id);
        Ok(())
    }

    /// Register the handler `signal_one` calls for timer `id`.
    pub fn set_fired_handler(&self, id: TimerId, handler: FiredHandler) -> Result<(), TimerError> {
        let slot = timer::validate_id(id)?;
        self.core.lock(|core| core.handlers[slot] = handler);
        Ok(())
    }

    /// Restore the no-op default handler for timer `id`.
    pub fn clear_fired_handler(&self, id: TimerId) -> Result<(), TimerError> {
        self.set_fired_handler(id, ignore_fire)
    }

    // -----------------------------------------------------------------------
    // Interrupt side
    // -----------------------------------------------------------------------

    /// Compare-match interrupt entry point.
    ///
    /// Adds the finished period to the outstanding count and posts one
    /// `HandleFire` per batch. Never blocks and never logs.
    pub fn interval_elapsed(&self) {
        let should_post = self.core.lock(|core| {
            core.clock.acknowledge();
            // A batch whose post was rejected retries on the next interrupt
            let should_post = core.outstanding == 0 || !core.fire_posted;
            let period = core.clock.interval() as u32 + 1;
            core.outstanding = core.outstanding.saturating_add(period);
            should_post
        });

        if should_post {
            let posted = self
                .dispatcher
                .post(WorkItem::HandleFire, Priority(HANDLE_FIRE_PRIORITY))
                .is_ok();
            self.core.lock(|core| core.fire_posted = posted);
        }
    }

    // -----------------------------------------------------------------------
    // Deferred side
    // -----------------------------------------------------------------------

    /// Execute one dispatched work item. Returns the id notified, if any.
    pub fn run(&self, item: WorkItem) -> Option<TimerId> {
        match item {
            WorkItem::HandleFire => {
                self.handle_fire();
                None
            }
            WorkItem::SignalOne => self.signal_one(),
        }
    }

    /// Charge the coalesced elapsed time against every running timer and
    /// queue a notification for each one that expired.
    pub fn handle_fire(&self) {
        let elapsed = self.core.lock(|core| {
            core.needs_recompute = true;
            core.fire_posted = false;
            core::mem::take(&mut core.outstanding)
        });
        let elapsed = i32::try_from(elapsed).unwrap_or(i32::MAX);

        for slot in 0..NUM_TIMERS {
            let due = self.core.lock(|core| {
                let kind = core.registry.charge(slot, elapsed)?;
                Some((kind, !core.pending.is_full()))
            });
            let Some((kind, has_room)) = due else {
                continue;
            };

            let accepted = has_room
                && self
                    .dispatcher
                    .post(WorkItem::SignalOne, Priority(SIGNAL_PRIORITY))
                    .is_ok();

            if accepted {
                self.core.lock(|core| {
                    core.registry.complete_fire(slot);
                    // Room was checked above and only this routine pushes
                    let _ = core.pending.push_back(slot as TimerId);
                });
                trace!("timer {}: fired ({:?})", slot, kind);
            } else {
                let retry = self.core.lock(|core| {
                    let retry = core.scheduled as i32;
                    core.registry.defer(slot, retry);
                    retry
                });
                warn!("timer {}: dispatcher saturated, retry in {} ticks", slot, retry);
            }
        }

        // An interrupt during the loop already queued the next pass, which
        // will see fresher countdowns
        let settled = self.core.lock(|core| core.outstanding == 0);
        if settled {
            self.adjust_interval();
        }
    }

    /// Reprogram the hardware for the soonest running timer, or the idle
    /// heartbeat if none is running.
    pub fn adjust_interval(&self) {
        let next = self.core.lock(|core| {
            let counter = core.clock.read_counter();
            let next = scheduler::next_interval(core.registry.min_ticks_left(), counter);
            core.program(next);
            next
        });
        trace!("timers: interval set to {}", next);
    }

    /// Deliver the oldest pending notification. Returns the notified id,
    /// or `None` if nothing was pending.
    pub fn signal_one(&self) -> Option<TimerId> {
        let (id, handler) = self.core.lock(|core| {
            let id = core.pending.pop_front()?;
            Some((id, core.handlers[id as usize]))
        })?;
        handler(id);
        Some(id)
    }

    // -----------------------------------------------------------------------
    // Introspection
    // -----------------------------------------------------------------------

    /// Whether timer `id` is running. Out-of-range ids are never running.
    pub fn is_active(&self, id: TimerId) -> bool {
        match timer::validate_id(id) {
            Ok(slot) => self.core.lock(|core| core.registry.is_active(slot)),
            Err(_) => false,
        }
    }

    pub fn snapshot(&self, id: TimerId) -> Option<TimerSnapshot> {
        let slot = timer::validate_id(id).ok()?;
        Some(self.core.lock(|core| core.registry.snapshot(slot)))
    }

    pub fn active_mask(&self) -> u32 {
        self.core.lock(|core| core.registry.active_mask())
    }

    /// Compare value most recently written to the hardware.
    pub fn scheduled_interval(&self) -> u8 {
        self.core.lock(|core| core.scheduled)
    }

    /// Set when the active set may no longer match the programmed interval;
    /// cleared on every reprogram.
    pub fn needs_recompute(&self) -> bool {
        self.core.lock(|core| core.needs_recompute)
    }

    /// Elapsed ticks waiting for the next fire-handling pass.
    pub fn outstanding(&self) -> u32 {
        self.core.lock(|core| core.outstanding)
    }

    /// Notifications queued but not yet delivered.
    pub fn pending_fires(&self) -> usize {
        self.core.lock(|core| core.pending.len())
    }

    /// Run `f` against the clock inside a critical section.
    #[cfg(test)]
    pub(crate) fn with_clock<R>(&self, f: impl FnOnce(&mut C) -> R) -> R {
        self.core.lock(|core| f(&mut core.clock))
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    use super::*;
    use crate::clock::{Scale, SimClock};
    use crate::dispatch::TaskQueue;
    use crate::error::DispatchError;

    type Fired = heapless::Vec<TimerId, 64>;

    fn service<const Q: usize>(tasks: &TaskQueue<Q>) -> TimerService<'_, SimClock, TaskQueue<Q>> {
        let svc = TimerService::new(SimClock::new(), tasks);
        svc.init().unwrap();
        svc
    }

    /// Run every queued work item, recording notified ids.
    fn drain<const Q: usize>(
        svc: &TimerService<'_, SimClock, TaskQueue<Q>>,
        tasks: &TaskQueue<Q>,
        fired: &mut Fired,
    ) {
        while let Some(item) = tasks.next() {
            if let Some(id) = svc.run(item) {
                fired.push(id).unwrap();
            }
        }
    }

    /// Advance the simulated clock tick by tick, running deferred work
    /// between ticks.
    fn run_ticks<const Q: usize>(
        svc: &TimerService<'_, SimClock, TaskQueue<Q>>,
        tasks: &TaskQueue<Q>,
        ticks: u32,
        fired: &mut Fired,
    ) {
        for _ in 0..ticks {
            if svc.with_clock(SimClock::advance) {
                svc.interval_elapsed();
            }
            drain(svc, tasks, fired);
        }
    }

    /// Advance until the next compare match, raising the interrupt but
    /// running no deferred work.
    fn tick_to_match<D: Dispatcher>(svc: &TimerService<'_, SimClock, D>) {
        while !svc.with_clock(SimClock::advance) {}
        svc.interval_elapsed();
    }

    #[test]
    fn test_init_starts_idle_heartbeat() {
        let tasks: TaskQueue<4> = TaskQueue::new();
        let svc = service(&tasks);

        assert_eq!(svc.scheduled_interval(), MAX_INTERVAL);
        assert_eq!(svc.active_mask(), 0);
        assert!(!svc.needs_recompute());
        let (interval, scale) = svc.with_clock(|c| (c.interval, c.scale));
        assert_eq!(interval, MAX_INTERVAL);
        assert_eq!(scale, Some(Scale::new(CLOCK_SCALE).unwrap()));
    }

    #[test]
    fn test_start_then_stop_leaves_slot_inactive() {
        let tasks: TaskQueue<4> = TaskQueue::new();
        let svc = service(&tasks);

        for id in 0..NUM_TIMERS as TimerId {
            svc.start(id, TimerKind::Repeating, 50).unwrap();
            assert!(svc.is_active(id));
            svc.stop(id).unwrap();
            assert!(!svc.is_active(id), "timer {} still active", id);
            assert_eq!(svc.active_mask() & (1 << id), 0);
        }
    }

    #[test]
    fn test_start_rejects_bad_arguments() {
        let tasks: TaskQueue<4> = TaskQueue::new();
        let svc = service(&tasks);

        assert_eq!(
            svc.start(NUM_TIMERS as TimerId, TimerKind::OneShot, 10),
            Err(TimerError::InvalidId(NUM_TIMERS as TimerId))
        );
        assert_eq!(
            svc.start(0, TimerKind::Repeating, 2),
            Err(TimerError::InvalidPeriod(2))
        );
        assert!(!svc.is_active(0), "rejected start must not touch state");
        assert_eq!(svc.scheduled_interval(), MAX_INTERVAL);

        assert_eq!(svc.start(0, TimerKind::Repeating, 3), Ok(()));
    }

    #[test]
    fn test_stop_never_started_is_not_active() {
        let tasks: TaskQueue<4> = TaskQueue::new();
        let svc = service(&tasks);

        assert_eq!(svc.stop(5), Err(TimerError::NotActive(5)));
        assert_eq!(
            svc.stop(NUM_TIMERS as TimerId),
            Err(TimerError::InvalidId(NUM_TIMERS as TimerId))
        );
    }

    #[test]
    fn test_start_shortens_interval_immediately() {
        let tasks: TaskQueue<4> = TaskQueue::new();
        let svc = service(&tasks);

        svc.start(0, TimerKind::Repeating, 10).unwrap();
        assert_eq!(svc.scheduled_interval(), 10);
        assert_eq!(svc.with_clock(|c| c.interval), 10);

        // Later deadline leaves the hardware alone
        svc.with_clock(|c| c.counter = 5);
        svc.start(1, TimerKind::OneShot, 20).unwrap();
        assert_eq!(svc.scheduled_interval(), 10);
        assert_eq!(svc.snapshot(1).unwrap().ticks_left, 25);
    }

    #[test]
    fn test_start_huge_interval_saturates() {
        let tasks: TaskQueue<4> = TaskQueue::new();
        let svc = service(&tasks);

        svc.start(0, TimerKind::OneShot, u32::MAX).unwrap();
        assert_eq!(svc.snapshot(0).unwrap().ticks_left, i32::MAX);
        assert_eq!(svc.scheduled_interval(), MAX_INTERVAL);
    }

    #[test]
    fn test_stop_last_timer_is_lazy() {
        let tasks: TaskQueue<4> = TaskQueue::new();
        let svc = service(&tasks);

        svc.start(0, TimerKind::Repeating, 10).unwrap();
        svc.stop(0).unwrap();
        assert!(svc.needs_recompute());
        assert_eq!(svc.scheduled_interval(), 10, "stop must not reprogram");
        assert_eq!(svc.with_clock(|c| c.programmed.last().copied()), Some(10));

        svc.adjust_interval();
        assert!(!svc.needs_recompute());
        assert_eq!(svc.scheduled_interval(), MAX_INTERVAL);
    }

    #[test]
    fn test_interrupts_coalesce_into_one_pass() {
        let tasks: TaskQueue<4> = TaskQueue::new();
        let svc = service(&tasks);
        svc.start(0, TimerKind::Repeating, 50).unwrap();

        svc.interval_elapsed();
        svc.interval_elapsed();
        svc.interval_elapsed();
        assert_eq!(tasks.len(), 1, "one HandleFire per batch");
        assert_eq!(svc.outstanding(), 3 * 51);

        let mut fired = Fired::new();
        drain(&svc, &tasks, &mut fired);
        assert_eq!(svc.outstanding(), 0);
        assert_eq!(fired.as_slice(), &[0]);
        assert_eq!(svc.snapshot(0).unwrap().ticks_left, 50 - 153 + 50);
    }

    #[test]
    fn test_outstanding_sums_each_period() {
        let tasks: TaskQueue<4> = TaskQueue::new();
        let svc = service(&tasks);

        svc.with_clock(|c| c.interval = 40);
        svc.interval_elapsed();
        svc.with_clock(|c| c.interval = 60);
        svc.interval_elapsed();
        assert_eq!(svc.outstanding(), 41 + 61);
    }

    #[test]
    fn test_rejected_handle_fire_post_retries() {
        let tasks: TaskQueue<1> = TaskQueue::new();
        let svc = service(&tasks);

        tasks.post(WorkItem::SignalOne, Priority(0)).unwrap();
        svc.interval_elapsed();
        assert_eq!(svc.outstanding(), MAX_INTERVAL as u32 + 1);

        tasks.clear();
        svc.interval_elapsed();
        assert_eq!(tasks.next(), Some(WorkItem::HandleFire));
        assert_eq!(svc.outstanding(), 2 * (MAX_INTERVAL as u32 + 1));
    }

    #[test]
    fn test_two_timer_scenario() {
        let tasks: TaskQueue<16> = TaskQueue::new();
        let svc = service(&tasks);
        let mut fired = Fired::new();

        svc.start(0, TimerKind::Repeating, 10).unwrap();
        svc.start(1, TimerKind::OneShot, 25).unwrap();

        // Compare at 10 matches on the 11th tick
        run_ticks(&svc, &tasks, 11, &mut fired);
        assert_eq!(fired.as_slice(), &[0]);
        let t0 = svc.snapshot(0).unwrap();
        assert!(t0.active);
        assert_eq!(t0.ticks_left, 9, "re-armed to 10 minus one tick overshoot");

        run_ticks(&svc, &tasks, 15, &mut fired);
        assert_eq!(fired.as_slice(), &[0, 0, 1]);
        assert!(!svc.is_active(1), "one-shot retired after its fire");
        assert!(svc.is_active(0));
    }

    #[test]
    fn test_repeating_fires_once_per_period() {
        let tasks: TaskQueue<16> = TaskQueue::new();
        let svc = service(&tasks);
        let mut fired = Fired::new();

        let period = 20;
        let periods = 10;
        svc.start(3, TimerKind::Repeating, period).unwrap();
        run_ticks(&svc, &tasks, period * periods, &mut fired);

        let n = fired.len() as u32;
        assert!(
            (periods - 1..=periods + 1).contains(&n),
            "{} fires over {} periods",
            n,
            periods
        );
        assert!(fired.iter().all(|&id| id == 3));
    }

    #[test]
    fn test_one_shot_fires_once_then_idles() {
        let tasks: TaskQueue<16> = TaskQueue::new();
        let svc = service(&tasks);
        let mut fired = Fired::new();

        svc.start(2, TimerKind::OneShot, 5).unwrap();
        run_ticks(&svc, &tasks, 600, &mut fired);

        assert_eq!(fired.as_slice(), &[2]);
        assert!(!svc.is_active(2));
        assert_eq!(svc.scheduled_interval(), MAX_INTERVAL);
        assert!(!svc.needs_recompute());
    }

    #[test]
    fn test_saturated_dispatcher_defers_fire() {
        let tasks: TaskQueue<4> = TaskQueue::new();
        let svc = service(&tasks);
        let mut fired = Fired::new();

        svc.start(0, TimerKind::Repeating, 10).unwrap();
        tick_to_match(&svc);

        // Fill the queue behind the HandleFire so SignalOne cannot be posted
        let item = tasks.next().unwrap();
        assert_eq!(item, WorkItem::HandleFire);
        for _ in 0..4 {
            tasks.post(WorkItem::SignalOne, Priority(0)).unwrap();
        }
        svc.run(item);

        let t0 = svc.snapshot(0).unwrap();
        assert!(t0.active);
        assert_eq!(t0.kind, TimerKind::Repeating);
        assert_eq!(t0.ticks_left, 10, "reset to the scheduled interval");
        assert_eq!(svc.pending_fires(), 0);

        // Dispatcher drains; the deferred fire goes through next batch
        tasks.clear();
        run_ticks(&svc, &tasks, 11, &mut fired);
        assert_eq!(fired.as_slice(), &[0]);
    }

    #[test]
    fn test_full_pending_queue_defers_fire() {
        let tasks: TaskQueue<16> = TaskQueue::new();
        let svc = service(&tasks);

        svc.start(0, TimerKind::Repeating, 3).unwrap();

        // Run only the fire-handling passes so notifications pile up
        for _ in 0..10 {
            tick_to_match(&svc);
            let item = tasks.next().unwrap();
            assert_eq!(item, WorkItem::HandleFire);
            svc.run(item);
        }

        assert_eq!(svc.pending_fires(), NUM_TIMERS);
        assert_eq!(tasks.len(), NUM_TIMERS, "one SignalOne per queued id");
        let t0 = svc.snapshot(0).unwrap();
        assert!(t0.active);
        assert_eq!(t0.ticks_left, svc.scheduled_interval() as i32);

        let mut fired = Fired::new();
        drain(&svc, &tasks, &mut fired);
        assert_eq!(fired.len(), NUM_TIMERS, "no fire lost or repeated");
        assert!(fired.iter().all(|&id| id == 0));
        assert_eq!(svc.pending_fires(), 0);
    }

    /// Task queue that raises the compare-match interrupt while the first
    /// `SignalOne` is being posted, once armed.
    struct InterruptingQueue {
        tasks: TaskQueue<16>,
    }

    static INTERRUPT_ARMED: AtomicBool = AtomicBool::new(false);
    static INTERRUPTING: InterruptingQueue = InterruptingQueue {
        tasks: TaskQueue::new(),
    };
    static INTERRUPTED: TimerService<'static, SimClock, InterruptingQueue> =
        TimerService::new(SimClock::new(), &INTERRUPTING);

    impl Dispatcher for InterruptingQueue {
        fn post(&self, item: WorkItem, priority: Priority) -> Result<(), DispatchError> {
            let posted = self.tasks.post(item, priority);
            if matches!(item, WorkItem::SignalOne) && INTERRUPT_ARMED.swap(false, Ordering::SeqCst)
            {
                INTERRUPTED.interval_elapsed();
            }
            posted
        }
    }

    #[test]
    fn test_interrupt_during_fire_pass_skips_reprogram() {
        let svc = &INTERRUPTED;
        let tasks = &INTERRUPTING.tasks;
        svc.init().unwrap();

        svc.start(0, TimerKind::Repeating, 10).unwrap();
        tick_to_match(svc);
        let item = tasks.next().unwrap();
        assert_eq!(item, WorkItem::HandleFire);

        INTERRUPT_ARMED.store(true, Ordering::SeqCst);
        svc.run(item);
        assert!(!INTERRUPT_ARMED.load(Ordering::SeqCst), "interrupt was raised");

        // The next pass is already queued and owns the reprogram
        assert!(svc.needs_recompute());
        assert_eq!(svc.scheduled_interval(), 10);
        assert_eq!(svc.outstanding(), 11);
        assert_eq!(svc.pending_fires(), 1);
        assert_eq!(tasks.next(), Some(WorkItem::HandleFire));
        assert_eq!(tasks.next(), Some(WorkItem::SignalOne));
        assert_eq!(tasks.next(), None);

        // That pass charges the second period and settles the interval
        svc.run(WorkItem::HandleFire);
        assert_eq!(svc.outstanding(), 0);
        assert!(!svc.needs_recompute());
        assert_eq!(svc.pending_fires(), 2);
    }

    #[test]
    fn test_stop_does_not_cancel_queued_notification() {
        let tasks: TaskQueue<4> = TaskQueue::new();
        let svc = service(&tasks);

        svc.start(0, TimerKind::Repeating, 10).unwrap();
        tick_to_match(&svc);
        let item = tasks.next().unwrap();
        svc.run(item);
        assert_eq!(svc.pending_fires(), 1);

        svc.stop(0).unwrap();
        assert_eq!(tasks.next(), Some(WorkItem::SignalOne));
        assert_eq!(svc.signal_one(), Some(0));
        assert_eq!(svc.signal_one(), None);
    }

    #[test]
    fn test_fired_handler_called_once_per_fire() {
        static CALLS: AtomicU32 = AtomicU32::new(0);
        fn on_fire(id: TimerId) {
            assert_eq!(id, 4);
            CALLS.fetch_add(1, Ordering::Relaxed);
        }

        let tasks: TaskQueue<16> = TaskQueue::new();
        let svc = service(&tasks);
        let mut fired = Fired::new();

        assert_eq!(
            svc.set_fired_handler(NUM_TIMERS as TimerId, on_fire),
            Err(TimerError::InvalidId(NUM_TIMERS as TimerId))
        );
        svc.set_fired_handler(4, on_fire).unwrap();
        svc.start(4, TimerKind::OneShot, 5).unwrap();
        run_ticks(&svc, &tasks, 20, &mut fired);
        assert_eq!(CALLS.load(Ordering::Relaxed), 1);

        svc.clear_fired_handler(4).unwrap();
        svc.start(4, TimerKind::OneShot, 5).unwrap();
        run_ticks(&svc, &tasks, 20, &mut fired);
        assert_eq!(CALLS.load(Ordering::Relaxed), 1, "default handler is a no-op");
        assert_eq!(fired.as_slice(), &[4, 4]);
    }

    #[test]
    fn test_init_clears_running_timers() {
        let tasks: TaskQueue<4> = TaskQueue::new();
        let svc = service(&tasks);

        svc.start(1, TimerKind::Repeating, 10).unwrap();
        svc.interval_elapsed();
        svc.init().unwrap();

        assert_eq!(svc.active_mask(), 0);
        assert_eq!(svc.outstanding(), 0);
        assert_eq!(svc.scheduled_interval(), MAX_INTERVAL);
    }
}
