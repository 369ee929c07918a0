//! Tick-driven cooperative task scheduler

use crate::config::TICK_PERIOD_MS;

use super::delta_queue::{DeltaQueue, Pending, TickOutcome};
use super::registry::{ErrorCode, TaskRegistry};
use super::task::{TaskFn, TaskId, TaskRecord};
use super::Result;

/// Scheduler state: pending tasks, tick counter, id counter and error slot
///
/// `tick` is the only operation meant for interrupt context. Everything
/// else belongs to the main loop; see [`crate::os::SharedScheduler`] for
/// the interrupt-safe wrapper.
pub struct Scheduler<const N: usize> {
    queue: DeltaQueue<N>,
    registry: TaskRegistry,
    ticks: u32,
    tick_period_ms: u32,
    /// Task detached for dispatch and currently running
    running: Option<TaskId>,
    running_cancelled: bool,
    /// Bumped by `init`; records detached before a reset are not re-armed
    epoch: u32,
}

impl<const N: usize> Scheduler<N> {
    pub const fn new() -> Self {
        Self::with_tick_period(TICK_PERIOD_MS)
    }

    /// Scheduler whose tick interrupt fires every `tick_period_ms`
    pub const fn with_tick_period(tick_period_ms: u32) -> Self {
        Self {
            queue: DeltaQueue::new(),
            registry: TaskRegistry::new(),
            ticks: 0,
            tick_period_ms,
            running: None,
            running_cancelled: false,
            epoch: 0,
        }
    }

    /// Drop every task and reset time, ids and the error slot
    ///
    /// A task running when this is called (e.g. a callback resetting the
    /// scheduler) is dropped too: [`Scheduler::complete`] will not re-arm it.
    pub fn init(&mut self) {
        let epoch = self.epoch.wrapping_add(1);
        *self = Self::with_tick_period(self.tick_period_ms);
        self.epoch = epoch;
    }

    /// Timer interrupt entry point. Constant time, never runs callbacks.
    #[inline]
    pub fn tick(&mut self) -> TickOutcome {
        self.ticks = self.ticks.wrapping_add(1);
        self.queue.tick()
    }

    /// Register `task` to run after `delay` ticks, then every `period`
    /// ticks (`period == 0` runs it once)
    ///
    /// Returns [`TaskId::NONE`] and records the error when no slot is free.
    pub fn add_task(&mut self, task: TaskFn, delay: u32, period: u32) -> TaskId {
        match self.try_add_task(task, delay, period) {
            Ok(id) => id,
            Err(error) => {
                crate::log_warn!("add_task failed: {}", error);
                self.registry.record(error);
                TaskId::NONE
            }
        }
    }

    pub fn try_add_task(&mut self, task: TaskFn, delay: u32, period: u32) -> Result<TaskId> {
        // Don't burn an id on a registration that cannot succeed
        if self.queue.len() >= N {
            return Err(ErrorCode::TooManyTasks);
        }

        let queue = &self.queue;
        let running = self.live_running();
        let id = self
            .registry
            .allocate(|id| running == Some(id) || queue.contains(id));

        self.queue.insert(TaskRecord::new(id, task, period), delay)?;
        crate::log_debug!("task {} added, delay {} period {}", id, delay, period);
        Ok(id)
    }

    /// Remove a task. Returns false and records the error if `id` is unknown.
    pub fn delete_task(&mut self, id: TaskId) -> bool {
        match self.try_delete_task(id) {
            Ok(()) => true,
            Err(error) => {
                crate::log_warn!("delete_task {} failed: {}", id, error);
                self.registry.record(error);
                false
            }
        }
    }

    pub fn try_delete_task(&mut self, id: TaskId) -> Result<()> {
        if self.live_running() == Some(id) {
            // Still running: just don't re-arm it
            self.running_cancelled = true;
            return Ok(());
        }
        self.queue.remove(id).map(|_| ())
    }

    /// Run every task that is due, re-arming periodic ones
    ///
    /// Tasks that become due while this runs wait for the next call.
    /// Returns the number of callbacks run.
    pub fn dispatch(&mut self) -> usize {
        self.collect_due();

        let mut ran = 0;
        while let Some(record) = self.next_ready() {
            record.run();
            self.complete(record);
            ran += 1;
        }
        ran
    }

    /// Detach all due tasks for dispatch
    pub fn collect_due(&mut self) -> usize {
        self.queue.pop_all_due()
    }

    /// Next detached task to run, if any
    ///
    /// The caller runs it and then hands it back through [`Scheduler::complete`].
    pub fn next_ready(&mut self) -> Option<TaskRecord> {
        let mut record = self.queue.take_ready()?;
        record.epoch = self.epoch;
        self.running = Some(record.id);
        self.running_cancelled = false;
        Some(record)
    }

    /// Finish a task returned by [`Scheduler::next_ready`]
    ///
    /// Periodic tasks are re-armed `period` ticks from now, keeping their id.
    /// Returns false when re-arming failed; the task then stops recurring
    /// and [`ErrorCode::CannotRescheduleTask`] is recorded. Records detached
    /// before the last [`Scheduler::init`] are discarded.
    pub fn complete(&mut self, record: TaskRecord) -> bool {
        if record.epoch != self.epoch {
            crate::log_debug!("task {} discarded after reset", record.id);
            return true;
        }

        let cancelled = self.running == Some(record.id) && self.running_cancelled;
        self.running = None;
        self.running_cancelled = false;

        if !record.is_periodic() || cancelled {
            return true;
        }

        match self.queue.insert(record, record.period) {
            Ok(()) => true,
            Err(_) => {
                crate::log_error!("task {} dropped: no slot to reschedule", record.id);
                self.registry.record(ErrorCode::CannotRescheduleTask);
                false
            }
        }
    }

    /// Elapsed time in milliseconds (tick count times tick period, wrapping)
    pub fn current_time(&self) -> u32 {
        self.ticks.wrapping_mul(self.tick_period_ms)
    }

    #[inline]
    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    /// Return the last recorded error and clear it
    pub fn get_and_clear_error(&mut self) -> Option<ErrorCode> {
        self.registry.take()
    }

    pub fn peek_error(&self) -> Option<ErrorCode> {
        self.registry.peek()
    }

    /// Is `id` registered (pending, due, or running and not deleted)?
    pub fn contains(&self, id: TaskId) -> bool {
        self.live_running() == Some(id) || self.queue.contains(id)
    }

    /// Pending tasks in due order
    pub fn pending(&self) -> Pending<'_, N> {
        self.queue.iter()
    }

    /// Slots in use
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    fn live_running(&self) -> Option<TaskId> {
        self.running.filter(|_| !self.running_cancelled)
    }
}

impl<const N: usize> Default for Scheduler<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Fluent task registration
pub struct TaskBuilder {
    function: Option<TaskFn>,
    delay: u32,
    period: u32,
}

impl TaskBuilder {
    pub fn new() -> Self {
        Self {
            function: None,
            delay: 0,
            period: 0,
        }
    }

    pub fn function(mut self, function: TaskFn) -> Self {
        self.function = Some(function);
        self
    }

    pub fn delay(mut self, delay: u32) -> Self {
        self.delay = delay;
        self
    }

    pub fn period(mut self, period: u32) -> Self {
        self.period = period;
        self
    }

    /// Register with `scheduler`
    ///
    /// Returns [`TaskId::NONE`] and records the error if no function was set
    /// or the scheduler is full.
    pub fn build<const N: usize>(self, scheduler: &mut Scheduler<N>) -> TaskId {
        match self.function {
            Some(function) => scheduler.add_task(function, self.delay, self.period),
            None => {
                crate::log_warn!("add_task failed: {}", ErrorCode::InvalidTask);
                scheduler.registry.record(ErrorCode::InvalidTask);
                TaskId::NONE
            }
        }
    }
}

impl Default for TaskBuilder {
    fn default() -> Self {
        Self::new()
    }
}
