//! Process-wide scheduler instance shared between the tick ISR and the main loop
//!
//! Every access goes through a critical section: on AVR that disables
//! interrupts (avr-device), so a main-loop mutation of the queue head can
//! never interleave with the tick handler's decrement. Callbacks run with
//! the lock released, so they are free to add or delete tasks.

use core::cell::RefCell;

use critical_section::Mutex;

use crate::config::SCH_MAX_TASKS;
use crate::diagnostics::{StatusDisplay, StatusReport};
use crate::hal::Idle;
use crate::rtos::{ErrorCode, Scheduler, TaskFn, TaskId, TickOutcome};

pub struct SharedScheduler<const N: usize> {
    inner: Mutex<RefCell<Scheduler<N>>>,
}

impl<const N: usize> SharedScheduler<N> {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Scheduler::new())),
        }
    }

    /// Run `f` on the scheduler inside a critical section
    pub fn with<R>(&self, f: impl FnOnce(&mut Scheduler<N>) -> R) -> R {
        critical_section::with(|cs| f(&mut self.inner.borrow_ref_mut(cs)))
    }

    pub fn init(&self) {
        self.with(|sched| sched.init());
    }

    /// Timer ISR entry point
    #[inline]
    pub fn tick(&self) -> TickOutcome {
        self.with(|sched| sched.tick())
    }

    pub fn add_task(&self, task: TaskFn, delay: u32, period: u32) -> TaskId {
        self.with(|sched| sched.add_task(task, delay, period))
    }

    pub fn delete_task(&self, id: TaskId) -> bool {
        self.with(|sched| sched.delete_task(id))
    }

    /// Run every task that is due. Returns the number of callbacks run.
    pub fn dispatch(&self) -> usize {
        self.with(|sched| sched.collect_due());

        let mut ran = 0;
        while let Some(record) = self.with(|sched| sched.next_ready()) {
            record.run();
            self.with(|sched| sched.complete(record));
            ran += 1;
        }
        ran
    }

    pub fn current_time(&self) -> u32 {
        self.with(|sched| sched.current_time())
    }

    pub fn get_and_clear_error(&self) -> Option<ErrorCode> {
        self.with(|sched| sched.get_and_clear_error())
    }

    /// One main-loop pass: dispatch, refresh the status display, then idle
    pub fn poll(&self, idle: &mut impl Idle, status: &mut StatusReport, display: &mut impl StatusDisplay) {
        self.dispatch();
        let (error, now) = self.with(|sched| (sched.peek_error(), sched.ticks()));
        status.update(error, now, display);
        idle.idle();
    }

    /// Main loop
    pub fn run(&self, idle: &mut impl Idle, status: &mut StatusReport, display: &mut impl StatusDisplay) -> ! {
        loop {
            self.poll(idle, status, display);
        }
    }
}

impl<const N: usize> Default for SharedScheduler<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Global scheduler instance
pub static SCHEDULER: SharedScheduler<SCH_MAX_TASKS> = SharedScheduler::new();
