//! Task identity and the records handed out by the delta queue

use core::fmt;

/// Callback run by the dispatcher. Runs to completion, never from interrupt context.
pub type TaskFn = fn();

/// Identifier assigned to a registered task
///
/// Zero is reserved: [`TaskId::NONE`] is returned when registration fails
/// and is never given to a real task.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TaskId(u32);

impl TaskId {
    /// "No task" sentinel
    pub const NONE: TaskId = TaskId(0);

    pub const fn new(raw: u32) -> Self {
        TaskId(raw)
    }

    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl ufmt::uDisplay for TaskId {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: ufmt::uWrite + ?Sized,
    {
        ufmt::uwrite!(f, "#{}", self.0)
    }
}

/// A task detached from the queue
///
/// `period == 0` marks a one-shot task.
#[derive(Copy, Clone)]
pub struct TaskRecord {
    pub id: TaskId,
    pub task: TaskFn,
    pub period: u32,
    /// Scheduler generation the record was detached in
    pub(crate) epoch: u32,
}

impl TaskRecord {
    pub const fn new(id: TaskId, task: TaskFn, period: u32) -> Self {
        Self {
            id,
            task,
            period,
            epoch: 0,
        }
    }

    #[inline]
    pub fn is_periodic(&self) -> bool {
        self.period != 0
    }

    /// Invoke the callback
    #[inline]
    pub fn run(&self) {
        (self.task)()
    }
}

impl fmt::Debug for TaskRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskRecord")
            .field("id", &self.id)
            .field("period", &self.period)
            .finish()
    }
}
