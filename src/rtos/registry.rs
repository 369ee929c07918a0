//! Task identity allocation and the last-error register

use core::fmt;

use super::task::TaskId;

/// Scheduler error codes
///
/// Numbering follows the error codes reported on the status display.
/// Codes 3 to 7 belong to the shared-clock (multi-node) scheduler variant
/// and are never produced here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ErrorCode {
    /// Registration failed, every slot is taken
    TooManyTasks = 1,
    /// No task with the requested id
    CannotDeleteTask = 2,
    /// A periodic task ran but could not be re-armed; it no longer recurs
    CannotRescheduleTask = 8,
    /// Registration without a callback
    InvalidTask = 9,
    /// Delay too large to be represented in the queue
    DelayOutOfRange = 10,
}

impl ErrorCode {
    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn description(self) -> &'static str {
        match self {
            ErrorCode::TooManyTasks => "too many tasks",
            ErrorCode::CannotDeleteTask => "cannot delete task",
            ErrorCode::CannotRescheduleTask => "cannot reschedule task",
            ErrorCode::InvalidTask => "invalid task",
            ErrorCode::DelayOutOfRange => "delay out of range",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{} ({})", self.code(), self.description())
    }
}

impl ufmt::uDisplay for ErrorCode {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: ufmt::uWrite + ?Sized,
    {
        ufmt::uwrite!(f, "E{} ({})", self.code(), self.description())
    }
}

/// Task id counter and single-slot error register
pub struct TaskRegistry {
    next_id: u32,
    last_error: Option<ErrorCode>,
}

impl TaskRegistry {
    pub const fn new() -> Self {
        Self {
            next_id: 1,
            last_error: None,
        }
    }

    /// Hand out the next id
    ///
    /// Zero is skipped on wraparound, as is any id for which `is_live`
    /// answers true.
    pub fn allocate(&mut self, is_live: impl Fn(TaskId) -> bool) -> TaskId {
        loop {
            let id = TaskId::new(self.next_id);
            self.next_id = self.next_id.wrapping_add(1);
            if !id.is_none() && !is_live(id) {
                return id;
            }
        }
    }

    /// Overwrite the error slot
    pub fn record(&mut self, error: ErrorCode) {
        self.last_error = Some(error);
    }

    pub fn peek(&self) -> Option<ErrorCode> {
        self.last_error
    }

    /// Read and clear the error slot
    pub fn take(&mut self) -> Option<ErrorCode> {
        self.last_error.take()
    }
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_start_at_one_and_increase() {
        let mut reg = TaskRegistry::new();
        assert_eq!(reg.allocate(|_| false), TaskId::new(1));
        assert_eq!(reg.allocate(|_| false), TaskId::new(2));
        assert_eq!(reg.allocate(|_| false), TaskId::new(3));
    }

    #[test]
    fn wraparound_skips_zero_and_live_ids() {
        let mut reg = TaskRegistry::new();
        reg.next_id = u32::MAX;
        assert_eq!(reg.allocate(|_| false), TaskId::new(u32::MAX));
        // 0 is reserved and 1 is still registered
        assert_eq!(reg.allocate(|id| id.get() == 1), TaskId::new(2));
    }

    #[test]
    fn error_slot_read_and_clear() {
        let mut reg = TaskRegistry::new();
        assert_eq!(reg.take(), None);
        reg.record(ErrorCode::TooManyTasks);
        reg.record(ErrorCode::CannotDeleteTask);
        assert_eq!(reg.peek(), Some(ErrorCode::CannotDeleteTask));
        assert_eq!(reg.take(), Some(ErrorCode::CannotDeleteTask));
        assert_eq!(reg.take(), None);
    }

    #[test]
    fn error_codes_match_display_numbering() {
        assert_eq!(ErrorCode::TooManyTasks.code(), 1);
        assert_eq!(ErrorCode::CannotDeleteTask.code(), 2);
        assert_eq!(ErrorCode::CannotRescheduleTask.code(), 8);
        assert_eq!(ErrorCode::InvalidTask.code(), 9);
        assert_eq!(ErrorCode::DelayOutOfRange.code(), 10);
        assert_eq!(
            std::format!("{}", ErrorCode::TooManyTasks),
            "E1 (too many tasks)"
        );
    }
}
