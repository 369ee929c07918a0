//! Logging macros
//!
//! - `defmt` feature: forwards to defmt (RTT / serial transport chosen by the firmware)
//! - Host unit tests: printed to stdout
//! - Otherwise: compiled out
//!
//! Never call these from the tick interrupt.

/// Log debug message
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::debug!($($arg)*);

        #[cfg(all(not(feature = "defmt"), test))]
        ::std::println!("[DEBUG] {}", ::std::format!($($arg)*));
    }};
}

/// Log warning message
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::warn!($($arg)*);

        #[cfg(all(not(feature = "defmt"), test))]
        ::std::println!("[WARN] {}", ::std::format!($($arg)*));
    }};
}

/// Log error message
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::error!($($arg)*);

        #[cfg(all(not(feature = "defmt"), test))]
        ::std::eprintln!("[ERROR] {}", ::std::format!($($arg)*));
    }};
}

#[cfg(test)]
mod tests {
    use crate::rtos::{ErrorCode, TaskId};

    #[test]
    fn macros_accept_scheduler_types() {
        let id = TaskId::new(3);
        crate::log_debug!("task {} added, delay {}", id, 10u32);
        crate::log_warn!("delete {} failed", id);
        crate::log_error!("{}", ErrorCode::CannotRescheduleTask);
    }
}
