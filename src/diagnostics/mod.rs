//! Scheduler status reporting
//!
//! A newly recorded error is latched on a display (LED port, serial line)
//! for a fixed number of ticks, then the display is cleared. The error slot
//! itself is only peeked; reading and clearing it stays with the application.

use crate::config::ERROR_DISPLAY_TICKS;
use crate::rtos::ErrorCode;

/// Where the status goes
pub trait StatusDisplay {
    /// Show `error`, or the "all good" state for `None`
    fn show(&mut self, error: Option<ErrorCode>);
}

pub struct StatusReport {
    last_seen: Option<ErrorCode>,
    shown_since: u32,
    hold_ticks: u32,
    latched: bool,
}

impl StatusReport {
    pub const fn new(hold_ticks: u32) -> Self {
        Self {
            last_seen: None,
            shown_since: 0,
            hold_ticks,
            latched: false,
        }
    }

    /// Feed the current error slot and tick count
    pub fn update(&mut self, error: Option<ErrorCode>, now: u32, display: &mut impl StatusDisplay) {
        if error != self.last_seen {
            self.last_seen = error;
            if error.is_some() {
                display.show(error);
                self.shown_since = now;
                self.latched = true;
            } else if self.latched {
                display.show(None);
                self.latched = false;
            }
        } else if self.latched && now.wrapping_sub(self.shown_since) >= self.hold_ticks {
            display.show(None);
            self.latched = false;
        }
    }

    pub fn is_latched(&self) -> bool {
        self.latched
    }
}

impl Default for StatusReport {
    fn default() -> Self {
        Self::new(ERROR_DISPLAY_TICKS)
    }
}

/// Status lines on a serial console
pub struct SerialStatus<W> {
    writer: W,
}

impl<W: ufmt::uWrite> SerialStatus<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: ufmt::uWrite> StatusDisplay for SerialStatus<W> {
    fn show(&mut self, error: Option<ErrorCode>) {
        match error {
            Some(error) => ufmt::uwrite!(self.writer, "[SCH] {}\r\n", error).ok(),
            None => ufmt::uwrite!(self.writer, "[SCH] OK\r\n").ok(),
        };
    }
}
