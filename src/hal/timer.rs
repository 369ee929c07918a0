//! Tick source driven by a polled count-down timer
//!
//! For boards where the periodic timer interrupt is not wired to the
//! scheduler, the main loop polls an `embedded-hal` count-down timer and
//! forwards every expiry as one tick.

use embedded_hal::timer::{CountDown, Periodic};

use crate::os::SharedScheduler;

pub struct PolledTick<T> {
    timer: T,
}

impl<T> PolledTick<T>
where
    T: CountDown + Periodic,
{
    /// Start `timer` with one tick period and take ownership of it
    pub fn start<P>(mut timer: T, period: P) -> Self
    where
        P: Into<T::Time>,
    {
        timer.start(period);
        Self { timer }
    }

    /// Forward at most one expiry. Returns true if a tick was delivered.
    pub fn poll<const N: usize>(&mut self, scheduler: &SharedScheduler<N>) -> bool {
        match self.timer.wait() {
            Ok(()) => {
                scheduler.tick();
                true
            }
            Err(nb::Error::WouldBlock) => false,
            Err(nb::Error::Other(_)) => false,
        }
    }

    pub fn free(self) -> T {
        self.timer
    }
}
