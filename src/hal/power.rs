use embedded_hal::blocking::delay::DelayMs;

/// Called by the main loop after each dispatch pass
///
/// Firmware puts the CPU to sleep here; the next timer interrupt wakes it.
pub trait Idle {
    fn idle(&mut self);
}

/// Busy main loop, never sleeps
pub struct NoIdle;

impl Idle for NoIdle {
    #[inline]
    fn idle(&mut self) {}
}

/// Idle by blocking for one tick period
pub struct DelayIdle<D> {
    delay: D,
    tick_ms: u8,
}

impl<D: DelayMs<u8>> DelayIdle<D> {
    pub fn new(delay: D, tick_ms: u8) -> Self {
        Self { delay, tick_ms }
    }

    pub fn free(self) -> D {
        self.delay
    }
}

impl<D: DelayMs<u8>> Idle for DelayIdle<D> {
    fn idle(&mut self) {
        self.delay.delay_ms(self.tick_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::delay::MockNoop;

    #[test]
    fn delay_idle_uses_tick_period() {
        let mut idle = DelayIdle::new(MockNoop::new(), 1);
        idle.idle();
        idle.idle();
        let _delay: MockNoop = idle.free();
    }

    #[test]
    fn no_idle_returns_immediately() {
        NoIdle.idle();
    }
}
