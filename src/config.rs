//! Configuration constants for the tick scheduler

/// CPU frequency in Hz
pub const CPU_FREQ_HZ: u32 = 16_000_000;

/// Maximum number of tasks held by the process-wide scheduler
pub const SCH_MAX_TASKS: usize = 40;

/// Timer interrupt period in milliseconds (one scheduler tick)
pub const TICK_PERIOD_MS: u32 = 1;

/// How long a newly reported error stays on the status display, in ticks
pub const ERROR_DISPLAY_TICKS: u32 = 60_000;

/// Timer0 prescaler used for the tick interrupt
pub const TIMER0_PRESCALER: u32 = 64;

/// Timer0 compare value for one tick (16MHz/64 = 250kHz, 250 counts = 1ms)
pub const TIMER0_COMPARE: u8 = (CPU_FREQ_HZ / TIMER0_PRESCALER / 1000 * TICK_PERIOD_MS - 1) as u8;
