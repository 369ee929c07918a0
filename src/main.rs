//! Firmware entry point
//!
//! On AVR: Timer0 compare-match fires every millisecond and ticks the
//! global scheduler, the main loop dispatches and sleeps until the next
//! interrupt. On other targets the same loop runs against simulated ticks.
#![cfg_attr(target_arch = "avr", no_std)]
#![cfg_attr(target_arch = "avr", no_main)]
#![cfg_attr(target_arch = "avr", feature(abi_avr_interrupt))]

#[cfg(target_arch = "avr")]
mod firmware {
    use avr_device::atmega128a::{Peripherals, CPU, PORTA, PORTB};
    use panic_halt as _;

    use tick_scheduler::config::TIMER0_COMPARE;
    use tick_scheduler::diagnostics::{StatusDisplay, StatusReport};
    use tick_scheduler::hal::Idle;
    use tick_scheduler::{ErrorCode, SCHEDULER};

    /// Idle sleep mode until the next interrupt
    struct Sleep {
        cpu: CPU,
    }

    impl Idle for Sleep {
        fn idle(&mut self) {
            self.cpu.mcucr.modify(|r, w| unsafe { w.bits(r.bits() | 0x20) });
            avr_device::asm::sleep();
            self.cpu.mcucr.modify(|r, w| unsafe { w.bits(r.bits() & !0x20) });
        }
    }

    /// Error code shown on the PORTA LED bank
    struct LedStatus {
        port: PORTA,
    }

    impl StatusDisplay for LedStatus {
        fn show(&mut self, error: Option<ErrorCode>) {
            let code = error.map_or(0, ErrorCode::code);
            self.port.porta.write(|w| unsafe { w.bits(code) });
        }
    }

    fn heartbeat() {
        let portb = unsafe { &*PORTB::ptr() };
        portb.portb.modify(|r, w| unsafe { w.bits(r.bits() ^ 0x01) });
    }

    #[avr_device::entry]
    fn main() -> ! {
        let dp = Peripherals::take().unwrap();

        dp.PORTA.ddra.write(|w| unsafe { w.bits(0xFF) });
        dp.PORTB.ddrb.write(|w| unsafe { w.bits(0x01) });

        // Timer0: CTC, clk/64, 1 ms compare match
        dp.TC0.ocr0.write(|w| unsafe { w.bits(TIMER0_COMPARE) });
        dp.TC0.tccr0.write(|w| unsafe { w.bits(0x0C) });
        dp.TC0.timsk.modify(|r, w| unsafe { w.bits(r.bits() | 0x02) });

        SCHEDULER.init();
        SCHEDULER.add_task(heartbeat, 0, 500);

        // Enable interrupts globally
        unsafe { avr_device::interrupt::enable() };

        let mut idle = Sleep { cpu: dp.CPU };
        let mut status = StatusReport::default();
        let mut leds = LedStatus { port: dp.PORTA };
        SCHEDULER.run(&mut idle, &mut status, &mut leds)
    }

    #[avr_device::interrupt(atmega128a)]
    fn TIMER0_COMP() {
        SCHEDULER.tick();
    }
}

#[cfg(not(target_arch = "avr"))]
mod simulation {
    use std::io::{self, Write};
    use std::sync::atomic::{AtomicU32, Ordering};

    use tick_scheduler::diagnostics::{SerialStatus, StatusReport};
    use tick_scheduler::hal::NoIdle;
    use tick_scheduler::{TaskId, SCHEDULER};

    const SIM_TICKS: u32 = 2_000;

    static SENSOR_ID: AtomicU32 = AtomicU32::new(0);

    struct Console(io::Stdout);

    impl ufmt::uWrite for Console {
        type Error = io::Error;

        fn write_str(&mut self, s: &str) -> Result<(), io::Error> {
            self.0.write_all(s.as_bytes())
        }
    }

    fn startup() {
        println!("[{:>5} ms] scheduler running", SCHEDULER.current_time());
    }

    fn heartbeat() {
        println!("[{:>5} ms] heartbeat", SCHEDULER.current_time());
    }

    fn sensor() {
        println!("[{:>5} ms] reading sensor", SCHEDULER.current_time());
    }

    fn stop_sensor() {
        let id = TaskId::new(SENSOR_ID.load(Ordering::Relaxed));
        if SCHEDULER.delete_task(id) {
            println!("[{:>5} ms] sensor task {} stopped", SCHEDULER.current_time(), id);
        }
    }

    pub fn run() {
        SCHEDULER.init();
        SCHEDULER.add_task(startup, 0, 0);
        SCHEDULER.add_task(heartbeat, 0, 500);
        let sensor = SCHEDULER.add_task(sensor, 10, 250);
        SENSOR_ID.store(sensor.get(), Ordering::Relaxed);
        SCHEDULER.add_task(stop_sensor, 1_000, 0);

        let mut status = StatusReport::default();
        let mut console = SerialStatus::new(Console(io::stdout()));
        for _ in 0..SIM_TICKS {
            SCHEDULER.tick();
            SCHEDULER.poll(&mut NoIdle, &mut status, &mut console);
        }

        // Deleting it again is an error, surfaced once
        SCHEDULER.delete_task(sensor);
        if let Some(error) = SCHEDULER.get_and_clear_error() {
            println!("last error: {}", error);
        }
    }
}

#[cfg(not(target_arch = "avr"))]
fn main() {
    simulation::run();
}
