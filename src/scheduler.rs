//! Tick scheduler.
//!
//! A 1 ms timer interrupt calls [`TickScheduler::on_millisecond`]; the
//! main loop polls the `take_*` methods and runs one control tick or one
//! display refresh per raised flag.
//!
//! ```text
//! ┌────────────┐  on_millisecond  ┌───────────────┐  take_control_tick   ┌───────────────┐
//! │ 1 ms timer │ ───────────────▶ │ TickScheduler │ ───────────────────▶ │  main loop    │
//! │   (ISR)    │                  │  (atomics)    │  take_display_refresh│  (consumer)   │
//! └────────────┘                  └───────────────┘ ───────────────────▶ └───────────────┘
//! ```
//!
//! Flags are level, not counting: a loop that falls behind runs one tick,
//! not a burst of catch-up ticks.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use log::warn;

pub struct TickScheduler {
    millis: AtomicU32,
    control_due: AtomicBool,
    display_due: AtomicBool,
    control_period_ms: u32,
    display_period_ms: u32,
}

impl TickScheduler {
    /// Periods are clamped to at least 1 ms.
    pub const fn new(control_period_ms: u32, display_period_ms: u32) -> Self {
        Self {
            millis: AtomicU32::new(0),
            control_due: AtomicBool::new(false),
            display_due: AtomicBool::new(false),
            control_period_ms: if control_period_ms == 0 { 1 } else { control_period_ms },
            display_period_ms: if display_period_ms == 0 { 1 } else { display_period_ms },
        }
    }

    /// ISR entry point.  Lock-free.
    pub fn on_millisecond(&self) {
        let now = self.millis.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        if now % self.control_period_ms == 0 && self.control_due.swap(true, Ordering::Release) {
            // Previous flag never consumed: the loop overran a tick.
            warn!("Control tick overrun at {} ms", now);
        }
        if now % self.display_period_ms == 0 {
            self.display_due.store(true, Ordering::Release);
        }
    }

    /// Consume the control flag.
    pub fn take_control_tick(&self) -> bool {
        self.control_due.swap(false, Ordering::Acquire)
    }

    /// Consume the display flag.
    pub fn take_display_refresh(&self) -> bool {
        self.display_due.swap(false, Ordering::Acquire)
    }

    /// Milliseconds since start (wraps after ~49 days).
    pub fn uptime_ms(&self) -> u32 {
        self.millis.load(Ordering::Relaxed)
    }
}
