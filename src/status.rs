//! Read-only status shared with the display context.
//!
//! The control loop publishes a [`StatusSnapshot`] after each tick; the
//! display (or a diagnostics task on another core) reads the latest one
//! without touching the service.  A critical-section mutex keeps the copy
//! consistent when the reader runs from an interrupt.

use core::cell::Cell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use crate::drivers::contactor::ContactorIntent;
use crate::error::ErrorCode;
use crate::fsm::ChargeState;

/// What the UI shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub state: ChargeState,
    pub last_fault: ErrorCode,
    pub contactor: ContactorIntent,
    pub advertised_amps: u8,
    pub duty_percent: u8,
}

impl StatusSnapshot {
    /// Value visible before the first publish.
    pub const BOOT: Self = Self {
        state: ChargeState::Init,
        last_fault: ErrorCode::None,
        contactor: ContactorIntent::Open,
        advertised_amps: 0,
        duty_percent: 100,
    };
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        Self::BOOT
    }
}

pub struct SharedStatus {
    slot: Mutex<CriticalSectionRawMutex, Cell<StatusSnapshot>>,
}

impl Default for SharedStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedStatus {
    /// Usable in a `static`.
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(Cell::new(StatusSnapshot::BOOT)),
        }
    }

    pub fn publish(&self, snapshot: StatusSnapshot) {
        self.slot.lock(|s| s.set(snapshot));
    }

    pub fn get(&self) -> StatusSnapshot {
        self.slot.lock(Cell::get)
    }
}
