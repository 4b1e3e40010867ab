//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ EvseService (domain)
//! ```
//!
//! Driven adapters (pilot lines, contactor, meter, event sinks) implement
//! these traits.  The [`EvseService`](super::service::EvseService) consumes
//! them via generics, so the charging logic never touches hardware directly.
//!
//! PWM and GPIO are not wrapped here: drivers take `embedded-hal` 1.0
//! `SetDutyCycle`, `OutputPin` and `InputPin` directly.

use crate::config::{ContactorPolarity, CpThresholds, PpBand};
use crate::drivers::contactor::{ContactorIntent, ContactorPhysical};
use crate::error::{AdcError, MeterError};
use crate::fault::FaultReporter;
use crate::signals::{CableCapacity, CpState};

use super::events::EvseEvent;

// ───────────────────────────────────────────────────────────────
// ADC (collaborator: raw sampling and muxing)
// ───────────────────────────────────────────────────────────────

/// Converter input index as wired on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdcChannel(pub u8);

/// One-shot raw conversion (12-bit counts).
pub trait AdcPort {
    fn read_raw(&mut self, channel: AdcChannel) -> Result<u16, AdcError>;
}

// ───────────────────────────────────────────────────────────────
// Pilot port (driven adapter: CP/PP lines ↔ domain)
// ───────────────────────────────────────────────────────────────

/// Read and drive both pilot lines.
pub trait PilotPort {
    /// Decode the Control Pilot once.  Range errors go to `faults`.
    fn read_cp(&mut self, faults: &mut dyn FaultReporter) -> CpState;

    /// Identify the plugged cable.  Band misses go to `faults`.
    fn read_pp(&mut self, faults: &mut dyn FaultReporter) -> CableCapacity;

    /// Offer `amps` to the vehicle on the CP PWM (0 = constant +12 V).
    fn advertise(&mut self, amps: u8);

    /// Duty currently on the CP line.
    fn duty_percent(&self) -> u8;

    /// Swap in new classification thresholds.
    fn set_calibration(&mut self, cp: CpThresholds, pp: [PpBand; 4]);
}

// ───────────────────────────────────────────────────────────────
// Contactor port (driven adapter: domain → power stage)
// ───────────────────────────────────────────────────────────────

pub trait ContactorPort {
    fn open(&mut self);
    fn close(&mut self);
    /// Fresh sample of the auxiliary contact.
    fn read_feedback(&mut self) -> ContactorPhysical;
    fn intent(&self) -> ContactorIntent;
    fn set_polarity(&mut self, polarity: ContactorPolarity);
}

// ───────────────────────────────────────────────────────────────
// Meter port (read-only AC measurement)
// ───────────────────────────────────────────────────────────────

/// One decoded measurement from the energy meter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcReading {
    pub voltage_v: f32,
    pub current_a: f32,
    pub power_w: f32,
}

/// The meter streams packets asynchronously; `poll` returns the newest
/// complete one, or `None` if nothing arrived since the last call.
pub trait MeterPort {
    fn poll(&mut self) -> Result<Option<AcReading>, MeterError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`EvseEvent`]s through this port.
/// Adapters decide where they go (serial log, display, telemetry).
pub trait EventSink {
    fn emit(&mut self, event: &EvseEvent);
}
