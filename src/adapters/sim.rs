//! Simulated bench peripherals.
//!
//! Stand-ins for the ADC, CP PWM, coil driver, auxiliary contact and
//! energy meter, all backed by one shared [`SimBench`].  The `evse-sim`
//! binary and the adapter tests drive a vehicle by writing raw pilot
//! counts into the bench and read back what the controller did.
//!
//! The auxiliary contact mirrors the coil unless a weld or a stuck-open
//! contact is injected.

use core::convert::Infallible;
use core::sync::atomic::{AtomicBool, AtomicU8, AtomicU16, Ordering};
use std::sync::Arc;

use embedded_hal::digital::{ErrorType as DigitalErrorType, InputPin, OutputPin};
use embedded_hal::pwm::{ErrorType as PwmErrorType, SetDutyCycle};

use crate::app::ports::{AcReading, AdcChannel, AdcPort, MeterPort};
use crate::config::EvseConfig;
use crate::error::{AdcError, MeterError};
use crate::pins;

use super::hardware::HardwareAdapter;

// ---------------------------------------------------------------------------
// Raw pilot counts (12-bit) for a standard vehicle and cable
// ---------------------------------------------------------------------------

pub const CP_RAW_A: u16 = 4000;
pub const CP_RAW_B: u16 = 3000;
pub const CP_RAW_C: u16 = 2000;
pub const CP_RAW_D: u16 = 1000;
/// Pilot shorted to PE.
pub const CP_RAW_SHORT: u16 = 100;

pub const PP_RAW_13A: u16 = 2450;
pub const PP_RAW_20A: u16 = 1650;
pub const PP_RAW_32A: u16 = 750;
pub const PP_RAW_63A: u16 = 350;
/// No coding resistor.
pub const PP_RAW_OPEN: u16 = 4095;

const AUX_FOLLOWS_COIL: u8 = 0;
const AUX_STUCK_LOW: u8 = 1;
const AUX_STUCK_HIGH: u8 = 2;

/// Shared state of the simulated board.
#[derive(Debug)]
struct BenchState {
    cp_raw: AtomicU16,
    pp_raw: AtomicU16,
    /// Second PP level for a contact bouncing between two readings; 0 when steady.
    pp_alt_raw: AtomicU16,
    pp_flip: AtomicBool,
    coil_high: AtomicBool,
    aux_mode: AtomicU8,
    duty: AtomicU8,
    /// Load drawn by the vehicle while the contactor is closed, in 0.1 A.
    load_deci_amps: AtomicU16,
    /// Mains RMS voltage, in 0.1 V.
    mains_deci_volts: AtomicU16,
    meter_glitch: AtomicBool,
}

/// Handle to the simulated board.  Cheap to clone; every peripheral
/// handed out by [`adapter`](Self::adapter) shares the same state.
#[derive(Debug, Clone)]
pub struct SimBench {
    state: Arc<BenchState>,
}

/// Hardware adapter over simulated peripherals.
pub type SimHardware = HardwareAdapter<SimAdc, SimPwm, SimCoil, SimAux, SimMeter>;

impl Default for SimBench {
    fn default() -> Self {
        Self::new()
    }
}

impl SimBench {
    /// Unplugged, mains at 230 V, no load.
    pub fn new() -> Self {
        Self {
            state: Arc::new(BenchState {
                cp_raw: AtomicU16::new(CP_RAW_A),
                pp_raw: AtomicU16::new(PP_RAW_OPEN),
                pp_alt_raw: AtomicU16::new(0),
                pp_flip: AtomicBool::new(false),
                coil_high: AtomicBool::new(false),
                aux_mode: AtomicU8::new(AUX_FOLLOWS_COIL),
                duty: AtomicU8::new(100),
                load_deci_amps: AtomicU16::new(0),
                mains_deci_volts: AtomicU16::new(2300),
                meter_glitch: AtomicBool::new(false),
            }),
        }
    }

    /// Build the full hardware adapter on top of this bench.
    pub fn adapter(&self, config: &EvseConfig) -> SimHardware {
        HardwareAdapter::new(
            SimAdc { bench: self.clone() },
            SimPwm { bench: self.clone() },
            SimCoil { bench: self.clone() },
            SimAux { bench: self.clone() },
            SimMeter { bench: self.clone() },
            config,
        )
    }

    // ── Vehicle side ──────────────────────────────────────────

    pub fn set_cp_raw(&self, raw: u16) {
        self.state.cp_raw.store(raw, Ordering::Relaxed);
    }

    pub fn set_pp_raw(&self, raw: u16) {
        self.state.pp_alt_raw.store(0, Ordering::Relaxed);
        self.state.pp_raw.store(raw, Ordering::Relaxed);
    }

    /// Successive PP samples alternate between `first` and `second`, as
    /// with a poorly seated plug.
    pub fn set_pp_alternating(&self, first: u16, second: u16) {
        self.state.pp_flip.store(false, Ordering::Relaxed);
        self.state.pp_raw.store(first, Ordering::Relaxed);
        self.state.pp_alt_raw.store(second, Ordering::Relaxed);
    }

    /// Plug a 32 A cable into a vehicle presenting `cp_raw`.
    pub fn plug_in(&self, cp_raw: u16) {
        self.set_pp_raw(PP_RAW_32A);
        self.set_cp_raw(cp_raw);
    }

    pub fn unplug(&self) {
        self.set_cp_raw(CP_RAW_A);
        self.set_pp_raw(PP_RAW_OPEN);
    }

    pub fn set_load_amps(&self, amps: f32) {
        let deci = (amps.max(0.0) * 10.0).round() as u16;
        self.state.load_deci_amps.store(deci, Ordering::Relaxed);
    }

    pub fn set_mains_volts(&self, volts: f32) {
        let deci = (volts.max(0.0) * 10.0).round() as u16;
        self.state.mains_deci_volts.store(deci, Ordering::Relaxed);
    }

    // ── Fault injection ───────────────────────────────────────

    /// Contacts fused: the aux contact reports closed regardless of the coil.
    pub fn weld(&self) {
        self.state.aux_mode.store(AUX_STUCK_HIGH, Ordering::Relaxed);
    }

    /// Contacts never pull in.
    pub fn stick_open(&self) {
        self.state.aux_mode.store(AUX_STUCK_LOW, Ordering::Relaxed);
    }

    pub fn repair_contactor(&self) {
        self.state.aux_mode.store(AUX_FOLLOWS_COIL, Ordering::Relaxed);
    }

    /// The next meter poll returns a checksum error.
    pub fn glitch_meter(&self) {
        self.state.meter_glitch.store(true, Ordering::Relaxed);
    }

    // ── Observation ───────────────────────────────────────────

    /// Duty currently on the simulated CP output.
    pub fn duty(&self) -> u8 {
        self.state.duty.load(Ordering::Relaxed)
    }

    pub fn coil_energised(&self) -> bool {
        self.state.coil_high.load(Ordering::Relaxed)
    }
}

// ---------------------------------------------------------------------------
// ADC
// ---------------------------------------------------------------------------

pub struct SimAdc {
    bench: SimBench,
}

impl AdcPort for SimAdc {
    fn read_raw(&mut self, channel: AdcChannel) -> Result<u16, AdcError> {
        let s = &self.bench.state;
        if channel == pins::CP_ADC_CHANNEL {
            Ok(s.cp_raw.load(Ordering::Relaxed))
        } else if channel == pins::PP_ADC_CHANNEL {
            let alt = s.pp_alt_raw.load(Ordering::Relaxed);
            if alt != 0 && s.pp_flip.fetch_xor(true, Ordering::Relaxed) {
                Ok(alt)
            } else {
                Ok(s.pp_raw.load(Ordering::Relaxed))
            }
        } else {
            Err(AdcError::InvalidChannel)
        }
    }
}

// ---------------------------------------------------------------------------
// CP PWM
// ---------------------------------------------------------------------------

/// Full scale of 100 so the compare value equals the duty in percent.
pub struct SimPwm {
    bench: SimBench,
}

impl PwmErrorType for SimPwm {
    type Error = Infallible;
}

impl SetDutyCycle for SimPwm {
    fn max_duty_cycle(&self) -> u16 {
        100
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        self.bench.state.duty.store(duty.min(100) as u8, Ordering::Relaxed);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Contactor coil and auxiliary contact
// ---------------------------------------------------------------------------

pub struct SimCoil {
    bench: SimBench,
}

impl DigitalErrorType for SimCoil {
    type Error = Infallible;
}

impl OutputPin for SimCoil {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.bench.state.coil_high.store(false, Ordering::Relaxed);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.bench.state.coil_high.store(true, Ordering::Relaxed);
        Ok(())
    }
}

pub struct SimAux {
    bench: SimBench,
}

impl DigitalErrorType for SimAux {
    type Error = Infallible;
}

impl InputPin for SimAux {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        let s = &self.bench.state;
        Ok(match s.aux_mode.load(Ordering::Relaxed) {
            AUX_STUCK_LOW => false,
            AUX_STUCK_HIGH => true,
            _ => s.coil_high.load(Ordering::Relaxed),
        })
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|h| !h)
    }
}

// ---------------------------------------------------------------------------
// Energy meter
// ---------------------------------------------------------------------------

/// Produces one packet per poll.  Current flows only through closed contacts.
pub struct SimMeter {
    bench: SimBench,
}

impl MeterPort for SimMeter {
    fn poll(&mut self) -> Result<Option<AcReading>, MeterError> {
        let s = &self.bench.state;
        if s.meter_glitch.swap(false, Ordering::Relaxed) {
            return Err(MeterError::Checksum);
        }
        let voltage_v = f32::from(s.mains_deci_volts.load(Ordering::Relaxed)) / 10.0;
        let current_a = if s.coil_high.load(Ordering::Relaxed) {
            f32::from(s.load_deci_amps.load(Ordering::Relaxed)) / 10.0
        } else {
            0.0
        };
        Ok(Some(AcReading {
            voltage_v,
            current_a,
            power_w: voltage_v * current_a,
        }))
    }
}
