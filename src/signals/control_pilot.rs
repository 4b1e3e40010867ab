//! Control Pilot interpreter and current advertiser.
//!
//! The CP line carries the vehicle's state as a DC level (sampled on the
//! positive plateau of the 1 kHz square wave) and the station's current
//! offer as the PWM duty cycle.
//!
//! ```text
//!   raw count   ≥ a_min   ≥ b_min   ≥ c_min   ≥ d_min   below
//!   state        A12V      B9V       C6V       D3V       Fault
//! ```
//!
//! Duty mapping (IEC 61851-1 annex A, GB/T 18487.1):
//!
//! | amps     | duty %                  |
//! |----------|-------------------------|
//! | 0        | 100 (constant +12 V)    |
//! | 1..=5    | 10 (digital comms hint) |
//! | 6..=51   | amps / 0.6              |
//! | 52..=80  | amps / 2.5 + 64         |
//! | > 80     | as 80                   |

use embedded_hal::pwm::SetDutyCycle;
use log::{debug, error};
use serde::{Deserialize, Serialize};

use crate::app::ports::{AdcChannel, AdcPort};
use crate::config::CpThresholds;
use crate::error::ErrorCode;
use crate::fault::FaultReporter;

/// Vehicle state decoded from one CP sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CpState {
    /// +12 V: no vehicle.
    A12V,
    /// +9 V: vehicle connected, not requesting.
    B9V,
    /// +6 V: vehicle requests charge.
    C6V,
    /// +3 V: vehicle requests charge with ventilation.
    D3V,
    /// Out of range, or the sample could not be taken.
    Fault,
}

impl CpState {
    /// True for B, C and D: something is plugged in and answering.
    pub const fn vehicle_present(self) -> bool {
        matches!(self, Self::B9V | Self::C6V | Self::D3V)
    }
}

/// Classify one raw sample.  Pure; thresholds are checked high to low.
pub fn classify(sample: u16, t: &CpThresholds) -> CpState {
    if sample >= t.a_min {
        CpState::A12V
    } else if sample >= t.b_min {
        CpState::B9V
    } else if sample >= t.c_min {
        CpState::C6V
    } else if sample >= t.d_min {
        CpState::D3V
    } else {
        CpState::Fault
    }
}

const DUTY_STANDBY: u8 = 100;
const DUTY_DIGITAL: u8 = 10;
const DUTY_MIN: u8 = 5;
const DUTY_MAX: u8 = 96;
const AMPS_CEILING: u8 = 80;

/// PWM duty (percent) that advertises `amps` to the vehicle.
///
/// Integer form of the standard's formulas with half-up rounding.
pub fn duty_for_current(amps: u8) -> u8 {
    let duty = match amps {
        0 => return DUTY_STANDBY,
        1..=5 => DUTY_DIGITAL,
        // round(amps / 0.6) == floor((10 * amps + 3) / 6)
        6..=51 => ((u16::from(amps) * 10 + 3) / 6) as u8,
        // round(amps / 2.5 + 64) == floor((4 * amps + 5) / 10) + 64
        _ => {
            let a = u16::from(amps.min(AMPS_CEILING));
            ((a * 4 + 5) / 10 + 64) as u8
        }
    };
    duty.clamp(DUTY_MIN, DUTY_MAX)
}

/// CP driver: one ADC channel in, one PWM output out.
pub struct ControlPilot<P> {
    pwm: P,
    channel: AdcChannel,
    thresholds: CpThresholds,
    duty: u8,
}

impl<P: SetDutyCycle> ControlPilot<P> {
    /// Wrap the PWM output.  Nothing is written until the first
    /// [`advertise_max_current`](Self::advertise_max_current).
    pub fn new(pwm: P, channel: AdcChannel, thresholds: CpThresholds) -> Self {
        Self {
            pwm,
            channel,
            thresholds,
            duty: DUTY_STANDBY,
        }
    }

    pub fn set_thresholds(&mut self, thresholds: CpThresholds) {
        self.thresholds = thresholds;
    }

    /// Sample the line once and decode it.  No retry.
    pub fn read_cp_state(&mut self, adc: &mut impl AdcPort, faults: &mut dyn FaultReporter) -> CpState {
        let sample = match adc.read_raw(self.channel) {
            Ok(raw) => raw,
            Err(e) => {
                error!("CP sample failed: {}", e);
                faults.report(ErrorCode::CpVoltageInvalid, "control_pilot", line!());
                return CpState::Fault;
            }
        };

        let state = classify(sample, &self.thresholds);
        if state == CpState::Fault {
            faults.report(ErrorCode::CpVoltageInvalid, "control_pilot", line!());
        }
        state
    }

    /// Set the duty cycle that offers `amps` to the vehicle.
    pub fn advertise_max_current(&mut self, amps: u8) {
        let duty = duty_for_current(amps);
        if duty != self.duty {
            debug!("CP: advertising {} A at {}% duty", amps, duty);
        }
        if let Err(e) = self.pwm.set_duty_cycle_percent(duty) {
            error!("CP: PWM update to {}% failed: {:?}", duty, e);
        }
        self.duty = duty;
    }

    /// Last duty requested from the PWM.
    pub fn duty_percent(&self) -> u8 {
        self.duty
    }
}
