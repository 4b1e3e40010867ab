//! Hardware adapter: bridges board peripherals to domain port traits.
//!
//! Owns the ADC, both pilot interpreters, the contactor controller and the
//! meter, exposing them through [`PilotPort`], [`ContactorPort`] and
//! [`MeterPort`].  This is the only module that holds peripheral handles;
//! on the host the same adapter runs over [`super::sim`] peripherals.

use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::pwm::SetDutyCycle;
use log::info;

use crate::app::ports::{AcReading, AdcPort, ContactorPort, MeterPort, PilotPort};
use crate::config::{ContactorPolarity, CpThresholds, EvseConfig, PpBand};
use crate::drivers::contactor::{ContactorController, ContactorIntent, ContactorPhysical};
use crate::error::MeterError;
use crate::fault::FaultReporter;
use crate::pins;
use crate::signals::{CableCapacity, ControlPilot, CpState, ProximityPilot};

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<A, P, O, I, M> {
    adc: A,
    cp: ControlPilot<P>,
    pp: ProximityPilot,
    contactor: ContactorController<O, I>,
    meter: M,
}

impl<A, P, O, I, M> HardwareAdapter<A, P, O, I, M>
where
    A: AdcPort,
    P: SetDutyCycle,
    O: OutputPin,
    I: InputPin,
    M: MeterPort,
{
    /// Wire the board using the channel map in [`pins`] and the
    /// calibration carried by `config`.  The coil is driven open here.
    pub fn new(adc: A, cp_pwm: P, coil: O, aux: I, meter: M, config: &EvseConfig) -> Self {
        info!(
            "Board: CP PWM {} @ {} Hz, CP sense {}, PP sense {}, coil {}, aux {}",
            pins::CP_PWM_PIN,
            pins::CP_PWM_FREQ_HZ,
            pins::CP_ADC_PIN,
            pins::PP_ADC_PIN,
            pins::CONTACTOR_COIL_PIN,
            pins::CONTACTOR_AUX_PIN
        );
        Self {
            adc,
            cp: ControlPilot::new(cp_pwm, pins::CP_ADC_CHANNEL, config.cp_thresholds),
            pp: ProximityPilot::new(pins::PP_ADC_CHANNEL, config.pp_bands),
            contactor: ContactorController::new(coil, aux, config.contactor),
            meter,
        }
    }
}

// ── PilotPort implementation ──────────────────────────────────

impl<A, P, O, I, M> PilotPort for HardwareAdapter<A, P, O, I, M>
where
    A: AdcPort,
    P: SetDutyCycle,
{
    fn read_cp(&mut self, faults: &mut dyn FaultReporter) -> CpState {
        self.cp.read_cp_state(&mut self.adc, faults)
    }

    fn read_pp(&mut self, faults: &mut dyn FaultReporter) -> CableCapacity {
        self.pp.read_cable_capacity(&mut self.adc, faults)
    }

    fn advertise(&mut self, amps: u8) {
        self.cp.advertise_max_current(amps);
    }

    fn duty_percent(&self) -> u8 {
        self.cp.duty_percent()
    }

    fn set_calibration(&mut self, cp: CpThresholds, pp: [PpBand; 4]) {
        self.cp.set_thresholds(cp);
        self.pp.set_bands(pp);
    }
}

// ── ContactorPort implementation ──────────────────────────────

impl<A, P, O, I, M> ContactorPort for HardwareAdapter<A, P, O, I, M>
where
    O: OutputPin,
    I: InputPin,
{
    fn open(&mut self) {
        self.contactor.open();
    }

    fn close(&mut self) {
        self.contactor.close();
    }

    fn read_feedback(&mut self) -> ContactorPhysical {
        self.contactor.read_feedback()
    }

    fn intent(&self) -> ContactorIntent {
        self.contactor.intent()
    }

    fn set_polarity(&mut self, polarity: ContactorPolarity) {
        self.contactor.set_polarity(polarity);
    }
}

// ── MeterPort implementation ──────────────────────────────────

impl<A, P, O, I, M> MeterPort for HardwareAdapter<A, P, O, I, M>
where
    M: MeterPort,
{
    fn poll(&mut self) -> Result<Option<AcReading>, MeterError> {
        self.meter.poll()
    }
}
