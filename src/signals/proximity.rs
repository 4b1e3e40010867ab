//! Proximity Pilot interpreter.
//!
//! The cable's PP resistor (between PP and PE) encodes its current
//! rating.  Through the board's divider it lands in one of four ADC bands.
//! Eight samples are averaged with integer arithmetic before
//! classification; any failed sample aborts the read.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::app::ports::{AdcChannel, AdcPort};
use crate::config::PpBand;
use crate::error::ErrorCode;
use crate::fault::FaultReporter;

/// Samples averaged per read.
pub const PP_SAMPLES: u32 = 8;

/// Current rating of the attached cable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CableCapacity {
    Unknown,
    Amps13,
    Amps20,
    Amps32,
    Amps63,
}

impl CableCapacity {
    /// Rating in amperes, `None` for an unidentified cable.
    pub const fn amps(self) -> Option<u8> {
        match self {
            Self::Unknown => None,
            Self::Amps13 => Some(13),
            Self::Amps20 => Some(20),
            Self::Amps32 => Some(32),
            Self::Amps63 => Some(63),
        }
    }
}

/// Map a mean count to the band containing it.
pub fn classify(mean: u16, bands: &[PpBand]) -> CableCapacity {
    bands
        .iter()
        .find(|b| b.contains(mean))
        .map_or(CableCapacity::Unknown, |b| b.capacity)
}

pub struct ProximityPilot {
    channel: AdcChannel,
    bands: [PpBand; 4],
}

impl ProximityPilot {
    pub fn new(channel: AdcChannel, bands: [PpBand; 4]) -> Self {
        Self { channel, bands }
    }

    pub fn set_bands(&mut self, bands: [PpBand; 4]) {
        self.bands = bands;
    }

    /// Average [`PP_SAMPLES`] readings and classify.
    ///
    /// `Unknown` (band gap or sampling failure) is reported as
    /// `PpResistanceInvalid`.
    pub fn read_cable_capacity(
        &mut self,
        adc: &mut impl AdcPort,
        faults: &mut dyn FaultReporter,
    ) -> CableCapacity {
        let mut sum: u32 = 0;
        for _ in 0..PP_SAMPLES {
            match adc.read_raw(self.channel) {
                Ok(raw) => sum += u32::from(raw),
                Err(e) => {
                    warn!("PP sample failed: {}", e);
                    faults.report(ErrorCode::PpResistanceInvalid, "proximity", line!());
                    return CableCapacity::Unknown;
                }
            }
        }

        let mean = (sum / PP_SAMPLES) as u16;
        let capacity = classify(mean, &self.bands);
        if capacity == CableCapacity::Unknown {
            warn!("PP mean {} outside every cable band", mean);
            faults.report(ErrorCode::PpResistanceInvalid, "proximity", line!());
        }
        capacity
    }
}
