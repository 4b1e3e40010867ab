//! Station configuration parameters
//!
//! All tunable parameters for the charging core.  Defaults match the
//! reference board (12-bit ADC, 32 A supply rating).  Values can be
//! overridden from JSON at provisioning time or restored from a postcard
//! calibration blob.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::signals::proximity::CableCapacity;

/// Raw-count lower bounds for each Control Pilot state, high to low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpThresholds {
    /// State A (12 V, no vehicle) at or above this count.
    pub a_min: u16,
    /// State B (9 V, vehicle connected).
    pub b_min: u16,
    /// State C (6 V, charge requested).
    pub c_min: u16,
    /// State D (3 V, charge with ventilation).  Anything lower is a fault.
    pub d_min: u16,
}

impl Default for CpThresholds {
    fn default() -> Self {
        Self {
            a_min: 3600,
            b_min: 2600,
            c_min: 1600,
            d_min: 600,
        }
    }
}

/// One closed Proximity Pilot resistance band, in raw ADC counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PpBand {
    pub capacity: CableCapacity,
    pub low: u16,
    pub high: u16,
}

impl PpBand {
    pub const fn contains(&self, raw: u16) -> bool {
        raw >= self.low && raw <= self.high
    }
}

/// Electrical sense of the contactor coil and its auxiliary contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactorPolarity {
    /// Coil energised (contactor closed) when the drive pin is high.
    pub drive_active_high: bool,
    /// Auxiliary contact reads high when the main contacts are closed.
    pub feedback_closed_high: bool,
}

impl Default for ContactorPolarity {
    fn default() -> Self {
        Self {
            drive_active_high: true,
            feedback_closed_high: true,
        }
    }
}

/// What to do when a vehicle pulls CP down to state D.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VentilationPolicy {
    /// No ventilation hardware: refuse and latch `StateInvalid`.
    #[default]
    Fault,
    /// Indoor ventilation is provided; D is handled like C.
    TreatAsCharge,
}

/// AC supply limits checked while the contactor is closed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeterLimits {
    /// Tolerated draw above the advertised current, in percent.
    pub overcurrent_margin_pct: u8,
    pub overvoltage_v: f32,
    pub undervoltage_v: f32,
}

impl Default for MeterLimits {
    fn default() -> Self {
        Self {
            overcurrent_margin_pct: 10,
            overvoltage_v: 253.0, // 230 V + 10 %
            undervoltage_v: 207.0, // 230 V - 10 %
        }
    }
}

/// Core station configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvseConfig {
    // --- Supply ---
    /// Current rating of the station wiring (A).  Caps every advertisement.
    pub evse_limit_amps: u8,

    // --- Timing ---
    /// State-machine tick period (milliseconds)
    pub tick_interval_ms: u32,
    /// Display / status refresh period (milliseconds)
    pub display_interval_ms: u32,
    /// Time a contactor needs to settle before its feedback is trusted
    pub contactor_settle_ms: u32,

    // --- Signals ---
    pub cp_thresholds: CpThresholds,
    /// Cable bands, any order, must not overlap.
    pub pp_bands: [PpBand; 4],

    // --- Contactor ---
    pub contactor: ContactorPolarity,

    // --- Policy ---
    pub ventilation: VentilationPolicy,
    pub metering: MeterLimits,
}

impl Default for EvseConfig {
    fn default() -> Self {
        Self {
            evse_limit_amps: 32,

            tick_interval_ms: 10,     // 100 Hz
            display_interval_ms: 100, // 10 Hz
            contactor_settle_ms: 50,

            cp_thresholds: CpThresholds::default(),
            pp_bands: [
                PpBand { capacity: CableCapacity::Amps13, low: 2200, high: 2700 },
                PpBand { capacity: CableCapacity::Amps20, low: 1400, high: 1900 },
                PpBand { capacity: CableCapacity::Amps32, low: 500, high: 1000 },
                PpBand { capacity: CableCapacity::Amps63, low: 200, high: 499 },
            ],

            contactor: ContactorPolarity::default(),

            ventilation: VentilationPolicy::Fault,
            metering: MeterLimits::default(),
        }
    }
}

/// Highest count a 12-bit converter can return.
const ADC_FULL_SCALE: u16 = 4095;

impl EvseConfig {
    /// Ticks to wait after commanding the contactor before checking feedback.
    pub fn settle_ticks(&self) -> u64 {
        u64::from(self.contactor_settle_ms.div_ceil(self.tick_interval_ms.max(1)))
    }

    /// Reject values that would make the handshake unsafe or ambiguous.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(6..=80).contains(&self.evse_limit_amps) {
            return Err(ConfigError::ValidationFailed("evse_limit_amps must be 6..=80"));
        }

        if self.tick_interval_ms == 0 || self.tick_interval_ms > 1000 {
            return Err(ConfigError::ValidationFailed("tick_interval_ms must be 1..=1000"));
        }
        if self.display_interval_ms < self.tick_interval_ms || self.display_interval_ms > 10_000 {
            return Err(ConfigError::ValidationFailed(
                "display_interval_ms must be tick_interval_ms..=10000",
            ));
        }
        if self.contactor_settle_ms == 0 || self.contactor_settle_ms > 1000 {
            return Err(ConfigError::ValidationFailed("contactor_settle_ms must be 1..=1000"));
        }

        let t = &self.cp_thresholds;
        if !(t.a_min <= ADC_FULL_SCALE && t.a_min > t.b_min && t.b_min > t.c_min && t.c_min > t.d_min)
        {
            return Err(ConfigError::ValidationFailed("cp_thresholds must strictly descend"));
        }

        for (i, band) in self.pp_bands.iter().enumerate() {
            if band.capacity == CableCapacity::Unknown {
                return Err(ConfigError::ValidationFailed("pp_bands entry has no capacity"));
            }
            if band.low > band.high || band.high > ADC_FULL_SCALE {
                return Err(ConfigError::ValidationFailed("pp_bands entry is empty"));
            }
            for other in &self.pp_bands[i + 1..] {
                if band.low <= other.high && other.low <= band.high {
                    return Err(ConfigError::ValidationFailed("pp_bands overlap"));
                }
            }
        }

        let m = &self.metering;
        if m.overcurrent_margin_pct > 100 {
            return Err(ConfigError::ValidationFailed("overcurrent_margin_pct must be <= 100"));
        }
        if !(m.undervoltage_v > 0.0 && m.undervoltage_v < m.overvoltage_v) {
            return Err(ConfigError::ValidationFailed("undervoltage_v must be below overvoltage_v"));
        }

        Ok(())
    }

    /// Parse and validate a JSON document (simulator, provisioning).
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|_| ConfigError::Corrupted)?;
        config.validate()?;
        Ok(config)
    }

    /// Encode as a compact postcard blob for calibration storage.
    pub fn to_blob(&self) -> Result<Vec<u8>, ConfigError> {
        postcard::to_allocvec(self).map_err(|_| ConfigError::Corrupted)
    }

    /// Decode and validate a postcard blob.
    pub fn from_blob(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = postcard::from_bytes(bytes).map_err(|_| ConfigError::Corrupted)?;
        config.validate()?;
        Ok(config)
    }
}
