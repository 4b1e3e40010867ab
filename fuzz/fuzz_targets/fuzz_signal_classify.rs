//! Fuzz target: pilot classification against arbitrary calibrations.
//!
//! Any raw sample and any threshold set must classify without panicking;
//! whenever the thresholds pass validation, a sample below `d_min` must
//! decode as `Fault`.  PP classification must always return the band that
//! contains the mean, or `Unknown`.
//!
//! cargo fuzz run fuzz_signal_classify

#![no_main]

use acevse::config::{CpThresholds, EvseConfig};
use acevse::signals::control_pilot::{self, CpState, duty_for_current};
use acevse::signals::proximity::{self, CableCapacity};
use libfuzzer_sys::fuzz_target;

fn word(data: &[u8], i: usize) -> u16 {
    let lo = data.get(2 * i).copied().unwrap_or(0);
    let hi = data.get(2 * i + 1).copied().unwrap_or(0);
    u16::from_le_bytes([lo, hi])
}

fuzz_target!(|data: &[u8]| {
    let sample = word(data, 0) & 0x0FFF;
    let thresholds = CpThresholds {
        a_min: word(data, 1),
        b_min: word(data, 2),
        c_min: word(data, 3),
        d_min: word(data, 4),
    };

    let state = control_pilot::classify(sample, &thresholds);
    let config = EvseConfig {
        cp_thresholds: thresholds,
        ..EvseConfig::default()
    };
    if config.validate().is_ok() && sample < thresholds.d_min {
        assert_eq!(state, CpState::Fault);
    }

    let bands = EvseConfig::default().pp_bands;
    let class = proximity::classify(sample, &bands);
    if class != CableCapacity::Unknown {
        assert!(bands.iter().any(|b| b.capacity == class && b.contains(sample)));
    }

    let amps = data.first().copied().unwrap_or(0);
    let duty = duty_for_current(amps);
    assert!(duty == 100 || (5..=96).contains(&duty));
});
