//! Peripheral assignments for the EVSE main board.
//!
//! Every board adapter references this module rather than hard-coding
//! channel numbers.  Port/pin pairs are informational on the host (the
//! adapter logs them at bring-up); the MCU bring-up code maps them onto
//! its own GPIO handles.

use crate::app::ports::AdcChannel;

/// GPIO port letter and pin number, e.g. `('A', 6)` for PA6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardPin {
    pub port: char,
    pub pin: u8,
}

impl BoardPin {
    pub const fn new(port: char, pin: u8) -> Self {
        Self { port, pin }
    }
}

impl core::fmt::Display for BoardPin {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "P{}{}", self.port, self.pin)
    }
}

// ---------------------------------------------------------------------------
// Control Pilot
// ---------------------------------------------------------------------------

/// Advanced-timer channel driving the ±12 V CP oscillator.
pub const CP_PWM_PIN: BoardPin = BoardPin::new('A', 6);
/// The PWM carrier is fixed at 1 kHz.
pub const CP_PWM_FREQ_HZ: u32 = 1000;
/// CP sense divider, sampled at the PWM high phase.
pub const CP_ADC_CHANNEL: AdcChannel = AdcChannel(1);
pub const CP_ADC_PIN: BoardPin = BoardPin::new('A', 1);

// ---------------------------------------------------------------------------
// Proximity Pilot
// ---------------------------------------------------------------------------

/// PP divider against the cable's coding resistor.
pub const PP_ADC_CHANNEL: AdcChannel = AdcChannel(2);
pub const PP_ADC_PIN: BoardPin = BoardPin::new('A', 4);

// ---------------------------------------------------------------------------
// Contactor
// ---------------------------------------------------------------------------

/// Coil driver transistor.
pub const CONTACTOR_COIL_PIN: BoardPin = BoardPin::new('B', 0);
/// Auxiliary (mirror) contact, pulled up.
pub const CONTACTOR_AUX_PIN: BoardPin = BoardPin::new('B', 1);
