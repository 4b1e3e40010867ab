//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements      | Connects to                      |
//! |------------|-----------------|----------------------------------|
//! | `hardware` | PilotPort       | ADC, CP PWM                      |
//! |            | ContactorPort   | Coil driver, auxiliary contact   |
//! |            | MeterPort       | Energy meter                     |
//! | `log_sink` | EventSink       | Serial log output                |
//! | `sim`      | AdcPort, MeterPort, embedded-hal pins | Host bench |

pub mod hardware;
pub mod log_sink;
#[cfg(not(target_os = "none"))]
pub mod sim;
