//! Actuator drivers.

pub mod contactor;
