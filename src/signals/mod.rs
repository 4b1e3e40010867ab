//! Pilot-line interpreters.
//!
//! Both lines are sampled through [`AdcPort`](crate::app::ports::AdcPort)
//! and classified against static thresholds from
//! [`EvseConfig`](crate::config::EvseConfig).  Interpreters report
//! out-of-range readings to the fault registry and return a sentinel
//! value; they never change the charging state themselves.

pub mod control_pilot;
pub mod proximity;

pub use control_pilot::{ControlPilot, CpState};
pub use proximity::{CableCapacity, ProximityPilot};
