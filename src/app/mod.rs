//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the orchestration of the charging handshake:
//! signal acquisition order, persistent-fault enforcement, and applying
//! the state machine's commands.  All interaction with hardware happens
//! through **port traits** defined in [`ports`], keeping this layer fully
//! testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
