//! AC EVSE control core.
//!
//! Runs the IEC 61851-1 Mode 3 / GB/T pilot handshake: decodes the Control
//! Pilot and Proximity Pilot lines, advertises the permitted current,
//! switches the contactor only after verifying it, and latches faults
//! until the vehicle is unplugged with the contacts confirmed open.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                     Adapters (outer ring)                     │
//! │   HardwareAdapter (Pilot+Contactor+Meter)    LogEventSink     │
//! │                                                               │
//! │   ─────────────── Port Trait Boundary ───────────────         │
//! │                                                               │
//! │  ┌─────────────────────────────────────────────────────┐      │
//! │  │             EvseService (pure logic)                │      │
//! │  │   FSM · FaultRegistry · Pilot decoding · Contactor  │      │
//! │  └─────────────────────────────────────────────────────┘      │
//! │                                                               │
//! │   TickScheduler (1 ms ISR flags) · SharedStatus (display)     │
//! └───────────────────────────────────────────────────────────────┘
//! ```

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod fault;
pub mod fsm;
pub mod pins;
pub mod scheduler;
pub mod signals;
pub mod status;
