//! Outbound application events.
//!
//! State handlers queue these in the FSM context; the
//! [`EvseService`](super::service::EvseService) drains them through the
//! [`EventSink`](super::ports::EventSink) port after every tick.

use crate::drivers::contactor::ContactorIntent;
use crate::error::ErrorCode;
use crate::fsm::ChargeState;
use crate::signals::CableCapacity;

/// Structured events emitted by the charging core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EvseEvent {
    /// The service has started (carries the first operational state).
    Started(ChargeState),

    /// The state machine moved.
    StateChanged { from: ChargeState, to: ChargeState },

    /// A vehicle answered on CP and its cable was identified.
    VehicleDetected {
        cable: CableCapacity,
        max_current_amps: u8,
    },

    /// The contactor was commanded; verification follows at the deadline.
    ContactorCommanded(ContactorIntent),

    /// Feedback confirmed the commanded position.
    ContactorVerified(ContactorIntent),

    /// Entered `Fault` with this code latched.
    FaultLatched(ErrorCode),

    /// Recovery cleared this code.
    FaultCleared(ErrorCode),

    /// Non-latching collaborator error (meter link, buffers).
    TransientFault(ErrorCode),
}
