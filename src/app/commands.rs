//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (operator
//! panel, provisioning, load management) that the
//! [`EvseService`](super::service::EvseService) interprets and acts upon.

use crate::config::EvseConfig;

/// Commands that external adapters can send into the charging core.
#[derive(Debug, Clone)]
pub enum EvseCommand {
    /// Change the station current limit (A).  Takes effect on the next
    /// vehicle detection; a session in progress keeps its offer.
    SetCurrentLimit(u8),

    /// Hot-reload configuration.  Rejected if validation fails.
    UpdateConfig(EvseConfig),

    /// Stop immediately: latch a fault and open the contactor.
    Abort,
}
