//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing each [`EvseEvent`] as one line to
//! the `log` facade (debug UART on the board, stdout in the simulator).
//! A display or telemetry adapter would implement the same trait.

use log::{error, info, warn};

use crate::app::events::EvseEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`EvseEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink {
    emitted: u32,
}

impl LogEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events written since construction.
    pub fn emitted(&self) -> u32 {
        self.emitted
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &EvseEvent) {
        self.emitted = self.emitted.wrapping_add(1);
        match event {
            EvseEvent::Started(state) => {
                info!("START | initial_state={:?}", state);
            }
            EvseEvent::StateChanged { from, to } => {
                info!("STATE | {:?} -> {:?}", from, to);
            }
            EvseEvent::VehicleDetected {
                cable,
                max_current_amps,
            } => {
                info!("VEHICLE | cable={:?} | max={}A", cable, max_current_amps);
            }
            EvseEvent::ContactorCommanded(intent) => {
                info!("CONTACTOR | commanded {:?}", intent);
            }
            EvseEvent::ContactorVerified(intent) => {
                info!("CONTACTOR | verified {:?}", intent);
            }
            EvseEvent::FaultLatched(code) => {
                error!("FAULT | latched {} ({:?})", code, code.severity());
            }
            EvseEvent::FaultCleared(code) => {
                info!("FAULT | cleared {}", code);
            }
            EvseEvent::TransientFault(code) => {
                warn!("FAULT | transient {}", code);
            }
        }
    }
}
