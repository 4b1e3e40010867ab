//! Shared mutable context threaded through every FSM handler.
//!
//! `FsmContext` is the single struct that state handlers read from and
//! write to.  It holds the signals sampled at the start of the tick, the
//! output commands the service applies after the tick, the fault
//! registry, session data, and the events produced along the way.

use heapless::Vec;
use log::warn;

use crate::app::events::EvseEvent;
use crate::app::ports::AcReading;
use crate::config::EvseConfig;
use crate::drivers::contactor::{ContactorIntent, ContactorPhysical};
use crate::fault::FaultRegistry;
use crate::signals::{CableCapacity, CpState};

use super::ChargeState;

/// Events a single tick may queue before the service drains them.
pub const EVENT_QUEUE_CAP: usize = 8;

// ---------------------------------------------------------------------------
// Signal snapshot (read-only to state handlers; written by the service)
// ---------------------------------------------------------------------------

/// Everything sampled at the start of one tick.
#[derive(Debug, Clone, Copy)]
pub struct SignalSnapshot {
    pub cp: CpState,
    /// Cable identification; `None` when PP was not probed this tick.
    pub pp: Option<CableCapacity>,
    pub feedback: ContactorPhysical,
    /// Fresh meter packet, if one arrived.
    pub meter: Option<AcReading>,
}

impl Default for SignalSnapshot {
    fn default() -> Self {
        Self {
            cp: CpState::A12V,
            pp: None,
            feedback: ContactorPhysical::Open,
            meter: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Output commands (written by state handlers; applied by the service)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputCommands {
    /// Current offered on CP (0 = constant +12 V, no offer).
    pub advertised_amps: u8,
    pub contactor: ContactorIntent,
}

impl OutputCommands {
    /// No offer, contactor open.
    pub const fn safe() -> Self {
        Self {
            advertised_amps: 0,
            contactor: ContactorIntent::Open,
        }
    }
}

impl Default for OutputCommands {
    fn default() -> Self {
        Self::safe()
    }
}

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

pub struct FsmContext {
    // -- Timing --
    /// Monotonic total tick count.
    pub total_ticks: u64,

    // -- Inputs --
    pub signals: SignalSnapshot,

    // -- Outputs --
    pub commands: OutputCommands,

    // -- Configuration --
    pub config: EvseConfig,

    // -- Faults --
    pub faults: FaultRegistry,

    // -- Session --
    /// min(cable rating, station limit), fixed at vehicle detection.
    pub max_current_amps: u8,
    /// Tick at which a pending contactor change is verified.
    pub deadline_tick: u64,
    /// Where `Stopping` goes once the contactor is confirmed open.
    pub stop_target: ChargeState,

    // -- Events --
    pub events: Vec<EvseEvent, EVENT_QUEUE_CAP>,
}

impl FsmContext {
    pub fn new(config: EvseConfig) -> Self {
        Self {
            total_ticks: 0,
            signals: SignalSnapshot::default(),
            commands: OutputCommands::safe(),
            config,
            faults: FaultRegistry::new(),
            max_current_amps: 0,
            deadline_tick: 0,
            stop_target: ChargeState::Idle,
            events: Vec::new(),
        }
    }

    /// Queue an event for the sink.  Dropped (with a warning) when full.
    pub fn emit(&mut self, event: EvseEvent) {
        if self.events.push(event).is_err() {
            warn!("Event queue full, dropping {:?}", event);
        }
    }

    /// Start the settle timer for a contactor command issued this tick.
    pub fn arm_deadline(&mut self) {
        self.deadline_tick = self.total_ticks + self.config.settle_ticks();
    }

    pub fn deadline_reached(&self) -> bool {
        self.total_ticks >= self.deadline_tick
    }

    /// Command the contactor and queue the matching event.
    pub fn command_contactor(&mut self, intent: ContactorIntent) {
        if self.commands.contactor != intent {
            self.emit(EvseEvent::ContactorCommanded(intent));
        }
        self.commands.contactor = intent;
    }
}
