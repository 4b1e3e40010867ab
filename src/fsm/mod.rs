//! Charging state machine engine.
//!
//! One row per [`ChargeState`]; the handlers live in [`states`].
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │  StateTable                                                   │
//! │  ┌─────────────────┬──────────┬─────────┬──────────────────┐  │
//! │  │ ChargeState     │ on_enter │ on_exit │ on_update        │  │
//! │  ├─────────────────┼──────────┼─────────┼──────────────────┤  │
//! │  │ Init            │ fn(ctx)  │  -      │ fn(ctx)->Option  │  │
//! │  │ Idle            │ fn(ctx)  │  -      │ fn(ctx)->Option  │  │
//! │  │ Connected       │ fn(ctx)  │  -      │ fn(ctx)->Option  │  │
//! │  │ ChargeRequested │ fn(ctx)  │  -      │ fn(ctx)->Option  │  │
//! │  │ Charging        │ fn(ctx)  │ fn(ctx) │ fn(ctx)->Option  │  │
//! │  │ Stopping        │ fn(ctx)  │  -      │ fn(ctx)->Option  │  │
//! │  │ Ventilation     │ fn(ctx)  │  -      │ fn(ctx)->Option  │  │
//! │  │ Fault           │ fn(ctx)  │ fn(ctx) │ fn(ctx)->Option  │  │
//! │  └─────────────────┴──────────┴─────────┴──────────────────┘  │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every control tick the engine stamps `ctx.total_ticks` (the clock the
//! contactor settle deadlines are measured against) and runs `on_update`
//! of the active charging state against the sampled pilot and feedback
//! signals.  A returned `Some(next)` runs `on_exit`, switches, then runs
//! `on_enter` of `next`, which is where contactor and CP offer commands
//! are written.  The service uses [`Fsm::force_transition`] to drop into
//! `Fault` between ticks.

pub mod context;
pub mod states;

use context::FsmContext;
use log::info;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Position in the CP handshake, from boot to a verified closed contactor.
/// Discriminants index the table built by [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ChargeState {
    Init = 0,
    Idle = 1,
    Connected = 2,
    ChargeRequested = 3,
    Charging = 4,
    /// Contactor commanded open, waiting to verify.
    Stopping = 5,
    Ventilation = 6,
    Fault = 7,
}

impl ChargeState {
    /// Rows in the state table.
    pub const COUNT: usize = 8;

    /// Table index back to a state.  Out-of-range is treated as `Fault`
    /// so a corrupted index can never leave the contactor commanded closed.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Init,
            1 => Self::Idle,
            2 => Self::Connected,
            3 => Self::ChargeRequested,
            4 => Self::Charging,
            5 => Self::Stopping,
            6 => Self::Ventilation,
            7 => Self::Fault,
            _ => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::Fault
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Entry or exit action: writes output commands into the context.
pub type StateActionFn = fn(&mut FsmContext);

/// Per-tick handler: inspects the signal snapshot and returns the next
/// charging state, or `None` to stay.
pub type StateUpdateFn = fn(&mut FsmContext) -> Option<ChargeState>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// One charging state's handlers.
pub struct StateDescriptor {
    pub id: ChargeState,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// Drives the charging handshake table.
pub struct Fsm {
    /// Indexed by `ChargeState as usize`.
    table: [StateDescriptor; ChargeState::COUNT],
    current: usize,
    tick_count: u64,
}

impl Fsm {
    pub fn new(table: [StateDescriptor; ChargeState::COUNT], initial: ChargeState) -> Self {
        Self {
            table,
            current: initial as usize,
            tick_count: 0,
        }
    }

    /// Enter the boot state (outputs safe).  Call once before the first
    /// control tick.
    pub fn start(&mut self, ctx: &mut FsmContext) {
        info!("Charge state machine starting in {}", self.table[self.current].name);
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// One control tick over the signals already in `ctx.signals`.
    pub fn tick(&mut self, ctx: &mut FsmContext) {
        self.tick_count += 1;
        ctx.total_ticks = self.tick_count;

        let next = (self.table[self.current].on_update)(ctx);

        if let Some(next_id) = next {
            self.transition(next_id, ctx);
        }
    }

    /// Leave the current state now: latched faults and operator abort.
    /// A no-op when already in `next`.
    pub fn force_transition(&mut self, next: ChargeState, ctx: &mut FsmContext) {
        if next as usize != self.current {
            self.transition(next, ctx);
        }
    }

    pub fn current_state(&self) -> ChargeState {
        ChargeState::from_index(self.current)
    }

    pub fn total_ticks(&self) -> u64 {
        self.tick_count
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next_id: ChargeState, ctx: &mut FsmContext) {
        let next_idx = next_id as usize;

        info!(
            "Charge state: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        self.current = next_idx;

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}
