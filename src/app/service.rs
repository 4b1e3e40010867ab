//! Application service: the hexagonal core.
//!
//! [`EvseService`] owns the FSM, the fault registry (inside the context)
//! and the session data.  All I/O flows through port traits injected at
//! call sites, making the whole handshake testable with mock adapters.
//!
//! ```text
//!  PilotPort ─────▶ ┌────────────────────────┐ ──▶ EventSink
//!  MeterPort ─────▶ │       EvseService       │
//! ContactorPort ◀──▶│  Faults · FSM · Outputs │ ──▶ SharedStatus
//!                   └────────────────────────┘
//! ```
//!
//! One tick, in order: meter → CP → contactor feedback → PP (only on a
//! new vehicle in Idle) → persistent-fault check → FSM → PWM and contactor
//! commands → events.

use log::{info, warn};

use crate::config::EvseConfig;
use crate::drivers::contactor::ContactorIntent;
use crate::error::{ConfigError, ErrorCode};
use crate::fault::{FaultRecord, FaultReporter};
use crate::fsm::context::{FsmContext, SignalSnapshot};
use crate::fsm::states::build_state_table;
use crate::fsm::{ChargeState, Fsm};
use crate::signals::control_pilot::duty_for_current;
use crate::status::{SharedStatus, StatusSnapshot};

use super::commands::EvseCommand;
use super::events::EvseEvent;
use super::ports::{ContactorPort, EventSink, MeterPort, PilotPort};

// ───────────────────────────────────────────────────────────────
// EvseService
// ───────────────────────────────────────────────────────────────

pub struct EvseService {
    fsm: Fsm,
    ctx: FsmContext,
}

impl EvseService {
    /// Construct the service from a validated configuration.
    ///
    /// The FSM sits in `Init` until [`start`](Self::start).
    pub fn new(config: EvseConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut ctx = FsmContext::new(config);
        // Reports made before the first tick belong to tick 1.
        ctx.faults.set_tick(1);
        Ok(Self {
            fsm: Fsm::new(build_state_table(), ChargeState::Init),
            ctx,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Bring-up complete: drive outputs safe and enter `Idle`.
    ///
    /// A fault reported during bring-up (see [`report_fault`](Self::report_fault))
    /// is enforced on the first tick.
    pub fn start(&mut self, hw: &mut (impl PilotPort + ContactorPort), sink: &mut impl EventSink) {
        self.fsm.start(&mut self.ctx);
        self.fsm.force_transition(ChargeState::Idle, &mut self.ctx);
        self.apply_outputs(hw);
        self.drain_events(sink);
        sink.emit(&EvseEvent::Started(self.fsm.current_state()));
        info!("EvseService started in {:?}", self.fsm.current_state());
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one full control cycle.
    ///
    /// `hw` satisfies all three hardware ports; taking it once avoids a
    /// double mutable borrow while keeping the port boundary explicit.
    pub fn tick<H>(&mut self, hw: &mut H, sink: &mut impl EventSink)
    where
        H: PilotPort + ContactorPort + MeterPort,
    {
        let prev_state = self.fsm.current_state();

        // 1. Sample inputs
        let meter = match hw.poll() {
            Ok(reading) => reading,
            Err(e) => {
                warn!("Meter: {}", e);
                self.ctx.faults.report(e.code(), "meter", line!());
                self.ctx.emit(EvseEvent::TransientFault(e.code()));
                None
            }
        };
        let cp = hw.read_cp(&mut self.ctx.faults);
        let feedback = hw.read_feedback();
        let pp = if prev_state == ChargeState::Idle && cp.vehicle_present() {
            Some(hw.read_pp(&mut self.ctx.faults))
        } else {
            None
        };
        self.ctx.signals = SignalSnapshot {
            cp,
            pp,
            feedback,
            meter,
        };

        // 2. Persistent-fault check
        let latched = self.ctx.faults.last();
        if !latched.is_none() && prev_state != ChargeState::Fault {
            warn!("Latched {:?} in {:?}, forcing Fault", latched, prev_state);
            self.fsm.force_transition(ChargeState::Fault, &mut self.ctx);
        }

        // 3. State logic
        self.fsm.tick(&mut self.ctx);

        // 4. Outputs
        self.apply_outputs(hw);

        // 5. Events
        self.drain_events(sink);
        let new_state = self.fsm.current_state();
        if new_state != prev_state {
            sink.emit(&EvseEvent::StateChanged {
                from: prev_state,
                to: new_state,
            });
        }

        // Reports arriving between ticks are stamped with the next one.
        self.ctx.faults.set_tick(self.fsm.total_ticks() + 1);
    }

    // ── External inputs ───────────────────────────────────────

    /// Report a fault from outside the handshake (bring-up, RCD, thermal).
    /// Latching codes force `Fault` on the next tick.
    pub fn report_fault(&mut self, code: ErrorCode, source: &'static str, line: u32) {
        self.ctx.faults.report(code, source, line);
        if !code.is_none() && !code.latches() {
            self.ctx.emit(EvseEvent::TransientFault(code));
        }
    }

    /// Process an external command.
    pub fn handle_command(
        &mut self,
        cmd: EvseCommand,
        hw: &mut (impl PilotPort + ContactorPort),
        sink: &mut impl EventSink,
    ) -> Result<(), ConfigError> {
        match cmd {
            EvseCommand::SetCurrentLimit(amps) => {
                let candidate = EvseConfig {
                    evse_limit_amps: amps,
                    ..self.ctx.config.clone()
                };
                candidate.validate()?;
                self.ctx.config = candidate;
                info!("Station limit set to {} A (next session)", amps);
            }
            EvseCommand::UpdateConfig(config) => {
                config.validate()?;
                hw.set_calibration(config.cp_thresholds, config.pp_bands);
                hw.set_polarity(config.contactor);
                self.ctx.config = config;
                info!("Configuration updated at runtime");
            }
            EvseCommand::Abort => {
                let prev = self.fsm.current_state();
                self.ctx.faults.report(ErrorCode::Unknown, "operator_abort", line!());
                self.fsm.force_transition(ChargeState::Fault, &mut self.ctx);
                self.apply_outputs(hw);
                self.drain_events(sink);
                if prev != ChargeState::Fault {
                    sink.emit(&EvseEvent::StateChanged {
                        from: prev,
                        to: ChargeState::Fault,
                    });
                }
            }
        }
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn current_state(&self) -> ChargeState {
        self.fsm.current_state()
    }

    pub fn last_fault(&self) -> ErrorCode {
        self.ctx.faults.last()
    }

    pub fn fault_record(&self) -> Option<FaultRecord> {
        self.ctx.faults.record()
    }

    /// Every report still in the diagnostics window, oldest first.
    pub fn fault_history(&self) -> impl Iterator<Item = &FaultRecord> {
        self.ctx.faults.history()
    }

    pub fn config(&self) -> &EvseConfig {
        &self.ctx.config
    }

    pub fn tick_count(&self) -> u64 {
        self.fsm.total_ticks()
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            state: self.fsm.current_state(),
            last_fault: self.ctx.faults.last(),
            contactor: self.ctx.commands.contactor,
            advertised_amps: self.ctx.commands.advertised_amps,
            duty_percent: duty_for_current(self.ctx.commands.advertised_amps),
        }
    }

    /// Copy the current snapshot into the display slot.
    pub fn publish(&self, status: &SharedStatus) {
        status.publish(self.snapshot());
    }

    // ── Internal ──────────────────────────────────────────────

    /// Translate FSM commands into port calls.  Runs every tick so a
    /// glitched output is re-driven.
    fn apply_outputs(&self, hw: &mut (impl PilotPort + ContactorPort)) {
        let cmds = self.ctx.commands;
        match cmds.contactor {
            ContactorIntent::Open => hw.open(),
            ContactorIntent::Closed => hw.close(),
        }
        hw.advertise(cmds.advertised_amps);
    }

    fn drain_events(&mut self, sink: &mut impl EventSink) {
        for event in &self.ctx.events {
            sink.emit(event);
        }
        self.ctx.events.clear();
    }
}
