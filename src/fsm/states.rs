//! Concrete state handler functions and table builder.
//!
//! Each state is defined by plain `fn` pointers: no closures, no
//! dynamic dispatch, no heap.
//!
//! ```text
//!  INIT ─▶ IDLE ─[B]─▶ CONNECTED ─[C]─▶ CHARGE_REQUESTED ─[closed at deadline]─▶ CHARGING
//!           │                               ▲     │                                │
//!           └──────────────[C]──────────────┘     └──[B / A]─▶ STOPPING ◀─[B / A]──┘
//!
//!  STOPPING ─[open at deadline]─▶ CONNECTED (B) or IDLE (A)
//!  CONNECTED / CHARGING ─[D]─▶ VENTILATION ─▶ FAULT
//!  any ─[CP fault, latched code, contactor mismatch]─▶ FAULT ─[A and open]─▶ IDLE
//! ```

use log::{info, warn};

use super::context::{FsmContext, OutputCommands};
use super::{ChargeState, StateDescriptor};
use crate::app::events::EvseEvent;
use crate::config::VentilationPolicy;
use crate::drivers::contactor::{ContactorIntent, ContactorPhysical};
use crate::error::ErrorCode;
use crate::fault::FaultReporter;
use crate::signals::CpState;

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; ChargeState::COUNT] {
    [
        StateDescriptor {
            id: ChargeState::Init,
            name: "Init",
            on_enter: Some(init_enter),
            on_exit: None,
            on_update: init_update,
        },
        StateDescriptor {
            id: ChargeState::Idle,
            name: "Idle",
            on_enter: Some(idle_enter),
            on_exit: None,
            on_update: idle_update,
        },
        StateDescriptor {
            id: ChargeState::Connected,
            name: "Connected",
            on_enter: Some(connected_enter),
            on_exit: None,
            on_update: connected_update,
        },
        StateDescriptor {
            id: ChargeState::ChargeRequested,
            name: "ChargeRequested",
            on_enter: Some(charge_requested_enter),
            on_exit: None,
            on_update: charge_requested_update,
        },
        StateDescriptor {
            id: ChargeState::Charging,
            name: "Charging",
            on_enter: Some(charging_enter),
            on_exit: Some(charging_exit),
            on_update: charging_update,
        },
        StateDescriptor {
            id: ChargeState::Stopping,
            name: "Stopping",
            on_enter: Some(stopping_enter),
            on_exit: None,
            on_update: stopping_update,
        },
        StateDescriptor {
            id: ChargeState::Ventilation,
            name: "Ventilation",
            on_enter: Some(ventilation_enter),
            on_exit: None,
            on_update: ventilation_update,
        },
        StateDescriptor {
            id: ChargeState::Fault,
            name: "Fault",
            on_enter: Some(fault_enter),
            on_exit: Some(fault_exit),
            on_update: fault_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  Shared guards
// ═══════════════════════════════════════════════════════════════════════════

/// C, or D when the site provides ventilation.
fn charge_requested(ctx: &FsmContext) -> bool {
    match ctx.signals.cp {
        CpState::C6V => true,
        CpState::D3V => ctx.config.ventilation == VentilationPolicy::TreatAsCharge,
        _ => false,
    }
}

/// D without ventilation support.
fn ventilation_refused(ctx: &FsmContext) -> bool {
    ctx.signals.cp == CpState::D3V && ctx.config.ventilation == VentilationPolicy::Fault
}

/// Report a contactor that disagrees with its command.
fn contactor_mismatch(ctx: &mut FsmContext, expected: ContactorPhysical) -> Option<ChargeState> {
    warn!(
        "Contactor feedback {:?}, expected {:?}",
        ctx.signals.feedback, expected
    );
    ctx.faults.report(ErrorCode::ContactorFault, "charge_fsm", line!());
    ctx.command_contactor(ContactorIntent::Open);
    Some(ChargeState::Fault)
}

// ═══════════════════════════════════════════════════════════════════════════
//  INIT: outputs safe until the service declares bring-up complete
// ═══════════════════════════════════════════════════════════════════════════

fn init_enter(ctx: &mut FsmContext) {
    ctx.commands = OutputCommands::safe();
}

fn init_update(_ctx: &mut FsmContext) -> Option<ChargeState> {
    Some(ChargeState::Idle)
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE: no vehicle, no offer
// ═══════════════════════════════════════════════════════════════════════════

fn idle_enter(ctx: &mut FsmContext) {
    ctx.commands = OutputCommands::safe();
    ctx.max_current_amps = 0;
    ctx.stop_target = ChargeState::Idle;
    info!("IDLE: waiting for vehicle");
}

fn idle_update(ctx: &mut FsmContext) -> Option<ChargeState> {
    if ctx.signals.cp == CpState::Fault {
        return Some(ChargeState::Fault);
    }
    if ctx.signals.feedback != ContactorPhysical::Open {
        return contactor_mismatch(ctx, ContactorPhysical::Open);
    }
    if !ctx.signals.cp.vehicle_present() {
        return None;
    }

    // PP is probed by the service whenever a vehicle appears in Idle.
    let cable = ctx.signals.pp?;
    let Some(cable_amps) = cable.amps() else {
        // The PP interpreter has normally reported this already.
        if ctx.faults.last() != ErrorCode::PpResistanceInvalid {
            ctx.faults.report(ErrorCode::PpResistanceInvalid, "charge_fsm", line!());
        }
        return Some(ChargeState::Fault);
    };

    if ventilation_refused(ctx) {
        warn!("IDLE: vehicle requests ventilation, not supported");
        ctx.faults.report(ErrorCode::StateInvalid, "charge_fsm", line!());
        return Some(ChargeState::Fault);
    }

    let max = cable_amps.min(ctx.config.evse_limit_amps);
    ctx.max_current_amps = max;
    ctx.commands.advertised_amps = max;
    ctx.emit(EvseEvent::VehicleDetected {
        cable,
        max_current_amps: max,
    });
    info!("IDLE: vehicle detected, cable {:?}, offering {} A", cable, max);

    if charge_requested(ctx) {
        Some(ChargeState::ChargeRequested)
    } else {
        Some(ChargeState::Connected)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  CONNECTED: offer on CP, vehicle not yet asking
// ═══════════════════════════════════════════════════════════════════════════

fn connected_enter(ctx: &mut FsmContext) {
    ctx.commands.contactor = ContactorIntent::Open;
    ctx.commands.advertised_amps = ctx.max_current_amps;
    info!("CONNECTED: offering {} A", ctx.max_current_amps);
}

fn connected_update(ctx: &mut FsmContext) -> Option<ChargeState> {
    if ctx.signals.cp == CpState::Fault {
        return Some(ChargeState::Fault);
    }
    if ctx.signals.feedback != ContactorPhysical::Open {
        return contactor_mismatch(ctx, ContactorPhysical::Open);
    }

    match ctx.signals.cp {
        CpState::A12V => Some(ChargeState::Idle),
        _ if ventilation_refused(ctx) => Some(ChargeState::Ventilation),
        _ if charge_requested(ctx) => Some(ChargeState::ChargeRequested),
        _ => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  CHARGE_REQUESTED: contactor commanded closed, waiting to verify
// ═══════════════════════════════════════════════════════════════════════════

fn charge_requested_enter(ctx: &mut FsmContext) {
    ctx.command_contactor(ContactorIntent::Closed);
    ctx.arm_deadline();
    info!(
        "CHARGE_REQUESTED: closing contactor, verify at tick {}",
        ctx.deadline_tick
    );
}

fn charge_requested_update(ctx: &mut FsmContext) -> Option<ChargeState> {
    if ctx.signals.cp == CpState::Fault {
        return Some(ChargeState::Fault);
    }

    match ctx.signals.cp {
        CpState::A12V => {
            ctx.stop_target = ChargeState::Idle;
            return Some(ChargeState::Stopping);
        }
        CpState::B9V => {
            ctx.stop_target = ChargeState::Connected;
            return Some(ChargeState::Stopping);
        }
        _ if ventilation_refused(ctx) => return Some(ChargeState::Ventilation),
        _ => {}
    }

    if !ctx.deadline_reached() {
        return None;
    }
    if ctx.signals.feedback == ContactorPhysical::Closed {
        ctx.emit(EvseEvent::ContactorVerified(ContactorIntent::Closed));
        Some(ChargeState::Charging)
    } else {
        contactor_mismatch(ctx, ContactorPhysical::Closed)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  CHARGING: contactor closed and verified
// ═══════════════════════════════════════════════════════════════════════════

fn charging_enter(ctx: &mut FsmContext) {
    info!("CHARGING: {} A offered", ctx.max_current_amps);
}

fn charging_exit(_ctx: &mut FsmContext) {
    info!("CHARGING: session ended");
}

fn charging_update(ctx: &mut FsmContext) -> Option<ChargeState> {
    if ctx.signals.cp == CpState::Fault {
        return Some(ChargeState::Fault);
    }

    match ctx.signals.cp {
        CpState::A12V => {
            ctx.stop_target = ChargeState::Idle;
            return Some(ChargeState::Stopping);
        }
        CpState::B9V => {
            ctx.stop_target = ChargeState::Connected;
            return Some(ChargeState::Stopping);
        }
        _ if ventilation_refused(ctx) => return Some(ChargeState::Ventilation),
        _ => {}
    }

    if ctx.signals.feedback != ContactorPhysical::Closed {
        return contactor_mismatch(ctx, ContactorPhysical::Closed);
    }

    check_supply(ctx)
}

/// Compare a fresh meter packet against the supply limits.
fn check_supply(ctx: &mut FsmContext) -> Option<ChargeState> {
    let reading = ctx.signals.meter?;
    let limits = ctx.config.metering;

    let max_a = f32::from(ctx.max_current_amps) * (100.0 + f32::from(limits.overcurrent_margin_pct)) / 100.0;
    let code = if reading.current_a > max_a {
        warn!("CHARGING: drawing {:.1} A, limit {:.1} A", reading.current_a, max_a);
        ErrorCode::Overcurrent
    } else if reading.voltage_v > limits.overvoltage_v {
        warn!("CHARGING: supply at {:.1} V", reading.voltage_v);
        ErrorCode::Overvoltage
    } else if reading.voltage_v < limits.undervoltage_v {
        warn!("CHARGING: supply at {:.1} V", reading.voltage_v);
        ErrorCode::Undervoltage
    } else {
        return None;
    };

    ctx.faults.report(code, "charge_fsm", line!());
    Some(ChargeState::Fault)
}

// ═══════════════════════════════════════════════════════════════════════════
//  STOPPING: contactor commanded open, waiting to verify
// ═══════════════════════════════════════════════════════════════════════════

fn stopping_enter(ctx: &mut FsmContext) {
    ctx.command_contactor(ContactorIntent::Open);
    ctx.arm_deadline();
    info!(
        "STOPPING: opening contactor, then {:?}",
        ctx.stop_target
    );
}

fn stopping_update(ctx: &mut FsmContext) -> Option<ChargeState> {
    if ctx.signals.cp == CpState::Fault {
        return Some(ChargeState::Fault);
    }
    if ctx.signals.cp == CpState::A12V {
        ctx.stop_target = ChargeState::Idle;
    }

    if !ctx.deadline_reached() {
        return None;
    }
    if ctx.signals.feedback == ContactorPhysical::Open {
        ctx.emit(EvseEvent::ContactorVerified(ContactorIntent::Open));
        Some(ctx.stop_target)
    } else {
        contactor_mismatch(ctx, ContactorPhysical::Open)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  VENTILATION: vehicle asked for D on a site without ventilation
// ═══════════════════════════════════════════════════════════════════════════

fn ventilation_enter(ctx: &mut FsmContext) {
    ctx.command_contactor(ContactorIntent::Open);
    ctx.commands.advertised_amps = 0;
    warn!("VENTILATION: requested by vehicle, not supported here");
}

fn ventilation_update(ctx: &mut FsmContext) -> Option<ChargeState> {
    if ctx.signals.cp != CpState::Fault {
        ctx.faults.report(ErrorCode::StateInvalid, "charge_fsm", line!());
    }
    Some(ChargeState::Fault)
}

// ═══════════════════════════════════════════════════════════════════════════
//  FAULT: outputs safe until unplug with the contactor confirmed open
// ═══════════════════════════════════════════════════════════════════════════

fn fault_enter(ctx: &mut FsmContext) {
    ctx.command_contactor(ContactorIntent::Open);
    ctx.commands.advertised_amps = 0;
    ctx.max_current_amps = 0;
    let code = ctx.faults.last();
    ctx.emit(EvseEvent::FaultLatched(code));
    warn!("FAULT: outputs disabled, latched {:?}", code);
}

fn fault_exit(_ctx: &mut FsmContext) {
    info!("FAULT: cleared, resuming");
}

fn fault_update(ctx: &mut FsmContext) -> Option<ChargeState> {
    ctx.commands = OutputCommands::safe();

    let record = ctx.faults.record();
    let code = ctx.faults.last();
    if !code.is_recoverable() {
        return None;
    }
    // A code reported during this tick has not been seen by anyone yet.
    if record.is_some_and(|r| r.tick >= ctx.total_ticks) {
        return None;
    }

    if ctx.signals.cp == CpState::A12V && ctx.signals.feedback == ContactorPhysical::Open {
        ctx.faults.clear();
        ctx.emit(EvseEvent::FaultCleared(code));
        info!("FAULT: {:?} cleared after unplug", code);
        return Some(ChargeState::Idle);
    }

    None
}
