//! Fault latching and recovery through the service.
//!
//! Every latched fault must open the contactor and drop the offer to 0 A,
//! and only an unplug with the contacts confirmed open may clear it.

use acevse::app::commands::EvseCommand;
use acevse::app::events::EvseEvent;
use acevse::drivers::contactor::{ContactorIntent, ContactorPhysical};
use acevse::error::{ErrorCode, MeterError};
use acevse::fsm::ChargeState;
use acevse::signals::{CableCapacity, CpState};

use crate::mock_hw::{charging, run, started};

// ── Contactor supervision ─────────────────────────────────────

#[test]
fn stuck_open_contactor_faults_and_leaves_intent_open() {
    let (mut svc, mut hw, mut sink) = started();
    hw.feedback_override = Some(ContactorPhysical::Open);
    hw.cp = CpState::B9V;
    run(&mut svc, &mut hw, &mut sink, 1);
    hw.cp = CpState::C6V;
    run(&mut svc, &mut hw, &mut sink, 10);

    assert_eq!(svc.current_state(), ChargeState::Fault);
    assert_eq!(svc.last_fault(), ErrorCode::ContactorFault);
    assert_eq!(hw.contactor_intent(), ContactorIntent::Open);
    assert_eq!(hw.advertised(), Some(0));
    assert!(sink.contains(&EvseEvent::FaultLatched(ErrorCode::ContactorFault)));
}

#[test]
fn contacts_dropping_out_while_charging_fault() {
    let (mut svc, mut hw, mut sink) = charging();
    hw.feedback_override = Some(ContactorPhysical::Open);
    run(&mut svc, &mut hw, &mut sink, 1);
    assert_eq!(svc.current_state(), ChargeState::Fault);
    assert_eq!(svc.last_fault(), ErrorCode::ContactorFault);
}

#[test]
fn welded_contactor_detected_in_idle() {
    let (mut svc, mut hw, mut sink) = started();
    hw.feedback_override = Some(ContactorPhysical::Closed);
    run(&mut svc, &mut hw, &mut sink, 1);
    assert_eq!(svc.current_state(), ChargeState::Fault);
    assert_eq!(svc.last_fault(), ErrorCode::ContactorFault);
}

#[test]
fn weld_on_stop_faults_at_open_deadline() {
    let (mut svc, mut hw, mut sink) = charging();
    hw.feedback_override = Some(ContactorPhysical::Closed);
    hw.cp = CpState::B9V;
    run(&mut svc, &mut hw, &mut sink, 1);
    assert_eq!(svc.current_state(), ChargeState::Stopping);
    run(&mut svc, &mut hw, &mut sink, 10);
    assert_eq!(svc.current_state(), ChargeState::Fault);
    assert_eq!(svc.last_fault(), ErrorCode::ContactorFault);
}

#[test]
fn fault_with_cp_a_but_feedback_closed_stays_latched() {
    let (mut svc, mut hw, mut sink) = started();
    hw.feedback_override = Some(ContactorPhysical::Closed);
    run(&mut svc, &mut hw, &mut sink, 1);
    assert_eq!(svc.current_state(), ChargeState::Fault);

    hw.cp = CpState::A12V;
    run(&mut svc, &mut hw, &mut sink, 50);
    assert_eq!(svc.current_state(), ChargeState::Fault);
    assert_eq!(svc.last_fault(), ErrorCode::ContactorFault);

    // Contacts freed: the same unplugged vehicle now clears it.
    hw.feedback_override = None;
    run(&mut svc, &mut hw, &mut sink, 1);
    assert_eq!(svc.current_state(), ChargeState::Idle);
    assert_eq!(svc.last_fault(), ErrorCode::None);
    assert!(sink.contains(&EvseEvent::FaultCleared(ErrorCode::ContactorFault)));
}

#[test]
fn fault_persists_while_vehicle_stays_plugged() {
    let (mut svc, mut hw, mut sink) = charging();
    hw.feedback_override = Some(ContactorPhysical::Open);
    run(&mut svc, &mut hw, &mut sink, 1);
    hw.feedback_override = None;

    hw.cp = CpState::B9V;
    run(&mut svc, &mut hw, &mut sink, 20);
    assert_eq!(svc.current_state(), ChargeState::Fault);

    hw.cp = CpState::A12V;
    run(&mut svc, &mut hw, &mut sink, 1);
    assert_eq!(svc.current_state(), ChargeState::Idle);
}

// ── Pilot faults ──────────────────────────────────────────────

#[test]
fn pp_band_gap_faults_from_idle() {
    let (mut svc, mut hw, mut sink) = started();
    hw.cable = CableCapacity::Unknown;
    hw.cp = CpState::B9V;
    run(&mut svc, &mut hw, &mut sink, 1);
    assert_eq!(svc.current_state(), ChargeState::Fault);
    assert_eq!(svc.last_fault(), ErrorCode::PpResistanceInvalid);
    assert!(!hw.ever_closed());
}

#[test]
fn cp_below_d_faults_from_any_state() {
    let (mut svc, mut hw, mut sink) = charging();
    hw.cp = CpState::Fault;
    run(&mut svc, &mut hw, &mut sink, 1);
    assert_eq!(svc.current_state(), ChargeState::Fault);
    assert_eq!(svc.last_fault(), ErrorCode::CpVoltageInvalid);
    assert_eq!(hw.contactor_intent(), ContactorIntent::Open);
    assert_eq!(hw.advertised(), Some(0));
}

#[test]
fn cp_fault_recovers_after_pilot_returns_to_a() {
    let (mut svc, mut hw, mut sink) = started();
    hw.cp = CpState::Fault;
    run(&mut svc, &mut hw, &mut sink, 5);
    assert_eq!(svc.current_state(), ChargeState::Fault);

    hw.cp = CpState::A12V;
    run(&mut svc, &mut hw, &mut sink, 1);
    assert_eq!(svc.current_state(), ChargeState::Idle);
}

// ── Supply supervision ────────────────────────────────────────

#[test]
fn overcurrent_while_charging_faults() {
    let (mut svc, mut hw, mut sink) = charging();
    hw.push_reading(230.0, 40.0);
    run(&mut svc, &mut hw, &mut sink, 1);
    assert_eq!(svc.current_state(), ChargeState::Fault);
    assert_eq!(svc.last_fault(), ErrorCode::Overcurrent);
}

#[test]
fn undervoltage_while_charging_faults() {
    let (mut svc, mut hw, mut sink) = charging();
    hw.push_reading(190.0, 16.0);
    run(&mut svc, &mut hw, &mut sink, 1);
    assert_eq!(svc.last_fault(), ErrorCode::Undervoltage);
}

#[test]
fn healthy_supply_keeps_charging() {
    let (mut svc, mut hw, mut sink) = charging();
    for _ in 0..5 {
        hw.push_reading(231.0, 31.5);
    }
    run(&mut svc, &mut hw, &mut sink, 5);
    assert_eq!(svc.current_state(), ChargeState::Charging);
}

#[test]
fn meter_error_is_transient() {
    let (mut svc, mut hw, mut sink) = charging();
    hw.push_meter_error(MeterError::Checksum);
    run(&mut svc, &mut hw, &mut sink, 3);

    assert_eq!(svc.current_state(), ChargeState::Charging);
    assert_eq!(svc.last_fault(), ErrorCode::None);
    assert!(sink.contains(&EvseEvent::TransientFault(ErrorCode::HlwChecksum)));
    assert!(svc.fault_history().any(|r| r.code == ErrorCode::HlwChecksum));
}

// ── External reports and commands ─────────────────────────────

#[test]
fn external_gfci_report_forces_fault_on_next_tick() {
    let (mut svc, mut hw, mut sink) = charging();
    svc.report_fault(ErrorCode::GfciFault, "rcd_monitor", line!());
    assert_eq!(svc.current_state(), ChargeState::Charging);

    run(&mut svc, &mut hw, &mut sink, 1);
    assert_eq!(svc.current_state(), ChargeState::Fault);
    assert_eq!(hw.contactor_intent(), ContactorIntent::Open);
    let record = svc.fault_record().unwrap();
    assert_eq!(record.code, ErrorCode::GfciFault);
    assert_eq!(record.source, "rcd_monitor");
}

#[test]
fn report_while_unplugged_is_not_cleared_in_the_same_tick() {
    let (mut svc, mut hw, mut sink) = started();
    svc.report_fault(ErrorCode::TemperatureHigh, "thermal", line!());

    run(&mut svc, &mut hw, &mut sink, 1);
    assert_eq!(svc.current_state(), ChargeState::Fault);
    assert!(sink.contains(&EvseEvent::FaultLatched(ErrorCode::TemperatureHigh)));

    run(&mut svc, &mut hw, &mut sink, 1);
    assert_eq!(svc.current_state(), ChargeState::Idle);
}

#[test]
fn fatal_init_failure_is_never_recovered() {
    let (mut svc, mut hw, mut sink) = started();
    svc.report_fault(ErrorCode::AdcInitFailed, "bring_up", line!());
    run(&mut svc, &mut hw, &mut sink, 100);
    assert_eq!(svc.current_state(), ChargeState::Fault);
    assert_eq!(svc.last_fault(), ErrorCode::AdcInitFailed);
}

#[test]
fn fatal_init_failure_survives_abort_and_unplug() {
    let (mut svc, mut hw, mut sink) = started();
    svc.report_fault(ErrorCode::AdcInitFailed, "bring_up", line!());
    run(&mut svc, &mut hw, &mut sink, 1);
    assert_eq!(svc.current_state(), ChargeState::Fault);

    svc.handle_command(EvseCommand::Abort, &mut hw, &mut sink)
        .unwrap();
    hw.cp = CpState::A12V;
    hw.feedback_override = Some(ContactorPhysical::Open);
    run(&mut svc, &mut hw, &mut sink, 20);

    assert_eq!(svc.current_state(), ChargeState::Fault);
    assert_eq!(svc.last_fault(), ErrorCode::AdcInitFailed);
    assert_eq!(svc.fault_record().unwrap().source, "bring_up");
    assert!(svc.fault_history().any(|r| r.source == "operator_abort"));
    assert!(!sink.events.iter().any(|e| matches!(e, EvseEvent::FaultCleared(_))));
}

#[test]
fn abort_opens_immediately() {
    let (mut svc, mut hw, mut sink) = charging();
    svc.handle_command(EvseCommand::Abort, &mut hw, &mut sink)
        .unwrap();

    assert_eq!(svc.current_state(), ChargeState::Fault);
    assert_eq!(hw.contactor_intent(), ContactorIntent::Open);
    assert_eq!(hw.advertised(), Some(0));
    assert_eq!(svc.fault_record().unwrap().source, "operator_abort");
    assert!(sink.contains(&EvseEvent::StateChanged {
        from: ChargeState::Charging,
        to: ChargeState::Fault,
    }));
}

#[test]
fn status_snapshot_tracks_fault() {
    let (mut svc, mut hw, mut sink) = charging();
    hw.cp = CpState::Fault;
    run(&mut svc, &mut hw, &mut sink, 1);

    let status = acevse::status::SharedStatus::new();
    svc.publish(&status);
    let snap = status.get();
    assert_eq!(snap.state, ChargeState::Fault);
    assert_eq!(snap.last_fault, ErrorCode::CpVoltageInvalid);
    assert_eq!(snap.contactor, ContactorIntent::Open);
    assert_eq!(snap.duty_percent, 100);
}
