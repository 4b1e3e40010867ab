//! Integration tests for the full handshake: EvseService → FSM → ports.
//!
//! A vehicle is simulated by setting the mock's CP state and cable between
//! ticks; assertions are made on the state sequence, the events, and the
//! recorded output calls.

use acevse::app::commands::EvseCommand;
use acevse::app::events::EvseEvent;
use acevse::app::ports::PilotPort;
use acevse::config::{EvseConfig, VentilationPolicy};
use acevse::drivers::contactor::{ContactorIntent, ContactorPhysical};
use acevse::error::ErrorCode;
use acevse::fsm::ChargeState;
use acevse::signals::{CableCapacity, CpState};

use crate::mock_hw::{HwCall, charging, run, started, started_with};

// ── Start-up ──────────────────────────────────────────────────

#[test]
fn start_enters_idle_with_safe_outputs() {
    let (svc, hw, sink) = started();
    assert_eq!(svc.current_state(), ChargeState::Idle);
    assert_eq!(svc.last_fault(), ErrorCode::None);
    assert_eq!(hw.advertised(), Some(0));
    assert_eq!(hw.contactor_intent(), ContactorIntent::Open);
    assert_eq!(sink.events.last(), Some(&EvseEvent::Started(ChargeState::Idle)));
}

#[test]
fn unplugged_station_stays_idle_and_never_probes_pp() {
    let (mut svc, mut hw, mut sink) = started();
    hw.cable = CableCapacity::Unknown;
    run(&mut svc, &mut hw, &mut sink, 50);
    assert_eq!(svc.current_state(), ChargeState::Idle);
    assert_eq!(hw.pp_reads, 0);
    assert_eq!(svc.last_fault(), ErrorCode::None);
}

// ── Full session ──────────────────────────────────────────────

#[test]
fn a_b_c_with_32a_cable_reaches_charging_at_53_percent() {
    let (mut svc, mut hw, mut sink) = started();

    hw.cp = CpState::B9V;
    run(&mut svc, &mut hw, &mut sink, 1);
    assert_eq!(svc.current_state(), ChargeState::Connected);
    assert_eq!(hw.advertised(), Some(32));
    assert!(sink.contains(&EvseEvent::VehicleDetected {
        cable: CableCapacity::Amps32,
        max_current_amps: 32,
    }));

    hw.cp = CpState::C6V;
    run(&mut svc, &mut hw, &mut sink, 1);
    assert_eq!(svc.current_state(), ChargeState::ChargeRequested);
    assert_eq!(hw.contactor_intent(), ContactorIntent::Closed);

    run(&mut svc, &mut hw, &mut sink, 10);
    assert_eq!(svc.current_state(), ChargeState::Charging);
    assert_eq!(
        sink.states(),
        vec![
            ChargeState::Connected,
            ChargeState::ChargeRequested,
            ChargeState::Charging
        ]
    );
    assert_eq!(hw.duty_percent(), 53);
    assert_eq!(svc.snapshot().duty_percent, 53);
    assert!(sink.contains(&EvseEvent::ContactorVerified(ContactorIntent::Closed)));
}

#[test]
fn contactor_is_not_verified_before_settle_deadline() {
    let (mut svc, mut hw, mut sink) = started();
    hw.cp = CpState::C6V;
    // Idle jumps straight to ChargeRequested on C.
    run(&mut svc, &mut hw, &mut sink, 1);
    assert_eq!(svc.current_state(), ChargeState::ChargeRequested);

    // Feedback stuck open would fault at the deadline, not before it.
    hw.feedback_override = Some(ContactorPhysical::Open);
    let settle = svc.config().settle_ticks();
    run(&mut svc, &mut hw, &mut sink, (settle - 1) as u32);
    assert_eq!(svc.current_state(), ChargeState::ChargeRequested);
    run(&mut svc, &mut hw, &mut sink, 1);
    assert_eq!(svc.current_state(), ChargeState::Fault);
}

#[test]
fn vehicle_pause_goes_through_stopping_back_to_connected() {
    let (mut svc, mut hw, mut sink) = charging();

    hw.cp = CpState::B9V;
    run(&mut svc, &mut hw, &mut sink, 1);
    assert_eq!(svc.current_state(), ChargeState::Stopping);
    assert_eq!(hw.contactor_intent(), ContactorIntent::Open);

    run(&mut svc, &mut hw, &mut sink, 10);
    assert_eq!(svc.current_state(), ChargeState::Connected);
    assert_eq!(hw.advertised(), Some(32));
    assert!(sink.contains(&EvseEvent::ContactorVerified(ContactorIntent::Open)));

    // Resume.
    hw.cp = CpState::C6V;
    run(&mut svc, &mut hw, &mut sink, 10);
    assert_eq!(svc.current_state(), ChargeState::Charging);
}

#[test]
fn unplug_while_charging_returns_to_idle() {
    let (mut svc, mut hw, mut sink) = charging();

    hw.cp = CpState::A12V;
    run(&mut svc, &mut hw, &mut sink, 10);
    assert_eq!(svc.current_state(), ChargeState::Idle);
    assert_eq!(hw.advertised(), Some(0));
    assert_eq!(hw.contactor_intent(), ContactorIntent::Open);
    assert_eq!(svc.last_fault(), ErrorCode::None);
}

#[test]
fn unplug_during_stop_retargets_to_idle() {
    let (mut svc, mut hw, mut sink) = charging();

    hw.cp = CpState::B9V;
    run(&mut svc, &mut hw, &mut sink, 1);
    assert_eq!(svc.current_state(), ChargeState::Stopping);
    hw.cp = CpState::A12V;
    run(&mut svc, &mut hw, &mut sink, 10);
    assert_eq!(svc.current_state(), ChargeState::Idle);
}

#[test]
fn contactor_closes_only_while_charging_is_requested() {
    let (mut svc, mut hw, mut sink) = started();
    hw.cp = CpState::B9V;
    run(&mut svc, &mut hw, &mut sink, 20);
    assert!(!hw.ever_closed());

    hw.cp = CpState::C6V;
    run(&mut svc, &mut hw, &mut sink, 1);
    assert!(hw.ever_closed());
}

// ── Current limits ────────────────────────────────────────────

#[test]
fn cable_rating_caps_offer() {
    let (mut svc, mut hw, mut sink) = started();
    hw.cable = CableCapacity::Amps13;
    hw.cp = CpState::B9V;
    run(&mut svc, &mut hw, &mut sink, 1);
    assert_eq!(hw.advertised(), Some(13));
}

#[test]
fn station_limit_caps_large_cable() {
    let (mut svc, mut hw, mut sink) = started();
    hw.cable = CableCapacity::Amps63;
    hw.cp = CpState::B9V;
    run(&mut svc, &mut hw, &mut sink, 1);
    assert_eq!(hw.advertised(), Some(32));
}

#[test]
fn set_current_limit_applies_to_next_vehicle() {
    let (mut svc, mut hw, mut sink) = started();
    svc.handle_command(EvseCommand::SetCurrentLimit(16), &mut hw, &mut sink)
        .unwrap();
    assert_eq!(svc.config().evse_limit_amps, 16);

    hw.cp = CpState::B9V;
    run(&mut svc, &mut hw, &mut sink, 1);
    assert_eq!(hw.advertised(), Some(16));
    assert_eq!(svc.snapshot().duty_percent, 27);
}

#[test]
fn set_current_limit_out_of_range_is_rejected() {
    let (mut svc, mut hw, mut sink) = started();
    assert!(svc
        .handle_command(EvseCommand::SetCurrentLimit(5), &mut hw, &mut sink)
        .is_err());
    assert!(svc
        .handle_command(EvseCommand::SetCurrentLimit(81), &mut hw, &mut sink)
        .is_err());
    assert_eq!(svc.config().evse_limit_amps, 32);
}

// ── Configuration ─────────────────────────────────────────────

#[test]
fn update_config_pushes_calibration_to_hardware() {
    let (mut svc, mut hw, mut sink) = started();
    let mut cfg = EvseConfig::default();
    cfg.cp_thresholds.a_min = 3700;
    cfg.contactor.feedback_closed_high = false;

    svc.handle_command(EvseCommand::UpdateConfig(cfg.clone()), &mut hw, &mut sink)
        .unwrap();
    assert_eq!(svc.config(), &cfg);
    assert_eq!(hw.thresholds.a_min, 3700);
    assert!(hw.calls.contains(&HwCall::SetCalibration));
    assert!(hw.calls.contains(&HwCall::SetPolarity(cfg.contactor)));
}

#[test]
fn invalid_update_config_changes_nothing() {
    let (mut svc, mut hw, mut sink) = started();
    let mut cfg = EvseConfig::default();
    cfg.cp_thresholds.b_min = cfg.cp_thresholds.a_min;

    assert!(svc
        .handle_command(EvseCommand::UpdateConfig(cfg), &mut hw, &mut sink)
        .is_err());
    assert_eq!(svc.config(), &EvseConfig::default());
    assert!(!hw.calls.contains(&HwCall::SetCalibration));
}

// ── Ventilation policy ────────────────────────────────────────

#[test]
fn state_d_faults_by_default() {
    let (mut svc, mut hw, mut sink) = started();
    hw.cp = CpState::D3V;
    run(&mut svc, &mut hw, &mut sink, 2);
    assert_eq!(svc.current_state(), ChargeState::Fault);
    assert_eq!(svc.last_fault(), ErrorCode::StateInvalid);
    assert!(!hw.ever_closed());
}

#[test]
fn state_d_charges_when_site_is_ventilated() {
    let cfg = EvseConfig {
        ventilation: VentilationPolicy::TreatAsCharge,
        ..EvseConfig::default()
    };
    let (mut svc, mut hw, mut sink) = started_with(cfg);
    hw.cp = CpState::D3V;
    run(&mut svc, &mut hw, &mut sink, 10);
    assert_eq!(svc.current_state(), ChargeState::Charging);
}

#[test]
fn state_d_while_charging_opens_and_faults() {
    let (mut svc, mut hw, mut sink) = charging();
    hw.cp = CpState::D3V;
    run(&mut svc, &mut hw, &mut sink, 1);
    assert_eq!(svc.current_state(), ChargeState::Ventilation);
    assert_eq!(hw.contactor_intent(), ContactorIntent::Open);
    assert_eq!(hw.advertised(), Some(0));

    run(&mut svc, &mut hw, &mut sink, 1);
    assert_eq!(svc.current_state(), ChargeState::Fault);
}
