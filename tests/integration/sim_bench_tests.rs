//! End-to-end runs through the real `HardwareAdapter`, pilot interpreters
//! and contactor controller, on the simulated bench.

use acevse::adapters::log_sink::LogEventSink;
use acevse::adapters::sim::{
    CP_RAW_A, CP_RAW_B, CP_RAW_C, CP_RAW_D, CP_RAW_SHORT, PP_RAW_13A, PP_RAW_20A, PP_RAW_32A,
    PP_RAW_63A, PP_RAW_OPEN, SimBench, SimHardware,
};
use acevse::app::service::EvseService;
use acevse::config::EvseConfig;
use acevse::error::ErrorCode;
use acevse::fsm::ChargeState;

fn bench_service() -> (SimBench, SimHardware, EvseService, LogEventSink) {
    let config = EvseConfig::default();
    let bench = SimBench::new();
    let mut hw = bench.adapter(&config);
    let mut sink = LogEventSink::new();
    let mut svc = EvseService::new(config).unwrap();
    svc.start(&mut hw, &mut sink);
    (bench, hw, svc, sink)
}

fn run(svc: &mut EvseService, hw: &mut SimHardware, sink: &mut LogEventSink, ticks: u32) {
    for _ in 0..ticks {
        svc.tick(hw, sink);
    }
}

#[test]
fn full_session_on_bench() {
    let (bench, mut hw, mut svc, mut sink) = bench_service();
    assert_eq!(bench.duty(), 100);
    assert!(!bench.coil_energised());

    bench.plug_in(CP_RAW_B);
    run(&mut svc, &mut hw, &mut sink, 1);
    assert_eq!(svc.current_state(), ChargeState::Connected);
    assert_eq!(bench.duty(), 53);

    bench.set_cp_raw(CP_RAW_C);
    bench.set_load_amps(30.0);
    run(&mut svc, &mut hw, &mut sink, 10);
    assert_eq!(svc.current_state(), ChargeState::Charging);
    assert!(bench.coil_energised());

    bench.set_cp_raw(CP_RAW_A);
    run(&mut svc, &mut hw, &mut sink, 10);
    assert_eq!(svc.current_state(), ChargeState::Idle);
    assert!(!bench.coil_energised());
    assert_eq!(bench.duty(), 100);
    assert!(sink.emitted() > 0);
}

#[test]
fn thirteen_amp_cable_on_bench() {
    let (bench, mut hw, mut svc, mut sink) = bench_service();
    bench.set_pp_raw(PP_RAW_13A);
    bench.set_cp_raw(CP_RAW_B);
    run(&mut svc, &mut hw, &mut sink, 1);
    // 13 A → 13 / 0.6 = 21.67 → 22 %
    assert_eq!(bench.duty(), 22);
}

#[test]
fn cable_rating_sets_duty_on_bench() {
    let (bench, mut hw, mut svc, mut sink) = bench_service();
    bench.set_pp_raw(PP_RAW_20A);
    bench.set_cp_raw(CP_RAW_B);
    run(&mut svc, &mut hw, &mut sink, 1);
    // 20 A → 33 %
    assert_eq!(bench.duty(), 33);

    bench.unplug();
    run(&mut svc, &mut hw, &mut sink, 1);
    assert_eq!(svc.current_state(), ChargeState::Idle);

    // A 63 A cable is held to the 32 A station limit.
    bench.set_pp_raw(PP_RAW_63A);
    bench.set_cp_raw(CP_RAW_B);
    run(&mut svc, &mut hw, &mut sink, 1);
    assert_eq!(bench.duty(), 53);
}

#[test]
fn bouncing_pp_averaging_into_band_gap_faults() {
    let (bench, mut hw, mut svc, mut sink) = bench_service();
    // Four samples in the 32 A band and four in the 20 A band: mean 1200 sits
    // between them.
    bench.set_pp_alternating(PP_RAW_32A, PP_RAW_20A);
    bench.set_cp_raw(CP_RAW_B);
    run(&mut svc, &mut hw, &mut sink, 1);

    assert_eq!(svc.current_state(), ChargeState::Fault);
    assert_eq!(svc.last_fault(), ErrorCode::PpResistanceInvalid);
    assert_eq!(svc.fault_record().unwrap().source, "proximity");
    assert_eq!(
        svc.fault_history()
            .filter(|r| r.code == ErrorCode::PpResistanceInvalid)
            .count(),
        1
    );
    assert_eq!(bench.duty(), 100);
    assert!(!bench.coil_energised());
}

#[test]
fn missing_coding_resistor_faults() {
    let (bench, mut hw, mut svc, mut sink) = bench_service();
    bench.set_pp_raw(PP_RAW_OPEN);
    bench.set_cp_raw(CP_RAW_B);
    run(&mut svc, &mut hw, &mut sink, 1);
    assert_eq!(svc.current_state(), ChargeState::Fault);
    assert_eq!(svc.last_fault(), ErrorCode::PpResistanceInvalid);
}

#[test]
fn pilot_short_faults_and_releases_coil() {
    let (bench, mut hw, mut svc, mut sink) = bench_service();
    bench.plug_in(CP_RAW_C);
    run(&mut svc, &mut hw, &mut sink, 10);
    assert!(bench.coil_energised());

    bench.set_cp_raw(CP_RAW_SHORT);
    run(&mut svc, &mut hw, &mut sink, 1);
    assert_eq!(svc.current_state(), ChargeState::Fault);
    assert!(!bench.coil_energised());
    assert_eq!(bench.duty(), 100);
}

#[test]
fn weld_latches_until_repaired_and_unplugged() {
    let (bench, mut hw, mut svc, mut sink) = bench_service();
    bench.weld();
    run(&mut svc, &mut hw, &mut sink, 5);
    assert_eq!(svc.last_fault(), ErrorCode::ContactorFault);

    bench.repair_contactor();
    run(&mut svc, &mut hw, &mut sink, 1);
    assert_eq!(svc.current_state(), ChargeState::Idle);
}

#[test]
fn meter_glitch_does_not_interrupt_charging() {
    let (bench, mut hw, mut svc, mut sink) = bench_service();
    bench.plug_in(CP_RAW_C);
    run(&mut svc, &mut hw, &mut sink, 10);
    bench.glitch_meter();
    run(&mut svc, &mut hw, &mut sink, 5);
    assert_eq!(svc.current_state(), ChargeState::Charging);
    assert!(svc.fault_history().any(|r| r.code == ErrorCode::HlwChecksum));
}

#[test]
fn stuck_open_contactor_faults_at_deadline() {
    let (bench, mut hw, mut svc, mut sink) = bench_service();
    bench.stick_open();
    bench.plug_in(CP_RAW_C);
    run(&mut svc, &mut hw, &mut sink, 10);

    assert_eq!(svc.current_state(), ChargeState::Fault);
    assert_eq!(svc.last_fault(), ErrorCode::ContactorFault);
    assert!(!bench.coil_energised());
}

#[test]
fn mains_sag_while_charging_faults() {
    let (bench, mut hw, mut svc, mut sink) = bench_service();
    bench.plug_in(CP_RAW_C);
    bench.set_load_amps(16.0);
    run(&mut svc, &mut hw, &mut sink, 10);
    assert_eq!(svc.current_state(), ChargeState::Charging);

    bench.set_mains_volts(195.0);
    run(&mut svc, &mut hw, &mut sink, 1);
    assert_eq!(svc.current_state(), ChargeState::Fault);
    assert_eq!(svc.last_fault(), ErrorCode::Undervoltage);
    assert!(!bench.coil_energised());
}

#[test]
fn ventilation_request_faults_without_ventilation() {
    let (bench, mut hw, mut svc, mut sink) = bench_service();
    bench.plug_in(CP_RAW_D);
    run(&mut svc, &mut hw, &mut sink, 1);
    assert_eq!(svc.current_state(), ChargeState::Fault);
    assert_eq!(svc.last_fault(), ErrorCode::StateInvalid);
    assert!(!bench.coil_energised());
}
