//! `evse-sim`: host simulator for the EVSE control core.
//!
//! Runs the real `EvseService` and `HardwareAdapter` over a simulated
//! bench.  A scripted vehicle plugs in, charges, stops, unplugs, then a
//! welded contactor and an operator abort are injected to show fault
//! latching and recovery.
//!
//! ```text
//!  simulated 1 ms clock ──▶ TickScheduler ──▶ EvseService::tick ──▶ LogEventSink
//!                                         └──▶ SharedStatus ──▶ display line
//! ```
//!
//! A JSON configuration may be supplied in the `EVSE_CONFIG` environment
//! variable; otherwise defaults are used.  Log verbosity follows `RUST_LOG`
//! (default `info`).
#![deny(unused_must_use)]

use anyhow::{Context, Result};
use log::{info, warn};

use acevse::adapters::log_sink::LogEventSink;
use acevse::adapters::sim::{CP_RAW_B, CP_RAW_C, SimBench};
use acevse::app::commands::EvseCommand;
use acevse::app::service::EvseService;
use acevse::config::EvseConfig;
use acevse::scheduler::TickScheduler;
use acevse::status::{SharedStatus, StatusSnapshot};

/// Read by the display refresh, written by the control loop.
static STATUS: SharedStatus = SharedStatus::new();

// ── Scenario ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum Step {
    PlugIn(u16),
    SetCp(u16),
    Load(f32),
    GlitchMeter,
    Unplug,
    Weld,
    Repair,
    Abort,
}

/// (simulated millisecond, action)
const SCRIPT: &[(u32, Step)] = &[
    (200, Step::PlugIn(CP_RAW_B)),
    (500, Step::SetCp(CP_RAW_C)),
    (700, Step::Load(16.0)),
    (1500, Step::GlitchMeter),
    (2000, Step::Load(0.0)),
    (2010, Step::SetCp(CP_RAW_B)),
    (2500, Step::Unplug),
    (3000, Step::Weld),
    (3500, Step::Repair),
    (4000, Step::Abort),
];

const RUN_MS: u32 = 4500;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("╔══════════════════════════════════════╗");
    info!("║  acevse simulator v{:<18}║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 1. Configuration ──────────────────────────────────────
    let config = match std::env::var("EVSE_CONFIG") {
        Ok(json) => EvseConfig::from_json(&json).context("EVSE_CONFIG rejected")?,
        Err(_) => {
            info!("EVSE_CONFIG not set, using defaults");
            EvseConfig::default()
        }
    };
    info!(
        "Limit {} A, tick {} ms, settle {} ticks",
        config.evse_limit_amps,
        config.tick_interval_ms,
        config.settle_ticks()
    );

    // ── 2. Bench + service ────────────────────────────────────
    let bench = SimBench::new();
    let mut hw = bench.adapter(&config);
    let mut sink = LogEventSink::new();
    let scheduler = TickScheduler::new(config.tick_interval_ms, config.display_interval_ms);
    let mut service = EvseService::new(config).context("service init")?;

    service.start(&mut hw, &mut sink);

    // ── 3. Main loop on a simulated clock ─────────────────────
    let mut script = SCRIPT.iter().peekable();
    let mut shown = StatusSnapshot::BOOT;

    while scheduler.uptime_ms() < RUN_MS {
        scheduler.on_millisecond();
        let now = scheduler.uptime_ms();

        while let Some(&&(at, step)) = script.peek() {
            if at > now {
                break;
            }
            script.next();
            info!("t={} ms | {:?}", now, step);
            match step {
                Step::PlugIn(cp) => bench.plug_in(cp),
                Step::SetCp(cp) => bench.set_cp_raw(cp),
                Step::Load(amps) => bench.set_load_amps(amps),
                Step::GlitchMeter => bench.glitch_meter(),
                Step::Unplug => bench.unplug(),
                Step::Weld => bench.weld(),
                Step::Repair => bench.repair_contactor(),
                Step::Abort => {
                    if let Err(e) = service.handle_command(EvseCommand::Abort, &mut hw, &mut sink) {
                        warn!("Abort rejected: {}", e);
                    }
                }
            }
        }

        if scheduler.take_control_tick() {
            service.tick(&mut hw, &mut sink);
        }

        if scheduler.take_display_refresh() {
            service.publish(&STATUS);
            let snap = STATUS.get();
            if snap != shown {
                info!(
                    "DISPLAY | {:?} | {} A @ {}% | contactor {:?} | fault {}",
                    snap.state, snap.advertised_amps, snap.duty_percent, snap.contactor, snap.last_fault
                );
                shown = snap;
            }
        }
    }

    // ── 4. Summary ────────────────────────────────────────────
    info!(
        "Done after {} ticks in {:?}, {} events, coil {}",
        service.tick_count(),
        service.current_state(),
        sink.emitted(),
        if bench.coil_energised() { "energised" } else { "released" }
    );
    for record in service.fault_history() {
        info!(
            "history | tick {} | {} from {}:{}",
            record.tick, record.code, record.source, record.line
        );
    }
    Ok(())
}
