use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use ascent_pilot::logging;
use ascent_pilot::mission::{keys, Driver, Pacing, Parameters};
use ascent_pilot::sim::SyntheticVessel;
use ascent_pilot::steps::ascent_mission;
use ascent_pilot::vehicle::{presets, stack_delta_v, stack_mass, Telemetry};

/// Simulation step between autopilot ticks, s.
const DT: f64 = 0.1;
/// Safety cap on autopilot ticks (about 5.5 h of simulated time).
const MAX_TICKS: u64 = 200_000;

struct Sample {
    ut: f64,
    altitude: f64,
    speed: f64,
    apoapsis: f64,
    periapsis: f64,
    mass: f64,
    throttle: f64,
}

impl Sample {
    fn capture(vessel: &SyntheticVessel) -> Self {
        Self {
            ut: vessel.ut(),
            altitude: vessel.altitude(),
            speed: vessel.speed(),
            apoapsis: vessel.apoapsis_altitude(),
            periapsis: vessel.periapsis_altitude(),
            mass: vessel.mass(),
            throttle: vessel.throttle(),
        }
    }
}

fn load_overrides(path: &Path) -> Result<Parameters> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn main() -> Result<()> {
    logging::init();

    let overrides = match std::env::args().nth(1) {
        Some(path) => load_overrides(Path::new(&path))?,
        None => Parameters::new(),
    };
    info!(overrides = overrides.len(), "Loaded mission parameters");

    let stages = presets::orbiter();
    let mut mission = ascent_mission(SyntheticVessel::new(stages.clone()), overrides)?;

    // -----------------------------------------------------------------------
    // Fly
    // -----------------------------------------------------------------------
    let mut samples = Vec::new();
    let mut next_sample = 0.0;
    let report = Driver::new(Pacing::Immediate)
        .with_max_ticks(MAX_TICKS)
        .run(&mut mission, None, |vessel: &mut SyntheticVessel| {
            vessel.step(DT);
            if vessel.ut() >= next_sample {
                samples.push(Sample::capture(vessel));
                next_sample = vessel.ut() + 10.0;
            }
        })?;

    // -----------------------------------------------------------------------
    // Summary
    // -----------------------------------------------------------------------
    let vessel = mission.vessel();
    let params = &mission.context().params;

    println!();
    println!("====================================================================");
    println!("  ASCENT AUTOPILOT: {} on {}", mission.name(), vessel.body().name);
    println!("====================================================================");
    println!();
    println!("  Vehicle");
    println!("  ──────────────────────────────────────────────────────────────────");
    let g = vessel.body().surface_gravity();
    for (i, stage) in stages.iter().enumerate() {
        let payload = stack_mass(&stages[i + 1..]);
        println!(
            "  {:<8}  wet {:>7.0} kg   thrust {:>7.0} N   Isp {:>4.0} s   burn {:>5.1} s   TWR {:>4.2}   dv {:>5.0} m/s",
            stage.name,
            stage.total_mass(),
            stage.thrust,
            stage.isp,
            stage.burn_time(),
            stage.thrust_to_weight(payload, g),
            stage.delta_v(payload)
        );
    }
    println!("  Stack delta-v: {:>8.0} m/s", stack_delta_v(&stages));
    println!();

    println!("  Target");
    println!("  ──────────────────────────────────────────────────────────────────");
    if let Ok(target) = params.number(keys::TARGET_ALTITUDE) {
        println!("  Altitude:      {:>10.0} m", target);
    }
    if let Ok(apt) = params.number(keys::TARGET_APOAPSIS_TIME) {
        println!("  Apoapsis time: {:>10.1} s", apt);
    }
    println!();

    println!("  Result");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!("  Finished:      {:>10}", report.finished);
    println!("  Final step:    {:>10}", report.final_step);
    println!("  Ticks:         {:>10}", report.ticks);
    println!("  Mission time:  {:>10.1} s", vessel.ut());
    println!("  Apoapsis:      {:>10.0} m", vessel.apoapsis_altitude());
    println!("  Periapsis:     {:>10.0} m", vessel.periapsis_altitude());
    println!("  Mass:          {:>10.0} kg", vessel.mass());
    println!();

    println!("  Trajectory");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  {:>7}  {:>9}  {:>9}  {:>10}  {:>10}  {:>8}  {:>5}",
        "t (s)", "alt (m)", "vel (m/s)", "Ap (m)", "Pe (m)", "mass(kg)", "thr"
    );
    println!("  {}", "─".repeat(68));
    for s in &samples {
        println!(
            "  {:>7.1}  {:>9.0}  {:>9.1}  {:>10.0}  {:>10.0}  {:>8.0}  {:>5.2}",
            s.ut, s.altitude, s.speed, s.apoapsis, s.periapsis, s.mass, s.throttle
        );
    }
    println!("====================================================================");
    println!();

    Ok(())
}
