// ---------------------------------------------------------------------------
// Flight step library: launch to circular orbit.
// ---------------------------------------------------------------------------

pub mod ascent;
pub mod circularize;
pub mod staging;

use tracing::info;

pub use ascent::{BurnToApoapsis, CoastToSpace, CorrectApoapsis, GravityTurn, Launch, PreLaunch};
pub use circularize::{CoastToBurn, Complete, ExecuteBurn, PrepareCircularization};
pub use staging::{auto_stage, stage_if_ready};

use crate::error::Result;
use crate::mission::{keys, Event, EventOutcome, Mission, MissionContext, Parameters, Step};
use crate::vehicle::Vessel;

/// Step identifiers.
pub mod ids {
    pub const PRE_LAUNCH: &str = "pre_launch";
    pub const LAUNCH: &str = "launch";
    pub const GRAVITY_TURN: &str = "gravity_turn";
    pub const BURN_TO_APOAPSIS: &str = "burn_to_apoapsis";
    pub const COAST_TO_SPACE: &str = "coast_to_space";
    pub const CORRECT_APOAPSIS: &str = "correct_apoapsis";
    pub const PREPARE_CIRCULARIZATION: &str = "prepare_circularization";
    pub const COAST_TO_BURN: &str = "coast_to_burn";
    pub const EXECUTE_BURN: &str = "execute_burn";
    pub const COMPLETE: &str = "complete";
}

/// Scratch keys shared between steps.
pub mod scratch {
    pub const THROTTLE_PID: &str = "throttle_pid";
    pub const PITCH_PID: &str = "pitch_pid";
    pub const CIRCULARIZATION: &str = "circularization";
    pub const LAST_STAGING: &str = "last_staging";
}

/// Default parameter values.
pub mod defaults {
    pub const TARGET_ALTITUDE: f64 = 100_000.0;
    pub const TARGET_APOAPSIS_TIME: f64 = 40.0;
    pub const TURN_START_ALTITUDE: f64 = 1_000.0;
    pub const TURN_START_SPEED: f64 = 100.0;
    /// `turn_end_altitude` defaults to this fraction of `target_altitude`.
    pub const TURN_END_FRACTION: f64 = 0.6;
    pub const TURN_PROFILE: &str = "linear";
    pub const MIN_PITCH: f64 = 10.0;
    pub const HEADING: f64 = 90.0;
    pub const MAX_AUTOSTAGE: f64 = 0.0;
    pub const USE_RCS: bool = false;
    pub const LEAD_TIME: f64 = 15.0;
    pub const STAGE_WAIT: f64 = 0.5;
    pub const PRELAUNCH_TIMEOUT: f64 = 5.0;
    pub const PITCH_CORRECTION: f64 = 15.0;
    pub const CORRECTION_THROTTLE: f64 = 0.05;
    pub const HIGH_ALTITUDE_PRESSURE: f64 = 100.0;
    pub const HIGH_ALTITUDE_APOAPSIS_TIME: f64 = 60.0;
    pub const COMPLETION_DELAY: f64 = 5.0;
}

/// Event raising the time-to-apoapsis target in thin air.
pub const HIGH_ALTITUDE: &str = "high_altitude";

/// The full launch-to-orbit sequence in flight order.
pub fn standard_steps<V: Vessel>() -> Vec<Box<dyn Step<V>>> {
    vec![
        Box::new(PreLaunch),
        Box::new(Launch),
        Box::new(GravityTurn),
        Box::new(BurnToApoapsis),
        Box::new(CoastToSpace),
        Box::new(CorrectApoapsis),
        Box::new(PrepareCircularization),
        Box::new(CoastToBurn),
        Box::new(ExecuteBurn),
        Box::new(Complete),
    ]
}

/// Once static pressure falls below `high_altitude_pressure`, let apoapsis
/// run further ahead (`high_altitude_apoapsis_time`). Fires once.
pub fn high_altitude_event<V: Vessel>() -> Event<V> {
    Event::new(
        |ctx: &MissionContext<V>| {
            ctx.params
                .number(keys::HIGH_ALTITUDE_PRESSURE)
                .is_ok_and(|limit| ctx.vessel.static_pressure() < limit)
        },
        |ctx: &mut MissionContext<V>| {
            let target = ctx.params.number(keys::HIGH_ALTITUDE_APOAPSIS_TIME)?;
            ctx.params.set(keys::TARGET_APOAPSIS_TIME, target);
            info!(target_apoapsis_time = target, altitude = ctx.vessel.altitude(), "Entering thin atmosphere");
            Ok(EventOutcome::Continue)
        },
    )
}

/// Standard ascent mission: all steps, the high-altitude event, and caller
/// overrides on top of the step defaults.
pub fn ascent_mission<V: Vessel>(vessel: V, overrides: Parameters) -> Result<Mission<V>> {
    Mission::builder(vessel)
        .name("ascent")
        .boxed_steps(standard_steps())
        .params(overrides)
        .event(HIGH_ALTITUDE, high_altitude_event())
        .build()
}
