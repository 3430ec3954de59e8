// ---------------------------------------------------------------------------
// Steps from the launch pad to the edge of the atmosphere.
// ---------------------------------------------------------------------------

use tracing::debug;

use crate::error::{MissionError, Result};
use crate::gnc::{pitch_of, PitchProgram, Pid, TurnProfile};
use crate::mission::{keys, MissionContext, Parameters, Step};
use crate::steps::staging::{auto_stage, stage_if_ready, staging_defaults};
use crate::steps::{defaults, ids, scratch};
use crate::vehicle::{AttitudeTarget, Vessel};

// ---------------------------------------------------------------------------
// Pre-launch
// ---------------------------------------------------------------------------

/// Arm attitude hold pointing straight up at full throttle, then wait
/// `prelaunch_timeout` seconds.
pub struct PreLaunch;

impl<V: Vessel> Step<V> for PreLaunch {
    fn name(&self) -> &str {
        ids::PRE_LAUNCH
    }

    fn defaults(&self) -> Parameters {
        Parameters::new()
            .with(keys::PRELAUNCH_TIMEOUT, defaults::PRELAUNCH_TIMEOUT)
            .with(keys::HEADING, defaults::HEADING)
            .with(keys::USE_RCS, defaults::USE_RCS)
    }

    fn run(&mut self, ctx: &mut MissionContext<V>) -> Result<()> {
        let timeout = ctx.params.number(keys::PRELAUNCH_TIMEOUT)?;

        if ctx.first_call() {
            let heading = ctx.params.number(keys::HEADING)?;
            let use_rcs = ctx.params.flag(keys::USE_RCS)?;
            let vessel = &mut ctx.vessel;
            vessel.engage_autopilot();
            vessel.set_attitude_target(AttitudeTarget::PitchHeading { pitch: 90.0, heading });
            vessel.set_throttle(1.0);
            vessel.set_sas(false);
            vessel.set_rcs(use_rcs);
        }

        if timeout <= 0.0 || ctx.elapsed_in_step() > timeout {
            ctx.advance();
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Launch
// ---------------------------------------------------------------------------

/// Stage until the launch clamps are gone, then hand over to the gravity turn
/// once both altitude and speed thresholds are passed.
pub struct Launch;

impl<V: Vessel> Step<V> for Launch {
    fn name(&self) -> &str {
        ids::LAUNCH
    }

    fn defaults(&self) -> Parameters {
        let mut params = Parameters::new()
            .with(keys::TURN_START_ALTITUDE, defaults::TURN_START_ALTITUDE)
            .with(keys::TURN_START_SPEED, defaults::TURN_START_SPEED);
        params.fill_defaults(&staging_defaults());
        params
    }

    fn run(&mut self, ctx: &mut MissionContext<V>) -> Result<()> {
        if ctx.vessel.launch_clamps() > 0 {
            stage_if_ready(ctx)?;
            return Ok(());
        }

        let start_altitude = ctx.params.number(keys::TURN_START_ALTITUDE)?;
        let start_speed = ctx.params.number(keys::TURN_START_SPEED)?;
        let altitude = ctx.vessel.altitude();

        if altitude > start_altitude && ctx.vessel.speed() > start_speed {
            // the turn is shaped from where it actually began
            ctx.params.set(keys::TURN_START_ALTITUDE, altitude);
            ctx.advance();
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Gravity turn
// ---------------------------------------------------------------------------

/// Pitch program plus throttle PID holding time-to-apoapsis at
/// `target_apoapsis_time`.
pub struct GravityTurn;

impl GravityTurn {
    pub const THROTTLE_GAINS: (f64, f64, f64) = (0.2, 0.01, 0.1);
    pub const MIN_THROTTLE: f64 = 0.1;

    fn pitch_program(params: &Parameters) -> Result<PitchProgram> {
        let target = params.number(keys::TARGET_ALTITUDE)?;
        Ok(PitchProgram {
            start_altitude: params.number(keys::TURN_START_ALTITUDE)?,
            end_altitude: params.number_or(keys::TURN_END_ALTITUDE, target * defaults::TURN_END_FRACTION)?,
            min_pitch: params.number(keys::MIN_PITCH)?,
            profile: turn_profile(params)?,
        })
    }
}

fn turn_profile(params: &Parameters) -> Result<TurnProfile> {
    params
        .text(keys::TURN_PROFILE)?
        .parse::<TurnProfile>()
        .map_err(|reason| MissionError::InvalidParameter { key: keys::TURN_PROFILE.to_string(), reason })
}

impl<V: Vessel> Step<V> for GravityTurn {
    fn name(&self) -> &str {
        ids::GRAVITY_TURN
    }

    fn defaults(&self) -> Parameters {
        let mut params = Parameters::new()
            .with(keys::TARGET_ALTITUDE, defaults::TARGET_ALTITUDE)
            .with(keys::TARGET_APOAPSIS_TIME, defaults::TARGET_APOAPSIS_TIME)
            .with(keys::TURN_START_ALTITUDE, defaults::TURN_START_ALTITUDE)
            .with(keys::TURN_PROFILE, defaults::TURN_PROFILE)
            .with(keys::MIN_PITCH, defaults::MIN_PITCH)
            .with(keys::HEADING, defaults::HEADING)
            .with(keys::HIGH_ALTITUDE_PRESSURE, defaults::HIGH_ALTITUDE_PRESSURE)
            .with(keys::HIGH_ALTITUDE_APOAPSIS_TIME, defaults::HIGH_ALTITUDE_APOAPSIS_TIME);
        params.fill_defaults(&staging_defaults());
        params
    }

    fn validate(&self, params: &Parameters) -> Result<()> {
        let program = Self::pitch_program(params)?;
        if program.end_altitude <= program.start_altitude {
            return Err(MissionError::InvalidParameter {
                key: keys::TURN_END_ALTITUDE.to_string(),
                reason: format!(
                    "turn must end above its start ({} m <= {} m)",
                    program.end_altitude, program.start_altitude
                ),
            });
        }
        Ok(())
    }

    fn run(&mut self, ctx: &mut MissionContext<V>) -> Result<()> {
        if ctx.first_call() {
            let (kp, ki, kd) = Self::THROTTLE_GAINS;
            ctx.scratch.insert(scratch::THROTTLE_PID, Pid::new(kp, ki, kd, Self::MIN_THROTTLE, 1.0));
        }

        if ctx.vessel.apoapsis_altitude() >= ctx.params.number(keys::TARGET_ALTITUDE)? {
            ctx.scratch.remove(scratch::THROTTLE_PID);
            ctx.vessel.set_throttle(0.0);
            ctx.jump_or_advance(ids::COAST_TO_SPACE);
            return Ok(());
        }

        if ctx.vessel.altitude() > ctx.vessel.atmosphere_depth() {
            ctx.scratch.remove(scratch::THROTTLE_PID);
            ctx.jump_or_advance(ids::BURN_TO_APOAPSIS);
            return Ok(());
        }

        auto_stage(ctx)?;

        let program = Self::pitch_program(&ctx.params)?;
        let heading = ctx.params.number(keys::HEADING)?;
        let altitude = ctx.vessel.altitude();
        let pitch = program.target_pitch(altitude);
        ctx.vessel.set_attitude_target(AttitudeTarget::PitchHeading { pitch, heading });

        let time_to_apoapsis = ctx.vessel.time_to_apoapsis();
        let throttle = if ctx.vessel.time_to_periapsis() < time_to_apoapsis {
            1.0
        } else {
            let target = ctx.params.number(keys::TARGET_APOAPSIS_TIME)?;
            let now = ctx.vessel.ut();
            ctx.scratch
                .get_mut::<Pid>(scratch::THROTTLE_PID)?
                .seek(target, time_to_apoapsis, now)
        };
        ctx.vessel.set_throttle(throttle);

        debug!(
            altitude,
            target_pitch = pitch,
            current_pitch = pitch_of(&ctx.vessel.direction()),
            throttle,
            time_to_apoapsis,
            "Gravity turn"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Burn to apoapsis
// ---------------------------------------------------------------------------

/// Out of the atmosphere with apoapsis still low: full throttle, steering
/// pitch to keep time-to-apoapsis near its target.
pub struct BurnToApoapsis;

impl BurnToApoapsis {
    pub const PITCH_GAINS: (f64, f64, f64) = (0.5, 0.05, 0.2);
}

impl<V: Vessel> Step<V> for BurnToApoapsis {
    fn name(&self) -> &str {
        ids::BURN_TO_APOAPSIS
    }

    fn defaults(&self) -> Parameters {
        let mut params = Parameters::new()
            .with(keys::TARGET_ALTITUDE, defaults::TARGET_ALTITUDE)
            .with(keys::TARGET_APOAPSIS_TIME, defaults::TARGET_APOAPSIS_TIME)
            .with(keys::PITCH_CORRECTION, defaults::PITCH_CORRECTION)
            .with(keys::HEADING, defaults::HEADING);
        params.fill_defaults(&staging_defaults());
        params
    }

    fn validate(&self, params: &Parameters) -> Result<()> {
        let correction = params.number(keys::PITCH_CORRECTION)?;
        if !(correction > 0.0 && correction <= 90.0) {
            return Err(MissionError::InvalidParameter {
                key: keys::PITCH_CORRECTION.to_string(),
                reason: format!("expected (0, 90] degrees, got {}", correction),
            });
        }
        Ok(())
    }

    fn run(&mut self, ctx: &mut MissionContext<V>) -> Result<()> {
        let bound = ctx.params.number(keys::PITCH_CORRECTION)?;

        if ctx.first_call() {
            let (kp, ki, kd) = Self::PITCH_GAINS;
            ctx.scratch.insert(scratch::PITCH_PID, Pid::new(kp, ki, kd, -bound, bound));
            ctx.vessel.set_throttle(1.0);
        }

        if ctx.vessel.apoapsis_altitude() >= ctx.params.number(keys::TARGET_ALTITUDE)? {
            ctx.scratch.remove(scratch::PITCH_PID);
            ctx.vessel.set_throttle(0.0);
            ctx.jump_or_advance(ids::COAST_TO_SPACE);
            return Ok(());
        }

        auto_stage(ctx)?;

        let time_to_apoapsis = ctx.vessel.time_to_apoapsis();
        // past half an orbit the apoapsis is behind us: climb as hard as allowed
        let pitch = if ctx.vessel.orbital_period() / 2.0 < time_to_apoapsis {
            bound
        } else {
            let target = ctx.params.number(keys::TARGET_APOAPSIS_TIME)?;
            let now = ctx.vessel.ut();
            ctx.scratch
                .get_mut::<Pid>(scratch::PITCH_PID)?
                .seek(target, time_to_apoapsis, now)
        };
        let heading = ctx.params.number(keys::HEADING)?;
        ctx.vessel.set_attitude_target(AttitudeTarget::PitchHeading { pitch, heading });

        debug!(target_pitch = pitch, time_to_apoapsis, "Burn to apoapsis");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Coast to space
// ---------------------------------------------------------------------------

pub struct CoastToSpace;

impl<V: Vessel> Step<V> for CoastToSpace {
    fn name(&self) -> &str {
        ids::COAST_TO_SPACE
    }

    fn run(&mut self, ctx: &mut MissionContext<V>) -> Result<()> {
        if ctx.first_call() {
            ctx.vessel.set_throttle(0.0);
            ctx.vessel.set_attitude_target(AttitudeTarget::prograde());
        }

        if ctx.vessel.altitude() > ctx.vessel.atmosphere_depth() {
            ctx.advance();
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Correct apoapsis
// ---------------------------------------------------------------------------

/// Top up an apoapsis that drag pulled below target while coasting.
pub struct CorrectApoapsis;

impl<V: Vessel> Step<V> for CorrectApoapsis {
    fn name(&self) -> &str {
        ids::CORRECT_APOAPSIS
    }

    fn defaults(&self) -> Parameters {
        Parameters::new()
            .with(keys::TARGET_ALTITUDE, defaults::TARGET_ALTITUDE)
            .with(keys::CORRECTION_THROTTLE, defaults::CORRECTION_THROTTLE)
    }

    fn run(&mut self, ctx: &mut MissionContext<V>) -> Result<()> {
        let target = ctx.params.number(keys::TARGET_ALTITUDE)?;
        let apoapsis = ctx.vessel.apoapsis_altitude();

        if ctx.first_call() {
            ctx.vessel.set_attitude_target(AttitudeTarget::prograde());
            if apoapsis < target {
                let throttle = ctx.params.number(keys::CORRECTION_THROTTLE)?;
                ctx.vessel.set_throttle(throttle);
            }
        }

        if apoapsis >= target {
            ctx.vessel.set_throttle(0.0);
            ctx.advance();
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
