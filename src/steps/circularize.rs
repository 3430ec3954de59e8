// ---------------------------------------------------------------------------
// Circularization at apoapsis and mission wrap-up.
// ---------------------------------------------------------------------------

use tracing::{debug, info, warn};

use crate::error::{MissionError, Result};
use crate::mission::{keys, MissionContext, Parameters, Step};
use crate::orbital::{plan_circularization, ManeuverPlan, OrbitSnapshot, PropulsionSnapshot};
use crate::steps::staging::{auto_stage, staging_defaults};
use crate::steps::{defaults, ids, scratch};
use crate::vehicle::{AttitudeTarget, Vessel};

/// Attitude error (deg) below which the vessel counts as pointed at the node.
const POINTING_TOLERANCE: f64 = 1.0;
/// Minimum time (s) in the step before trusting the attitude error.
const SETTLE_TIME: f64 = 1.0;

// ---------------------------------------------------------------------------
// Prepare circularization
// ---------------------------------------------------------------------------

/// Plan the apoapsis burn, place the node, point at it and warp towards the
/// burn window.
pub struct PrepareCircularization;

impl<V: Vessel> Step<V> for PrepareCircularization {
    fn name(&self) -> &str {
        ids::PREPARE_CIRCULARIZATION
    }

    fn defaults(&self) -> Parameters {
        let mut params = Parameters::new().with(keys::LEAD_TIME, defaults::LEAD_TIME);
        params.fill_defaults(&staging_defaults());
        params
    }

    fn run(&mut self, ctx: &mut MissionContext<V>) -> Result<()> {
        let now = ctx.vessel.ut();

        let Some(ignition) = ctx
            .scratch
            .find::<ManeuverPlan>(scratch::CIRCULARIZATION)
            .map(|plan| plan.ignition_time)
        else {
            // the planner needs thrust: stage first if the tanks ran dry
            if ctx.vessel.available_thrust() <= 0.0 {
                auto_stage(ctx)?;
                return Ok(());
            }

            let orbit = OrbitSnapshot::capture(&ctx.vessel);
            let propulsion = PropulsionSnapshot::capture(&ctx.vessel);
            let burn = plan_circularization(&orbit, &propulsion);
            let plan = ManeuverPlan::new(burn, now + ctx.vessel.time_to_apoapsis());

            ctx.vessel.add_node(plan.node_time, plan.delta_v);
            ctx.vessel.engage_autopilot();
            ctx.vessel.set_attitude_target(AttitudeTarget::ManeuverNode);
            info!(
                delta_v = plan.delta_v,
                burn_time = plan.burn_time,
                ignition = plan.ignition_time,
                "Planned circularization"
            );
            ctx.scratch.insert(scratch::CIRCULARIZATION, plan);
            return Ok(());
        };

        if ignition < now {
            ctx.jump_or_advance(ids::EXECUTE_BURN);
            return Ok(());
        }

        if ctx.vessel.attitude_error() < POINTING_TOLERANCE && ctx.elapsed_in_step() > SETTLE_TIME {
            let lead_time = ctx.params.number(keys::LEAD_TIME)?;
            if ignition > now + lead_time * 2.0 {
                debug!(to = ignition - lead_time, "Warping to burn window");
                ctx.vessel.warp_to(ignition - lead_time);
            }
            ctx.advance();
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Coast to burn
// ---------------------------------------------------------------------------

pub struct CoastToBurn;

impl<V: Vessel> Step<V> for CoastToBurn {
    fn name(&self) -> &str {
        ids::COAST_TO_BURN
    }

    fn run(&mut self, ctx: &mut MissionContext<V>) -> Result<()> {
        let ignition = ctx.scratch.get::<ManeuverPlan>(scratch::CIRCULARIZATION)?.ignition_time;
        if ignition <= ctx.vessel.ut() {
            ctx.advance();
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Execute burn
// ---------------------------------------------------------------------------

/// Burn until the node's remaining delta-v is used up or starts growing.
pub struct ExecuteBurn;

impl ExecuteBurn {
    /// Below this much remaining burn time (s) the throttle drops to
    /// `correction_throttle`.
    pub const TAPER_TIME: f64 = 1.0;
}

impl<V: Vessel> Step<V> for ExecuteBurn {
    fn name(&self) -> &str {
        ids::EXECUTE_BURN
    }

    fn defaults(&self) -> Parameters {
        let mut params = Parameters::new().with(keys::CORRECTION_THROTTLE, defaults::CORRECTION_THROTTLE);
        params.fill_defaults(&staging_defaults());
        params
    }

    fn run(&mut self, ctx: &mut MissionContext<V>) -> Result<()> {
        let remaining = ctx.vessel.remaining_delta_v().ok_or(MissionError::NoManeuverNode)?;
        let first_call = ctx.first_call();

        let plan = ctx.scratch.get_mut::<ManeuverPlan>(scratch::CIRCULARIZATION)?;
        if first_call {
            plan.last_remaining = Some(remaining);
        }
        let overshoot = plan.overshoot(remaining);
        plan.last_remaining = Some(remaining);

        auto_stage(ctx)?;

        if remaining <= 0.0 || overshoot {
            if overshoot {
                warn!(remaining, "Remaining delta-v increased, ending burn");
            }
            ctx.vessel.set_throttle(0.0);
            ctx.vessel.remove_node();
            ctx.scratch.remove(scratch::CIRCULARIZATION);

            if ctx.vessel.periapsis_altitude() < ctx.vessel.atmosphere_depth() {
                info!(periapsis = ctx.vessel.periapsis_altitude(), "Periapsis still low, planning again");
                ctx.jump_or_advance(ids::PREPARE_CIRCULARIZATION);
            } else {
                info!(
                    apoapsis = ctx.vessel.apoapsis_altitude(),
                    periapsis = ctx.vessel.periapsis_altitude(),
                    "Circularization complete"
                );
                ctx.advance();
            }
            return Ok(());
        }

        let propulsion = PropulsionSnapshot::capture(&ctx.vessel);
        let throttle = if propulsion.thrust <= 0.0 || propulsion.burn_time(remaining) > Self::TAPER_TIME {
            1.0
        } else {
            ctx.params.number(keys::CORRECTION_THROTTLE)?
        };
        ctx.vessel.set_throttle(throttle);

        debug!(remaining, throttle, "Executing burn");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Complete
// ---------------------------------------------------------------------------

/// Hold for `completion_delay` seconds, then release attitude control.
pub struct Complete;

impl<V: Vessel> Step<V> for Complete {
    fn name(&self) -> &str {
        ids::COMPLETE
    }

    fn defaults(&self) -> Parameters {
        Parameters::new().with(keys::COMPLETION_DELAY, defaults::COMPLETION_DELAY)
    }

    fn run(&mut self, ctx: &mut MissionContext<V>) -> Result<()> {
        if ctx.elapsed_in_step() > ctx.params.number(keys::COMPLETION_DELAY)? {
            ctx.vessel.disengage_autopilot();
            ctx.advance();
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mission::{Mission, TickOutcome};
    use crate::orbital::CircularizationBurn;
    use crate::testing::ScriptedVessel;

    /// 80 x -200 km suborbital arc with a 60 kN upper stage.
    fn coasting_vessel() -> ScriptedVessel {
        ScriptedVessel {
            ut: 1_000.0,
            altitude: 71_000.0,
            apoapsis_altitude: 80_000.0,
            periapsis_altitude: -200_000.0,
            semi_major_axis: 600_000.0 + (80_000.0 - 200_000.0) / 2.0,
            time_to_apoapsis: 120.0,
            available_thrust: 60_000.0,
            isp: 340.0,
            mass: 4_000.0,
            attitude_error: 10.0,
            ..Default::default()
        }
    }

    fn circularization(vessel: ScriptedVessel) -> Mission<ScriptedVessel> {
        let mut mission = Mission::builder(vessel)
            .step(PrepareCircularization)
            .step(CoastToBurn)
            .step(ExecuteBurn)
            .step(Complete)
            .build()
            .unwrap();
        mission.start(None).unwrap();
        mission
    }

    fn plan(mission: &Mission<ScriptedVessel>) -> &ManeuverPlan {
        mission.context().scratch.get::<ManeuverPlan>(scratch::CIRCULARIZATION).unwrap()
    }

    #[test]
    fn prepare_places_node_at_apoapsis() {
        let mut mission = circularization(coasting_vessel());
        mission.tick().unwrap();

        let plan = plan(&mission).clone();
        assert!(plan.delta_v > 0.0);
        assert!(plan.burn_time > 0.0);
        assert!((plan.node_time - 1_120.0).abs() < 1e-9);
        assert!((plan.ignition_time - (1_120.0 - plan.burn_time / 2.0)).abs() < 1e-9);

        let vessel = mission.vessel();
        assert_eq!(vessel.nodes, vec![(plan.node_time, plan.delta_v)]);
        assert_eq!(vessel.attitude_target, Some(AttitudeTarget::ManeuverNode));
        assert!(vessel.autopilot);
    }

    #[test]
    fn prepare_stages_before_planning_without_thrust() {
        let mut mission = circularization(ScriptedVessel { available_thrust: 0.0, ..coasting_vessel() });
        mission.tick().unwrap();
        assert_eq!(mission.vessel().stages_activated, 1);
        assert!(!mission.context().scratch.contains(scratch::CIRCULARIZATION));

        mission.vessel_mut().available_thrust = 60_000.0;
        mission.vessel_mut().ut += 1.0;
        mission.tick().unwrap();
        assert!(mission.context().scratch.contains(scratch::CIRCULARIZATION));
    }

    #[test]
    fn prepare_waits_for_pointing_then_warps() {
        let mut mission = circularization(coasting_vessel());
        mission.tick().unwrap();
        let ignition = plan(&mission).ignition_time;

        mission.vessel_mut().ut = 1_002.0;
        mission.tick().unwrap();
        assert_eq!(mission.current_step(), ids::PREPARE_CIRCULARIZATION, "Still slewing");

        mission.vessel_mut().attitude_error = 0.5;
        mission.tick().unwrap();
        assert_eq!(mission.current_step(), ids::COAST_TO_BURN);
        assert_eq!(mission.vessel().warped_to, Some(ignition - defaults::LEAD_TIME));
    }

    #[test]
    fn no_warp_when_burn_is_close() {
        let mut mission = circularization(ScriptedVessel { time_to_apoapsis: 30.0, ..coasting_vessel() });
        mission.tick().unwrap();
        mission.vessel_mut().attitude_error = 0.2;
        mission.vessel_mut().ut += 1.5;
        mission.tick().unwrap();
        assert_eq!(mission.current_step(), ids::COAST_TO_BURN);
        assert_eq!(mission.vessel().warped_to, None);
    }

    #[test]
    fn coast_to_burn_without_plan_is_an_error() {
        let mut mission = Mission::builder(coasting_vessel()).step(CoastToBurn).build().unwrap();
        mission.start(None).unwrap();
        assert!(matches!(mission.tick(), Err(MissionError::MissingScratch(_))));
    }

    fn burning(remaining: f64) -> Mission<ScriptedVessel> {
        let mut mission = Mission::builder(ScriptedVessel { remaining_delta_v: Some(remaining), ..coasting_vessel() })
            .step(PrepareCircularization)
            .step(ExecuteBurn)
            .step(Complete)
            .build()
            .unwrap();
        let burn = CircularizationBurn { delta_v: remaining, burn_time: 60.0 };
        mission
            .context_mut()
            .scratch
            .insert(scratch::CIRCULARIZATION, ManeuverPlan::new(burn, 1_000.0));
        mission.start(Some(ids::EXECUTE_BURN)).unwrap();
        mission
    }

    #[test]
    fn execute_tapers_throttle_near_the_end() {
        let mut mission = burning(400.0);
        mission.tick().unwrap();
        assert_eq!(mission.vessel().throttle, 1.0);

        // 60 kN on 4 t is 15 m/s^2, so 5 m/s is a third of a second
        mission.vessel_mut().remaining_delta_v = Some(5.0);
        mission.tick().unwrap();
        assert_eq!(mission.vessel().throttle, defaults::CORRECTION_THROTTLE);
    }

    #[test]
    fn execute_stops_on_overshoot_and_replans_low_orbit() {
        let mut mission = burning(400.0);
        mission.tick().unwrap();
        mission.vessel_mut().remaining_delta_v = Some(2.0);
        mission.tick().unwrap();
        mission.vessel_mut().remaining_delta_v = Some(3.0);
        mission.tick().unwrap();

        assert_eq!(mission.vessel().throttle, 0.0);
        assert!(mission.vessel().nodes.is_empty());
        assert!(!mission.context().scratch.contains(scratch::CIRCULARIZATION));
        assert_eq!(mission.current_step(), ids::PREPARE_CIRCULARIZATION);
    }

    #[test]
    fn execute_advances_once_orbit_is_clear_of_atmosphere() {
        let mut mission = burning(2.0);
        mission.vessel_mut().periapsis_altitude = 75_000.0;
        mission.tick().unwrap();
        mission.vessel_mut().remaining_delta_v = Some(2.5);
        mission.tick().unwrap();
        assert_eq!(mission.current_step(), ids::COMPLETE);
    }

    #[test]
    fn execute_without_node_is_an_error() {
        let mut mission = burning(100.0);
        mission.vessel_mut().remaining_delta_v = None;
        assert!(matches!(mission.tick(), Err(MissionError::NoManeuverNode)));
    }

    #[test]
    fn complete_releases_control_after_delay() {
        let mut mission = Mission::builder(ScriptedVessel { autopilot: true, ..Default::default() })
            .step(Complete)
            .build()
            .unwrap();
        mission.start(None).unwrap();
        assert_eq!(mission.tick().unwrap(), TickOutcome::Continue);
        mission.vessel_mut().ut = 5.5;
        assert_eq!(mission.tick().unwrap(), TickOutcome::Finished);
        assert!(!mission.vessel().autopilot);
    }
}
