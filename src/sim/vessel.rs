use nalgebra::{UnitQuaternion, Vector3};
use tracing::{debug, info};

use crate::gnc::angle_between;
use crate::orbital::KeplerianElements;
use crate::sim::body::{drag_force, Body};
use crate::sim::integrator::rk4_step;
use crate::vehicle::stage::G0;
use crate::vehicle::{stack_mass, Actuator, AttitudeTarget, Stage, Telemetry};

/// Attitude slew rate under autopilot, deg/s.
pub const SLEW_RATE: f64 = 10.0;
/// Step size used while warping, s.
const WARP_STEP: f64 = 1.0;

#[derive(Debug, Clone)]
struct Node {
    ut: f64,
    delta_v: f64,
    delivered: f64,
}

/// Point-mass vessel flying a stack of stages around a [`Body`].
///
/// Stage activation follows the pad sequence: the first activation lights the
/// first stage, the second releases the launch clamps and every later one
/// drops the spent stage and lights the next.
#[derive(Debug, Clone)]
pub struct SyntheticVessel {
    body: Body,
    stages: Vec<Stage>,
    active: Option<usize>,
    propellant: f64, // kg left in the active stage
    clamped: bool,

    time: f64,
    pos: Vector3<f64>, // m, inertial, body centred
    vel: Vector3<f64>, // m/s, inertial
    pointing: Vector3<f64>,

    throttle: f64,
    autopilot: bool,
    target: Option<AttitudeTarget>,
    rcs: bool,
    sas: bool,
    node: Option<Node>,
}

impl SyntheticVessel {
    /// Vessel on the pad of a Kerbin-like body, pointing up.
    pub fn new(stages: Vec<Stage>) -> Self {
        Self::on_pad(Body::kerbin(), stages)
    }

    pub fn on_pad(body: Body, stages: Vec<Stage>) -> Self {
        let pos = Vector3::new(body.radius, 0.0, 0.0);
        Self {
            body,
            stages,
            active: None,
            propellant: 0.0,
            clamped: true,
            time: 0.0,
            pos,
            vel: Vector3::zeros(),
            pointing: Vector3::x(),
            throttle: 0.0,
            autopilot: false,
            target: None,
            rcs: false,
            sas: false,
            node: None,
        }
    }

    /// Vessel already in flight at `pos` / `vel` with `stage` lit.
    pub fn in_flight(body: Body, stages: Vec<Stage>, stage: usize, pos: Vector3<f64>, vel: Vector3<f64>) -> Self {
        let mut vessel = Self::on_pad(body, stages);
        let stage = stage.min(vessel.stages.len().saturating_sub(1));
        vessel.active = Some(stage);
        vessel.propellant = vessel.stages.get(stage).map_or(0.0, |s| s.propellant_mass);
        vessel.clamped = false;
        vessel.pos = pos;
        vessel.vel = vel;
        vessel.pointing = if vel.norm() > 0.0 { vel.normalize() } else { pos.normalize() };
        vessel
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn position(&self) -> Vector3<f64> {
        self.pos
    }

    pub fn velocity(&self) -> Vector3<f64> {
        self.vel
    }

    pub fn elements(&self) -> KeplerianElements {
        KeplerianElements::from_state_vector(&self.pos, &self.vel, self.body.mu)
    }

    /// Stages still attached, active one first.
    pub fn remaining_stages(&self) -> &[Stage] {
        &self.stages[self.active.unwrap_or(0)..]
    }

    pub fn propellant(&self) -> f64 {
        self.propellant
    }

    pub fn is_clamped(&self) -> bool {
        self.clamped
    }

    pub fn rcs_enabled(&self) -> bool {
        self.rcs
    }

    pub fn sas_enabled(&self) -> bool {
        self.sas
    }

    /// UT of the active maneuver node.
    pub fn node_time(&self) -> Option<f64> {
        self.node.as_ref().map(|n| n.ut)
    }

    /// Advance the simulation by `dt` seconds with the commanded throttle.
    pub fn step(&mut self, dt: f64) {
        self.advance(dt, true);
    }

    fn active_stage(&self) -> Option<&Stage> {
        self.active.and_then(|i| self.stages.get(i))
    }

    /// Stage whose drag figures apply (the bottom of the stack).
    fn aero_stage(&self) -> Option<&Stage> {
        self.stages.get(self.active.unwrap_or(0))
    }

    fn up(&self) -> Vector3<f64> {
        self.pos.normalize()
    }

    /// Local east for the orbit plane; prograde for a counter-clockwise orbit.
    fn east(&self) -> Vector3<f64> {
        let up = self.up();
        let east = Vector3::new(-up.y, up.x, 0.0);
        if east.norm() > 1e-9 { east.normalize() } else { Vector3::y() }
    }

    fn north(&self) -> Vector3<f64> {
        self.east().cross(&self.up())
    }

    fn prograde(&self) -> Vector3<f64> {
        if self.vel.norm() > 1e-3 { self.vel.normalize() } else { self.east() }
    }

    /// Inertial unit vector the autopilot is steering towards.
    fn target_direction(&self) -> Option<Vector3<f64>> {
        let dir = match self.target? {
            AttitudeTarget::PitchHeading { pitch, heading } => {
                let (p, h) = (pitch.to_radians(), heading.to_radians());
                let horizontal = self.north() * h.cos() + self.east() * h.sin();
                horizontal * p.cos() + self.up() * p.sin()
            }
            AttitudeTarget::Orbital(v) => {
                let radial = self.up();
                let prograde = self.prograde();
                let normal = radial.cross(&prograde);
                radial * v.x + prograde * v.y + normal * v.z
            }
            AttitudeTarget::ManeuverNode => {
                let sign = self.node.as_ref().map_or(1.0, |n| n.delta_v.signum());
                self.prograde() * sign
            }
        };
        (dir.norm() > 1e-9).then(|| dir.normalize())
    }

    fn thrust(&self) -> f64 {
        match self.active_stage() {
            Some(stage) if self.propellant > 0.0 => stage.thrust,
            _ => 0.0,
        }
    }

    fn slew(&mut self, dt: f64) {
        if !self.autopilot {
            return;
        }
        let Some(target) = self.target_direction() else {
            return;
        };
        let error = self.pointing.angle(&target).to_degrees();
        let max_step = SLEW_RATE * dt;
        if error <= max_step {
            self.pointing = target;
            return;
        }
        self.pointing = match UnitQuaternion::scaled_rotation_between(&self.pointing, &target, max_step / error) {
            Some(rotation) => (rotation * self.pointing).normalize(),
            None => target,
        };
    }

    fn advance(&mut self, dt: f64, powered: bool) {
        self.time += dt;

        let thrust = if powered { self.thrust() * self.throttle } else { 0.0 };
        let isp = self.active_stage().map_or(0.0, |s| s.isp);
        let burned = if thrust > 0.0 && isp > 0.0 {
            (thrust / (isp * G0) * dt).min(self.propellant)
        } else {
            0.0
        };

        if self.clamped {
            self.propellant -= burned;
            self.slew(dt);
            return;
        }

        let mass = self.mass();
        let thrust_accel = self.pointing * (thrust / mass);
        let (cd, area) = self.aero_stage().map_or((0.0, 0.0), |s| (s.cd, s.area));
        let body = &self.body;
        let accel = |p: &Vector3<f64>, v: &Vector3<f64>| {
            let atm = body.atmosphere(body.altitude(p));
            body.gravity(p) + thrust_accel + drag_force(v, &atm, cd, area) / mass
        };
        let (pos, vel) = rk4_step(&self.pos, &self.vel, dt, accel);
        self.pos = pos;
        self.vel = vel;
        self.propellant -= burned;

        let prograde = self.prograde();
        if let Some(node) = self.node.as_mut() {
            node.delivered += thrust_accel.dot(&(prograde * node.delta_v.signum())) * dt;
        }

        if self.body.altitude(&self.pos) < 0.0 {
            // resting on the surface
            self.pos = self.up() * self.body.radius;
            self.vel = Vector3::zeros();
        }

        self.slew(dt);
    }
}

impl Telemetry for SyntheticVessel {
    fn ut(&self) -> f64 {
        self.time
    }

    fn altitude(&self) -> f64 {
        self.body.altitude(&self.pos)
    }

    fn speed(&self) -> f64 {
        self.vel.norm()
    }

    fn static_pressure(&self) -> f64 {
        self.body.atmosphere(self.altitude()).pressure
    }

    fn apoapsis_altitude(&self) -> f64 {
        self.elements().apoapsis() - self.body.radius
    }

    fn periapsis_altitude(&self) -> f64 {
        self.elements().periapsis() - self.body.radius
    }

    fn apoapsis_radius(&self) -> f64 {
        self.elements().apoapsis()
    }

    fn semi_major_axis(&self) -> f64 {
        self.elements().sma
    }

    fn time_to_apoapsis(&self) -> f64 {
        self.elements().time_to_apoapsis(self.body.mu)
    }

    fn time_to_periapsis(&self) -> f64 {
        self.elements().time_to_periapsis(self.body.mu)
    }

    fn orbital_period(&self) -> f64 {
        self.elements().period(self.body.mu)
    }

    fn gravitational_parameter(&self) -> f64 {
        self.body.mu
    }

    fn surface_gravity(&self) -> f64 {
        self.body.surface_gravity()
    }

    fn atmosphere_depth(&self) -> f64 {
        self.body.atmosphere_depth
    }

    fn available_thrust(&self) -> f64 {
        self.thrust()
    }

    fn specific_impulse(&self) -> f64 {
        self.active_stage().map_or(0.0, |s| s.isp)
    }

    fn mass(&self) -> f64 {
        let Some(index) = self.active else {
            return stack_mass(&self.stages);
        };
        self.stages[index].dry_mass + self.propellant + stack_mass(&self.stages[index + 1..])
    }

    fn current_stage(&self) -> u32 {
        let below = match self.active {
            Some(index) => self.stages.len() - 1 - index,
            None => self.stages.len(),
        };
        u32::try_from(below).unwrap_or(u32::MAX)
    }

    fn launch_clamps(&self) -> usize {
        usize::from(self.clamped)
    }

    fn throttle(&self) -> f64 {
        self.throttle
    }

    fn attitude_error(&self) -> f64 {
        match self.target_direction() {
            Some(target) if self.autopilot => angle_between(&self.pointing, &target),
            _ => 0.0,
        }
    }

    fn direction(&self) -> Vector3<f64> {
        Vector3::new(
            self.pointing.dot(&self.up()),
            self.pointing.dot(&self.north()),
            self.pointing.dot(&self.east()),
        )
    }

    fn remaining_delta_v(&self) -> Option<f64> {
        self.node.as_ref().map(|n| (n.delta_v.abs() - n.delivered).abs())
    }
}

impl Actuator for SyntheticVessel {
    fn set_throttle(&mut self, throttle: f64) {
        self.throttle = throttle.clamp(0.0, 1.0);
    }

    fn set_attitude_target(&mut self, target: AttitudeTarget) {
        self.target = Some(target);
    }

    fn engage_autopilot(&mut self) {
        self.autopilot = true;
    }

    fn disengage_autopilot(&mut self) {
        self.autopilot = false;
    }

    fn set_rcs(&mut self, enabled: bool) {
        self.rcs = enabled;
    }

    fn set_sas(&mut self, enabled: bool) {
        self.sas = enabled;
    }

    fn activate_next_stage(&mut self) {
        match self.active {
            None if !self.stages.is_empty() => {
                self.active = Some(0);
                self.propellant = self.stages[0].propellant_mass;
                info!(stage = %self.stages[0].name, "Ignition");
            }
            Some(_) if self.clamped => {
                self.clamped = false;
                info!(ut = self.time, "Launch clamps released");
            }
            Some(index) if index + 1 < self.stages.len() => {
                self.active = Some(index + 1);
                self.propellant = self.stages[index + 1].propellant_mass;
                info!(dropped = %self.stages[index].name, lit = %self.stages[index + 1].name, "Stage separation");
            }
            _ => debug!("No stage left to activate"),
        }
    }

    fn add_node(&mut self, ut: f64, prograde: f64) {
        self.node = Some(Node { ut, delta_v: prograde, delivered: 0.0 });
    }

    fn remove_node(&mut self) {
        self.node = None;
    }

    fn warp_to(&mut self, ut: f64) {
        debug!(from = self.time, to = ut, "Warp");
        while self.time < ut {
            let dt = (ut - self.time).min(WARP_STEP);
            self.advance(dt, false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vehicle::presets;

    fn launched() -> SyntheticVessel {
        let mut vessel = SyntheticVessel::new(presets::orbiter());
        vessel.activate_next_stage();
        vessel.activate_next_stage();
        vessel
    }

    #[test]
    fn pad_telemetry() {
        let vessel = SyntheticVessel::new(presets::orbiter());
        assert_eq!(vessel.altitude(), 0.0);
        assert_eq!(vessel.launch_clamps(), 1);
        assert_eq!(vessel.available_thrust(), 0.0);
        assert_eq!(vessel.current_stage(), 2);
        assert!((vessel.mass() - 19_000.0).abs() < 1e-9);
        assert!((vessel.static_pressure() - 101_325.0).abs() < 1e-9);
        assert!(vessel.direction().x > 0.999, "pointing up");
    }

    #[test]
    fn staging_sequence() {
        let mut vessel = SyntheticVessel::new(presets::orbiter());
        vessel.activate_next_stage();
        assert_eq!(vessel.available_thrust(), 300_000.0);
        assert_eq!(vessel.launch_clamps(), 1);
        assert_eq!(vessel.current_stage(), 1);

        vessel.activate_next_stage();
        assert_eq!(vessel.launch_clamps(), 0);

        vessel.activate_next_stage();
        assert_eq!(vessel.current_stage(), 0);
        assert_eq!(vessel.available_thrust(), 60_000.0);
        assert!((vessel.mass() - 4_000.0).abs() < 1e-9);
    }

    #[test]
    fn clamps_hold_the_vessel_down() {
        let mut vessel = SyntheticVessel::new(presets::orbiter());
        vessel.activate_next_stage();
        vessel.set_throttle(1.0);
        vessel.step(1.0);
        assert_eq!(vessel.altitude(), 0.0);
        assert!(vessel.propellant() < 12_000.0);
    }

    #[test]
    fn climbs_under_thrust() {
        let mut vessel = launched();
        vessel.set_throttle(1.0);
        for _ in 0..100 {
            vessel.step(0.1);
        }
        assert!(vessel.altitude() > 10.0);
        assert!(vessel.speed() > 0.0);
        assert!((vessel.ut() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn throttle_is_clamped() {
        let mut vessel = launched();
        vessel.set_throttle(1.7);
        assert_eq!(vessel.throttle(), 1.0);
        vessel.set_throttle(-0.2);
        assert_eq!(vessel.throttle(), 0.0);
    }

    #[test]
    fn autopilot_slews_at_bounded_rate() {
        let mut vessel = launched();
        vessel.engage_autopilot();
        vessel.set_attitude_target(AttitudeTarget::PitchHeading { pitch: 45.0, heading: 90.0 });
        assert!((vessel.attitude_error() - 45.0).abs() < 1e-6);

        vessel.step(1.0);
        assert!((vessel.attitude_error() - 35.0).abs() < 1e-6);

        for _ in 0..10 {
            vessel.step(1.0);
        }
        assert!(vessel.attitude_error() < 1e-6);
        let dir = vessel.direction();
        assert!((dir.x - dir.z).abs() < 1e-6, "45 degrees towards east: {:?}", dir);
    }

    #[test]
    fn circular_orbit_elements_and_warp() {
        let body = Body::kerbin();
        let r = body.radius + 100_000.0;
        let v = (body.mu / r).sqrt();
        let mut vessel = SyntheticVessel::in_flight(
            body,
            presets::orbiter(),
            1,
            Vector3::new(r, 0.0, 0.0),
            Vector3::new(0.0, v, 0.0),
        );
        assert!((vessel.apoapsis_altitude() - 100_000.0).abs() < 1.0);
        assert!((vessel.periapsis_altitude() - 100_000.0).abs() < 1.0);
        assert_eq!(vessel.static_pressure(), 0.0);

        vessel.warp_to(600.0);
        assert!((vessel.ut() - 600.0).abs() < 1e-9);
        assert!((vessel.altitude() - 100_000.0).abs() < 50.0);
    }

    #[test]
    fn node_tracks_delivered_delta_v() {
        let body = Body::kerbin();
        let r = body.radius + 80_000.0;
        let v = (body.mu / r).sqrt() * 0.95;
        let mut vessel = SyntheticVessel::in_flight(
            body,
            presets::orbiter(),
            1,
            Vector3::new(r, 0.0, 0.0),
            Vector3::new(0.0, v, 0.0),
        );
        vessel.add_node(0.0, 50.0);
        assert_eq!(vessel.remaining_delta_v(), Some(50.0));

        vessel.engage_autopilot();
        vessel.set_attitude_target(AttitudeTarget::ManeuverNode);
        vessel.set_throttle(1.0);
        vessel.step(1.0);
        let remaining = vessel.remaining_delta_v().unwrap();
        assert!(remaining < 50.0 && remaining > 30.0, "remaining = {}", remaining);

        vessel.remove_node();
        assert_eq!(vessel.remaining_delta_v(), None);
    }
}
