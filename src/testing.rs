// ---------------------------------------------------------------------------
// Scripted vessel for unit tests: telemetry is set field by field and every
// actuator command is recorded.
// ---------------------------------------------------------------------------

use nalgebra::Vector3;

use crate::vehicle::{Actuator, AttitudeTarget, Telemetry};

#[derive(Debug, Clone)]
pub struct ScriptedVessel {
    pub ut: f64,
    pub altitude: f64,
    pub speed: f64,
    pub static_pressure: f64,
    pub apoapsis_altitude: f64,
    pub periapsis_altitude: f64,
    pub time_to_apoapsis: f64,
    pub time_to_periapsis: f64,
    pub orbital_period: f64,
    pub body_radius: f64,
    pub semi_major_axis: f64,
    pub mu: f64,
    pub surface_gravity: f64,
    pub atmosphere_depth: f64,
    pub available_thrust: f64,
    pub isp: f64,
    pub mass: f64,
    pub current_stage: u32,
    pub launch_clamps: usize,
    pub attitude_error: f64,
    pub direction: Vector3<f64>,
    pub remaining_delta_v: Option<f64>,

    // recorded commands
    pub throttle: f64,
    pub throttle_history: Vec<f64>,
    pub attitude_target: Option<AttitudeTarget>,
    pub autopilot: bool,
    pub rcs: bool,
    pub sas: bool,
    pub stages_activated: usize,
    pub nodes: Vec<(f64, f64)>,
    pub warped_to: Option<f64>,
}

impl Default for ScriptedVessel {
    fn default() -> Self {
        Self {
            ut: 0.0,
            altitude: 0.0,
            speed: 0.0,
            static_pressure: 101_325.0,
            apoapsis_altitude: 0.0,
            periapsis_altitude: -600_000.0,
            time_to_apoapsis: 0.0,
            time_to_periapsis: 0.0,
            orbital_period: 0.0,
            body_radius: 600_000.0,
            semi_major_axis: 300_000.0,
            mu: 3.531_6e12,
            surface_gravity: 9.81,
            atmosphere_depth: 70_000.0,
            available_thrust: 0.0,
            isp: 300.0,
            mass: 10_000.0,
            current_stage: 2,
            launch_clamps: 0,
            attitude_error: 0.0,
            direction: Vector3::x(),
            remaining_delta_v: None,
            throttle: 0.0,
            throttle_history: vec![],
            attitude_target: None,
            autopilot: false,
            rcs: false,
            sas: true,
            stages_activated: 0,
            nodes: vec![],
            warped_to: None,
        }
    }
}

impl Telemetry for ScriptedVessel {
    fn ut(&self) -> f64 {
        self.ut
    }
    fn altitude(&self) -> f64 {
        self.altitude
    }
    fn speed(&self) -> f64 {
        self.speed
    }
    fn static_pressure(&self) -> f64 {
        self.static_pressure
    }
    fn apoapsis_altitude(&self) -> f64 {
        self.apoapsis_altitude
    }
    fn periapsis_altitude(&self) -> f64 {
        self.periapsis_altitude
    }
    fn apoapsis_radius(&self) -> f64 {
        self.apoapsis_altitude + self.body_radius
    }
    fn semi_major_axis(&self) -> f64 {
        self.semi_major_axis
    }
    fn time_to_apoapsis(&self) -> f64 {
        self.time_to_apoapsis
    }
    fn time_to_periapsis(&self) -> f64 {
        self.time_to_periapsis
    }
    fn orbital_period(&self) -> f64 {
        self.orbital_period
    }
    fn gravitational_parameter(&self) -> f64 {
        self.mu
    }
    fn surface_gravity(&self) -> f64 {
        self.surface_gravity
    }
    fn atmosphere_depth(&self) -> f64 {
        self.atmosphere_depth
    }
    fn available_thrust(&self) -> f64 {
        self.available_thrust
    }
    fn specific_impulse(&self) -> f64 {
        self.isp
    }
    fn mass(&self) -> f64 {
        self.mass
    }
    fn current_stage(&self) -> u32 {
        self.current_stage
    }
    fn launch_clamps(&self) -> usize {
        self.launch_clamps
    }
    fn throttle(&self) -> f64 {
        self.throttle
    }
    fn attitude_error(&self) -> f64 {
        self.attitude_error
    }
    fn direction(&self) -> Vector3<f64> {
        self.direction
    }
    fn remaining_delta_v(&self) -> Option<f64> {
        self.remaining_delta_v
    }
}

impl Actuator for ScriptedVessel {
    fn set_throttle(&mut self, throttle: f64) {
        self.throttle = throttle;
        self.throttle_history.push(throttle);
    }

    fn set_attitude_target(&mut self, target: AttitudeTarget) {
        self.attitude_target = Some(target);
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
        self.stages_activated += 1;
        self.launch_clamps = self.launch_clamps.saturating_sub(1);
    }

    fn add_node(&mut self, ut: f64, prograde: f64) {
        self.nodes.push((ut, prograde));
        self.remaining_delta_v = Some(prograde.abs());
    }

    fn remove_node(&mut self) {
        self.nodes.pop();
        self.remaining_delta_v = None;
    }

    fn warp_to(&mut self, ut: f64) {
        self.warped_to = Some(ut);
        self.ut = self.ut.max(ut);
    }
}
