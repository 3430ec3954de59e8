use nalgebra::Vector3;

// ---------------------------------------------------------------------------
// Capability interfaces implemented by the flight host
// ---------------------------------------------------------------------------

/// Read-only flight quantities. Distances in m, times in s, angles in deg.
pub trait Telemetry {
    /// Current simulated universal time.
    fn ut(&self) -> f64;

    fn altitude(&self) -> f64;
    /// Speed relative to the body.
    fn speed(&self) -> f64;
    fn static_pressure(&self) -> f64;

    fn apoapsis_altitude(&self) -> f64;
    fn periapsis_altitude(&self) -> f64;
    /// Apoapsis distance from the body centre.
    fn apoapsis_radius(&self) -> f64;
    fn semi_major_axis(&self) -> f64;
    fn time_to_apoapsis(&self) -> f64;
    fn time_to_periapsis(&self) -> f64;
    fn orbital_period(&self) -> f64;

    fn gravitational_parameter(&self) -> f64;
    fn surface_gravity(&self) -> f64;
    /// Altitude at which the atmosphere ends (0 for airless bodies).
    fn atmosphere_depth(&self) -> f64;

    fn available_thrust(&self) -> f64;
    fn specific_impulse(&self) -> f64;
    fn mass(&self) -> f64;
    /// Stage number of the active engines; counts down to 0 on the last stage.
    fn current_stage(&self) -> u32;
    fn launch_clamps(&self) -> usize;
    fn throttle(&self) -> f64;

    /// Angle between current pointing and the attitude-hold target.
    fn attitude_error(&self) -> f64;
    /// Pointing in the surface frame (x = up, y = north, z = east).
    fn direction(&self) -> Vector3<f64>;

    /// Remaining delta-v of the active maneuver node, if any.
    fn remaining_delta_v(&self) -> Option<f64>;
}

/// Where attitude hold should point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttitudeTarget {
    /// Pitch over the horizon and compass heading.
    PitchHeading { pitch: f64, heading: f64 },
    /// Vector in the orbital frame (x = radial out, y = prograde, z = normal).
    Orbital(Vector3<f64>),
    /// Along the burn vector of the active maneuver node.
    ManeuverNode,
}

impl AttitudeTarget {
    pub fn prograde() -> Self {
        AttitudeTarget::Orbital(Vector3::y())
    }
}

/// Commands sent to the vessel.
pub trait Actuator {
    /// Clamped by the host to [0, 1].
    fn set_throttle(&mut self, throttle: f64);
    fn set_attitude_target(&mut self, target: AttitudeTarget);
    fn engage_autopilot(&mut self);
    fn disengage_autopilot(&mut self);
    fn set_rcs(&mut self, enabled: bool);
    fn set_sas(&mut self, enabled: bool);

    fn activate_next_stage(&mut self);

    /// Place a maneuver node at `ut` with a prograde delta-v (negative = retrograde).
    fn add_node(&mut self, ut: f64, prograde: f64);
    fn remove_node(&mut self);

    /// Warp simulated time forward to `ut`.
    fn warp_to(&mut self, ut: f64);
}

/// A vessel the mission engine can fly: both capability sets.
pub trait Vessel: Telemetry + Actuator + 'static {}

impl<T: Telemetry + Actuator + 'static> Vessel for T {}
