use crate::vehicle::Telemetry;

/// Orbit quantities the circularization planner needs.
#[derive(Debug, Clone, Copy)]
pub struct OrbitSnapshot {
    pub mu: f64,               // gravitational parameter, m^3/s^2
    pub apoapsis_radius: f64,  // m, from body centre
    pub semi_major_axis: f64,  // m
}

/// Propulsion quantities for the rocket equation.
#[derive(Debug, Clone, Copy)]
pub struct PropulsionSnapshot {
    pub thrust: f64,          // N, currently available
    pub isp: f64,             // s
    pub surface_gravity: f64, // m/s^2, converts Isp to exhaust velocity
    pub mass: f64,            // kg
}

impl OrbitSnapshot {
    pub fn capture<T: Telemetry + ?Sized>(telemetry: &T) -> Self {
        Self {
            mu: telemetry.gravitational_parameter(),
            apoapsis_radius: telemetry.apoapsis_radius(),
            semi_major_axis: telemetry.semi_major_axis(),
        }
    }
}

impl PropulsionSnapshot {
    pub fn capture<T: Telemetry + ?Sized>(telemetry: &T) -> Self {
        Self {
            thrust: telemetry.available_thrust(),
            isp: telemetry.specific_impulse(),
            surface_gravity: telemetry.surface_gravity(),
            mass: telemetry.mass(),
        }
    }

    /// Burn duration for `delta_v` with this engine and mass.
    pub fn burn_time(&self, delta_v: f64) -> f64 {
        burn_time(delta_v, self.thrust, self.isp * self.surface_gravity, self.mass)
    }
}

/// Delta-v and duration of a circularization burn at apoapsis.
#[derive(Debug, Clone, Copy)]
pub struct CircularizationBurn {
    pub delta_v: f64,   // m/s, positive = prograde
    pub burn_time: f64, // s
}

/// An in-flight circularization attempt.
#[derive(Debug, Clone)]
pub struct ManeuverPlan {
    pub delta_v: f64,
    pub burn_time: f64,
    pub node_time: f64,     // UT of apoapsis, where the node sits
    pub ignition_time: f64, // UT the burn starts, centred on the node
    /// Remaining delta-v seen on the previous tick of the burn.
    pub last_remaining: Option<f64>,
}

impl ManeuverPlan {
    pub fn new(burn: CircularizationBurn, node_time: f64) -> Self {
        Self {
            delta_v: burn.delta_v,
            burn_time: burn.burn_time,
            node_time,
            ignition_time: node_time - burn.burn_time / 2.0,
            last_remaining: None,
        }
    }

    /// True when the remaining delta-v grew since the previous sample.
    pub fn overshoot(&self, remaining: f64) -> bool {
        self.last_remaining.is_some_and(|last| remaining > last)
    }
}

/// Vis-viva: orbital speed at radius `r` on an orbit with semi-major axis `sma`.
pub fn vis_viva(mu: f64, r: f64, sma: f64) -> f64 {
    (mu * (2.0 / r - 1.0 / sma)).sqrt()
}

/// Speed of a circular orbit of radius `r`.
pub fn circular_velocity(mu: f64, r: f64) -> f64 {
    vis_viva(mu, r, r)
}

/// Tsiolkovsky burn duration for `delta_v` at constant thrust.
///
/// `exhaust_velocity` is Isp times the reference gravity. Thrust must be
/// positive; the sign of `delta_v` only encodes direction.
pub fn burn_time(delta_v: f64, thrust: f64, exhaust_velocity: f64, mass: f64) -> f64 {
    let final_mass = mass / (delta_v.abs() / exhaust_velocity).exp();
    let flow = thrust / exhaust_velocity;
    (mass - final_mass) / flow
}

/// Plan the burn that circularizes the current orbit at its apoapsis.
///
/// Callers must make sure thrust is available (staging done) beforehand.
pub fn plan_circularization(orbit: &OrbitSnapshot, propulsion: &PropulsionSnapshot) -> CircularizationBurn {
    let r = orbit.apoapsis_radius;
    let v_current = vis_viva(orbit.mu, r, orbit.semi_major_axis);
    let v_circular = circular_velocity(orbit.mu, r);
    let delta_v = v_circular - v_current;

    CircularizationBurn {
        delta_v,
        burn_time: propulsion.burn_time(delta_v),
    }
}
