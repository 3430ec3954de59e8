use nalgebra::Vector3;

// ---------------------------------------------------------------------------
// Central body: point-mass gravity plus an exponential atmosphere
// ---------------------------------------------------------------------------

/// Atmospheric properties at a given altitude.
#[derive(Debug, Clone, Copy)]
pub struct Atmo {
    pub density: f64,  // kg/m^3
    pub pressure: f64, // Pa
}

impl Atmo {
    pub const VACUUM: Atmo = Atmo { density: 0.0, pressure: 0.0 };
}

#[derive(Debug, Clone)]
pub struct Body {
    pub name: String,
    pub radius: f64,            // m
    pub mu: f64,                // m^3/s^2
    pub atmosphere_depth: f64,  // m, 0 for airless bodies
    pub sea_level_pressure: f64, // Pa
    pub sea_level_density: f64, // kg/m^3
    pub scale_height: f64,      // m
}

impl Body {
    /// Kerbin-like home world.
    pub fn kerbin() -> Self {
        Self {
            name: "Kerbin".into(),
            radius: 600_000.0,
            mu: 3.531_6e12,
            atmosphere_depth: 70_000.0,
            sea_level_pressure: 101_325.0,
            sea_level_density: 1.225,
            scale_height: 5_600.0,
        }
    }

    /// Gravitational acceleration at the surface, m/s^2.
    pub fn surface_gravity(&self) -> f64 {
        self.mu / (self.radius * self.radius)
    }

    pub fn altitude(&self, pos: &Vector3<f64>) -> f64 {
        pos.norm() - self.radius
    }

    /// Exponential atmosphere, cut off at `atmosphere_depth`. Negative
    /// altitudes clamp to sea level.
    pub fn atmosphere(&self, altitude: f64) -> Atmo {
        if altitude >= self.atmosphere_depth {
            return Atmo::VACUUM;
        }
        let decay = (-altitude.max(0.0) / self.scale_height).exp();
        Atmo {
            density: self.sea_level_density * decay,
            pressure: self.sea_level_pressure * decay,
        }
    }

    /// Inverse-square gravity (inertial frame, body centred).
    pub fn gravity(&self, pos: &Vector3<f64>) -> Vector3<f64> {
        let r = pos.norm();
        if r < 1.0 {
            return Vector3::zeros();
        }
        -pos * (self.mu / (r * r * r))
    }
}

/// Aerodynamic drag force, opposing velocity.
pub fn drag_force(vel: &Vector3<f64>, atm: &Atmo, cd: f64, area: f64) -> Vector3<f64> {
    let speed = vel.norm();
    if speed > 1e-6 {
        let q_dyn = 0.5 * atm.density * speed * speed;
        -vel.normalize() * (q_dyn * cd * area)
    } else {
        Vector3::zeros()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kerbin_surface_gravity() {
        let g = Body::kerbin().surface_gravity();
        assert!((g - 9.81).abs() < 1e-3, "g = {}", g);
    }

    #[test]
    fn atmosphere_thins_and_ends() {
        let body = Body::kerbin();
        let sea = body.atmosphere(0.0);
        assert!((sea.pressure - 101_325.0).abs() < 1e-9);
        assert_eq!(body.atmosphere(-50.0).pressure, sea.pressure);

        let high = body.atmosphere(40_000.0);
        assert!(high.pressure < 100.0, "p(40 km) = {}", high.pressure);
        assert!(high.density < sea.density);
        assert_eq!(body.atmosphere(70_000.0).pressure, 0.0);
    }

    #[test]
    fn gravity_points_inward() {
        let body = Body::kerbin();
        let pos = Vector3::new(0.0, 700_000.0, 0.0);
        let g = body.gravity(&pos);
        assert!(g.y < 0.0);
        assert!((g.norm() - body.mu / 700_000.0_f64.powi(2)).abs() < 1e-12);
    }

    #[test]
    fn drag_opposes_velocity() {
        let atm = Body::kerbin().atmosphere(0.0);
        let vel = Vector3::new(0.0, 300.0, 0.0);
        let drag = drag_force(&vel, &atm, 0.3, 2.0);
        assert!(drag.y < 0.0);
        assert!((drag.norm() - 0.5 * 1.225 * 300.0 * 300.0 * 0.3 * 2.0).abs() < 1e-6);
        assert_eq!(drag_force(&Vector3::zeros(), &atm, 0.3, 2.0), Vector3::zeros());
    }
}
