use std::f64::consts::{PI, TAU};

use nalgebra::Vector3;

/// Classical Keplerian orbital elements.
#[derive(Debug, Clone, Copy)]
pub struct KeplerianElements {
    pub sma: f64,       // semi-major axis, m (negative when unbound)
    pub ecc: f64,       // eccentricity (0 = circular)
    pub inc: f64,       // inclination, rad
    pub raan: f64,      // right ascension of ascending node, rad
    pub argp: f64,      // argument of periapsis, rad
    pub true_anom: f64, // true anomaly, rad
}

// Radial (degenerate) trajectories are timed as a very thin ellipse.
const MAX_BOUND_ECC: f64 = 1.0 - 1e-9;

impl KeplerianElements {
    /// Convert to an inertial state vector (position, velocity).
    pub fn to_state_vector(&self, mu: f64) -> (Vector3<f64>, Vector3<f64>) {
        let p = self.sma * (1.0 - self.ecc * self.ecc); // semi-latus rectum
        let (sin_nu, cos_nu) = self.true_anom.sin_cos();
        let r = p / (1.0 + self.ecc * cos_nu);

        let r_pqw = Vector3::new(r * cos_nu, r * sin_nu, 0.0);
        let sqrt_mu_p = (mu / p).sqrt();
        let v_pqw = Vector3::new(-sqrt_mu_p * sin_nu, sqrt_mu_p * (self.ecc + cos_nu), 0.0);

        let (sin_raan, cos_raan) = self.raan.sin_cos();
        let (sin_argp, cos_argp) = self.argp.sin_cos();
        let (sin_inc, cos_inc) = self.inc.sin_cos();

        let rot = |v: &Vector3<f64>| -> Vector3<f64> {
            Vector3::new(
                (cos_raan * cos_argp - sin_raan * sin_argp * cos_inc) * v.x
                    + (-cos_raan * sin_argp - sin_raan * cos_argp * cos_inc) * v.y,
                (sin_raan * cos_argp + cos_raan * sin_argp * cos_inc) * v.x
                    + (-sin_raan * sin_argp + cos_raan * cos_argp * cos_inc) * v.y,
                (sin_argp * sin_inc) * v.x + (cos_argp * sin_inc) * v.y,
            )
        };

        (rot(&r_pqw), rot(&v_pqw))
    }

    /// Derive elements from an inertial state vector.
    ///
    /// Handles the degenerate cases met during ascent: zero velocity on the
    /// pad (radial orbit, e = 1) and equatorial or circular orbits.
    pub fn from_state_vector(pos: &Vector3<f64>, vel: &Vector3<f64>, mu: f64) -> Self {
        let r = pos.norm();
        let v = vel.norm();

        let h = pos.cross(vel);
        let h_mag = h.norm();
        let n = Vector3::new(-h.y, h.x, 0.0);
        let n_mag = n.norm();

        let e_vec = ((v * v - mu / r) * pos - pos.dot(vel) * vel) / mu;
        let ecc = e_vec.norm();

        let energy = 0.5 * v * v - mu / r;
        let sma = -mu / (2.0 * energy);

        let inc = if h_mag > 1e-10 {
            (h.z / h_mag).clamp(-1.0, 1.0).acos()
        } else {
            0.0
        };

        let raan = if n_mag > 1e-10 {
            let raan = (n.x / n_mag).clamp(-1.0, 1.0).acos();
            if n.y < 0.0 { TAU - raan } else { raan }
        } else {
            0.0
        };

        let argp = if n_mag > 1e-10 && ecc > 1e-10 {
            let w = (n.dot(&e_vec) / (n_mag * ecc)).clamp(-1.0, 1.0).acos();
            if e_vec.z < 0.0 { TAU - w } else { w }
        } else if ecc > 1e-10 {
            // equatorial: longitude of periapsis, prograde sense
            let w = e_vec.y.atan2(e_vec.x);
            if h.z < 0.0 { (-w).rem_euclid(TAU) } else { w.rem_euclid(TAU) }
        } else {
            0.0
        };

        let true_anom = if ecc > 1e-10 {
            let nu = (e_vec.dot(pos) / (ecc * r)).clamp(-1.0, 1.0).acos();
            if pos.dot(vel) < 0.0 { TAU - nu } else { nu }
        } else {
            0.0
        };

        KeplerianElements { sma, ecc, inc, raan, argp, true_anom }
    }

    pub fn is_bound(&self) -> bool {
        self.sma > 0.0 && self.ecc < 1.0 + 1e-12
    }

    /// Apoapsis radius, m. Infinite for unbound trajectories.
    pub fn apoapsis(&self) -> f64 {
        if self.is_bound() {
            self.sma * (1.0 + self.ecc)
        } else {
            f64::INFINITY
        }
    }

    /// Periapsis radius, m.
    pub fn periapsis(&self) -> f64 {
        self.sma.abs() * (1.0 - self.ecc).abs()
    }

    /// Orbital period, s. Infinite for unbound trajectories.
    pub fn period(&self, mu: f64) -> f64 {
        if self.is_bound() {
            TAU * (self.sma.powi(3) / mu).sqrt()
        } else {
            f64::INFINITY
        }
    }

    /// Mean anomaly in [0, 2pi).
    pub fn mean_anomaly(&self) -> f64 {
        let e = self.ecc.min(MAX_BOUND_ECC);
        let (sin_nu, cos_nu) = self.true_anom.sin_cos();
        let ecc_anom = ((1.0 - e * e).sqrt() * sin_nu).atan2(e + cos_nu);
        (ecc_anom - e * ecc_anom.sin()).rem_euclid(TAU)
    }

    /// Time until the vessel next reaches apoapsis, s.
    pub fn time_to_apoapsis(&self, mu: f64) -> f64 {
        self.time_to_mean_anomaly(PI, mu)
    }

    /// Time until the vessel next reaches periapsis, s.
    pub fn time_to_periapsis(&self, mu: f64) -> f64 {
        self.time_to_mean_anomaly(TAU, mu)
    }

    fn time_to_mean_anomaly(&self, target: f64, mu: f64) -> f64 {
        if !self.is_bound() {
            return f64::INFINITY;
        }
        let n = (mu / self.sma.powi(3)).sqrt();
        (target - self.mean_anomaly()).rem_euclid(TAU) / n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MU: f64 = 3.531_6e12;
    const R: f64 = 600_000.0;

    fn equatorial(sma: f64, ecc: f64, true_anom: f64) -> KeplerianElements {
        KeplerianElements { sma, ecc, inc: 0.0, raan: 0.0, argp: 0.0, true_anom }
    }

    #[test]
    fn elliptical_roundtrip() {
        let orbit = equatorial(R + 90_000.0, 0.05, 1.0);
        let (pos, vel) = orbit.to_state_vector(MU);
        let back = KeplerianElements::from_state_vector(&pos, &vel, MU);
        assert!((back.sma - orbit.sma).abs() < 1e-3, "SMA mismatch");
        assert!((back.ecc - orbit.ecc).abs() < 1e-9, "ECC mismatch");
        assert!((back.true_anom - orbit.true_anom).abs() < 1e-6, "Anomaly mismatch");
    }

    #[test]
    fn apsis_timing_is_half_period_apart() {
        let orbit = equatorial(R + 80_000.0, 0.1, 0.3);
        let period = orbit.period(MU);
        let t_apo = orbit.time_to_apoapsis(MU);
        let t_peri = orbit.time_to_periapsis(MU);
        let gap = (t_peri - t_apo).rem_euclid(period);
        assert!((gap - period / 2.0).abs() < 1e-6);
    }

    #[test]
    fn at_apoapsis_time_to_apoapsis_is_zero() {
        let orbit = equatorial(R + 80_000.0, 0.1, PI);
        let t = orbit.time_to_apoapsis(MU);
        let period = orbit.period(MU);
        assert!(t < 1e-6 || (period - t) < 1e-6, "Got {}", t);
    }

    #[test]
    fn vessel_at_rest_on_surface() {
        let pos = Vector3::new(R, 0.0, 0.0);
        let vel = Vector3::zeros();
        let el = KeplerianElements::from_state_vector(&pos, &vel, MU);
        assert!((el.apoapsis() - R).abs() < 1e-6, "Apoapsis is the pad itself");
        assert!(el.time_to_apoapsis(MU).is_finite());
        assert!(el.period(MU).is_finite());
    }

    #[test]
    fn escape_trajectory_is_unbound() {
        let pos = Vector3::new(R, 0.0, 0.0);
        let v_esc = (2.0 * MU / R).sqrt();
        let vel = Vector3::new(0.0, v_esc * 1.1, 0.0);
        let el = KeplerianElements::from_state_vector(&pos, &vel, MU);
        assert!(!el.is_bound());
        assert!(el.apoapsis().is_infinite());
        assert!(el.time_to_apoapsis(MU).is_infinite());
    }

    #[test]
    fn circular_orbit_speed() {
        let orbit = equatorial(R + 100_000.0, 0.0, 0.0);
        let (_, vel) = orbit.to_state_vector(MU);
        let expected = (MU / (R + 100_000.0)).sqrt();
        assert!((vel.norm() - expected).abs() < 1e-6);
    }
}
