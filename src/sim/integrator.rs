use nalgebra::Vector3;

// ---------------------------------------------------------------------------
// RK4 for translational state with acceleration held to a function of (r, v)
// ---------------------------------------------------------------------------

/// Single RK4 step. `accel` sees the intermediate position and velocity.
pub fn rk4_step<F>(pos: &Vector3<f64>, vel: &Vector3<f64>, dt: f64, accel: F) -> (Vector3<f64>, Vector3<f64>)
where
    F: Fn(&Vector3<f64>, &Vector3<f64>) -> Vector3<f64>,
{
    let deriv = |p: &Vector3<f64>, v: &Vector3<f64>| (*v, accel(p, v));

    let (k1_dr, k1_dv) = deriv(pos, vel);
    let (k2_dr, k2_dv) = deriv(&(pos + k1_dr * dt * 0.5), &(vel + k1_dv * dt * 0.5));
    let (k3_dr, k3_dv) = deriv(&(pos + k2_dr * dt * 0.5), &(vel + k2_dv * dt * 0.5));
    let (k4_dr, k4_dv) = deriv(&(pos + k3_dr * dt), &(vel + k3_dv * dt));

    (
        pos + (k1_dr + 2.0 * k2_dr + 2.0 * k3_dr + k4_dr) * (dt / 6.0),
        vel + (k1_dv + 2.0 * k2_dv + 2.0 * k3_dv + k4_dv) * (dt / 6.0),
    )
}
