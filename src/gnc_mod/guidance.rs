use std::fmt;
use std::str::FromStr;

use nalgebra::Vector3;

// ---------------------------------------------------------------------------
// Guidance: gravity-turn pitch program
// ---------------------------------------------------------------------------

/// Shape of the pitch-over as a function of altitude progress through the turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnProfile {
    #[default]
    Linear,
    SquareRoot,
}

impl TurnProfile {
    /// Map normalized turn progress (0..=1) to turn fraction (0..=1).
    pub fn shape(self, progress: f64) -> f64 {
        let p = progress.clamp(0.0, 1.0);
        match self {
            TurnProfile::Linear => p,
            TurnProfile::SquareRoot => p.sqrt(),
        }
    }
}

impl FromStr for TurnProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linear" => Ok(TurnProfile::Linear),
            "square_root" | "sqrt" => Ok(TurnProfile::SquareRoot),
            other => Err(format!("unknown turn profile `{}`", other)),
        }
    }
}

impl fmt::Display for TurnProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnProfile::Linear => f.write_str("linear"),
            TurnProfile::SquareRoot => f.write_str("square_root"),
        }
    }
}

/// Altitude band over which the vessel pitches from vertical to `min_pitch`.
#[derive(Debug, Clone, Copy)]
pub struct PitchProgram {
    pub start_altitude: f64, // m
    pub end_altitude: f64,   // m
    pub min_pitch: f64,      // deg above horizon
    pub profile: TurnProfile,
}

impl PitchProgram {
    /// Target pitch (deg above horizon):
    /// `max(min_pitch, 90 - 90 * f((alt - start) / (end - start)))`
    pub fn target_pitch(&self, altitude: f64) -> f64 {
        let span = self.end_altitude - self.start_altitude;
        let progress = if span > 0.0 {
            (altitude - self.start_altitude) / span
        } else {
            1.0
        };
        let turn_angle = 90.0 * self.profile.shape(progress);
        (90.0 - turn_angle).max(self.min_pitch)
    }
}

// ---------------------------------------------------------------------------
// Pointing helpers
// ---------------------------------------------------------------------------

/// Angle between two vectors, degrees. Orthogonal or degenerate inputs give 0.
pub fn angle_between(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    let dot = a.dot(b);
    if dot == 0.0 {
        return 0.0;
    }
    let norms = a.norm() * b.norm();
    if norms == 0.0 {
        return 0.0;
    }
    (dot / norms).clamp(-1.0, 1.0).acos().to_degrees()
}

/// Pitch over the horizon (deg) of a direction expressed in the surface frame
/// (x = up, y = north, z = east). Negative when pointing below the horizon.
pub fn pitch_of(direction: &Vector3<f64>) -> f64 {
    let horizon = Vector3::new(0.0, direction.y, direction.z);
    if horizon.norm() == 0.0 {
        // straight up or down
        return 90.0_f64.copysign(direction.x);
    }
    let pitch = angle_between(direction, &horizon);
    if direction.x < 0.0 {
        -pitch
    } else {
        pitch
    }
}
