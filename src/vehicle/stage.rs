// ---------------------------------------------------------------------------
// Stage definition: one engine/tank set of the launcher stack
// ---------------------------------------------------------------------------

pub const G0: f64 = 9.80665; // reference gravity for Isp, m/s^2

#[derive(Debug, Clone)]
pub struct Stage {
    pub name: String,
    pub dry_mass: f64,        // kg
    pub propellant_mass: f64, // kg
    pub thrust: f64,          // N at full throttle
    pub isp: f64,             // s
    pub cd: f64,
    pub area: f64,            // m^2, drag reference
}

impl Stage {
    /// Propellant consumption at full throttle, kg/s.
    pub fn mass_flow(&self) -> f64 {
        self.thrust / (self.isp * G0)
    }

    pub fn total_mass(&self) -> f64 {
        self.dry_mass + self.propellant_mass
    }

    /// Burn time at full throttle.
    pub fn burn_time(&self) -> f64 {
        if self.thrust > 0.0 {
            self.propellant_mass / self.mass_flow()
        } else {
            0.0
        }
    }

    /// Ideal delta-v with `payload_mass` (everything above this stage) on top.
    pub fn delta_v(&self, payload_mass: f64) -> f64 {
        let m0 = self.total_mass() + payload_mass;
        let mf = self.dry_mass + payload_mass;
        self.isp * G0 * (m0 / mf).ln()
    }

    /// Thrust-to-weight ratio at ignition under `gravity`.
    pub fn thrust_to_weight(&self, payload_mass: f64, gravity: f64) -> f64 {
        self.thrust / ((self.total_mass() + payload_mass) * gravity)
    }
}

/// Combined wet mass of a stack.
pub fn stack_mass(stages: &[Stage]) -> f64 {
    stages.iter().map(Stage::total_mass).sum()
}

/// Ideal delta-v of a stack fired bottom (index 0) first.
pub fn stack_delta_v(stages: &[Stage]) -> f64 {
    (0..stages.len())
        .map(|i| stages[i].delta_v(stack_mass(&stages[i + 1..])))
        .sum()
}

// ---------------------------------------------------------------------------
// Stage builder
// ---------------------------------------------------------------------------

pub struct StageBuilder {
    name: String,
    dry_mass: f64,
    propellant_mass: f64,
    thrust: f64,
    isp: f64,
    cd: f64,
    area: f64,
}

impl StageBuilder {
    /// Starts from a small vacuum upper stage.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dry_mass: 1_000.0,
            propellant_mass: 4_000.0,
            thrust: 60_000.0,
            isp: 320.0,
            cd: 0.3,
            area: 1.5,
        }
    }

    pub fn dry_mass(mut self, v: f64) -> Self { self.dry_mass = v; self }
    pub fn propellant_mass(mut self, v: f64) -> Self { self.propellant_mass = v; self }
    pub fn thrust(mut self, v: f64) -> Self { self.thrust = v; self }
    pub fn isp(mut self, v: f64) -> Self { self.isp = v; self }
    pub fn cd(mut self, v: f64) -> Self { self.cd = v; self }
    pub fn area(mut self, v: f64) -> Self { self.area = v; self }

    pub fn build(self) -> Stage {
        Stage {
            name: self.name,
            dry_mass: self.dry_mass,
            propellant_mass: self.propellant_mass,
            thrust: self.thrust,
            isp: self.isp,
            cd: self.cd,
            area: self.area,
        }
    }
}
