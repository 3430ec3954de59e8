pub mod interface;
pub mod stage;

pub use interface::{Actuator, AttitudeTarget, Telemetry, Vessel};
pub use stage::{stack_delta_v, stack_mass, Stage, StageBuilder};

// ---------------------------------------------------------------------------
// Preset stacks
// ---------------------------------------------------------------------------

pub mod presets {
    use super::{Stage, StageBuilder};

    /// Two-stage orbital launcher, first stage listed first.
    pub fn orbiter() -> Vec<Stage> {
        vec![
            StageBuilder::new("Booster")
                .dry_mass(3_000.0)
                .propellant_mass(12_000.0)
                .thrust(300_000.0)
                .isp(280.0)
                .cd(0.3)
                .area(2.0)
                .build(),
            StageBuilder::new("Upper")
                .dry_mass(1_000.0)
                .propellant_mass(3_000.0)
                .thrust(60_000.0)
                .isp(340.0)
                .cd(0.3)
                .area(1.2)
                .build(),
        ]
    }
}
