pub mod body;
pub mod integrator;
pub mod vessel;

pub use body::{Atmo, Body};
pub use integrator::rk4_step;
pub use vessel::SyntheticVessel;
