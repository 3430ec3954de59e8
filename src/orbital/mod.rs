pub mod elements;
pub mod maneuvers;

pub use elements::KeplerianElements;
pub use maneuvers::{
    burn_time, circular_velocity, plan_circularization, vis_viva, CircularizationBurn, ManeuverPlan,
    OrbitSnapshot, PropulsionSnapshot,
};
