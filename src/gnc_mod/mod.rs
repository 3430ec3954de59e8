pub mod guidance;
pub mod pid;

pub use guidance::{angle_between, pitch_of, PitchProgram, TurnProfile};
pub use pid::Pid;
