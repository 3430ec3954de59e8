pub mod context;
pub mod driver;
pub mod event;
pub mod params;
pub mod runner;
pub mod step;

pub use context::{MissionContext, Scratch, StepState};
pub use driver::{Driver, DriverReport, Pacing};
pub use event::{Event, EventOutcome, EventTable};
pub use params::{keys, ParamKind, ParamValue, Parameters};
pub use runner::{Mission, MissionBuilder, TickOutcome};
pub use step::{step_fn, FnStep, Step};
