// ---------------------------------------------------------------------------
// Mission error types
// ---------------------------------------------------------------------------

use thiserror::Error;

use crate::mission::params::ParamKind;

/// Errors raised while building or running a mission.
///
/// Configuration problems surface from `MissionBuilder::build`; the structural
/// ones (unknown step, missing scratch entry, missing node) surface from a tick
/// and are fatal to the run.
#[derive(Debug, Error)]
pub enum MissionError {
    #[error("mission has no steps")]
    EmptySequence,

    #[error("step `{0}` appears more than once in the sequence")]
    DuplicateStep(String),

    #[error("unknown step `{0}`")]
    UnknownStep(String),

    #[error("missing required parameter `{0}`")]
    MissingParameter(String),

    #[error("parameter `{key}` should be a {expected}, got a {found}")]
    ParameterType {
        key: String,
        expected: ParamKind,
        found: ParamKind,
    },

    #[error("invalid value for parameter `{key}`: {reason}")]
    InvalidParameter { key: String, reason: String },

    #[error("scratch entry `{0}` is missing")]
    MissingScratch(String),

    #[error("scratch entry `{0}` holds an unexpected type")]
    ScratchType(String),

    #[error("no maneuver node is active")]
    NoManeuverNode,
}

pub type Result<T> = std::result::Result<T, MissionError>;
