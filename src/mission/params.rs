// ---------------------------------------------------------------------------
// Flat key/value mission parameters with layered defaults.
// ---------------------------------------------------------------------------

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

use crate::error::{MissionError, Result};

/// Well-known parameter keys.
pub mod keys {
    pub const TARGET_ALTITUDE: &str = "target_altitude";
    pub const TARGET_APOAPSIS_TIME: &str = "target_apoapsis_time";
    pub const TURN_START_ALTITUDE: &str = "turn_start_altitude";
    pub const TURN_START_SPEED: &str = "turn_start_speed";
    pub const TURN_END_ALTITUDE: &str = "turn_end_altitude";
    pub const TURN_PROFILE: &str = "turn_profile";
    pub const MIN_PITCH: &str = "min_pitch";
    pub const HEADING: &str = "heading";
    pub const MAX_AUTOSTAGE: &str = "max_autostage";
    pub const USE_RCS: &str = "use_rcs";
    pub const LEAD_TIME: &str = "lead_time";
    pub const STAGE_WAIT: &str = "stage_wait";
    pub const PRELAUNCH_TIMEOUT: &str = "prelaunch_timeout";
    pub const PITCH_CORRECTION: &str = "pitch_correction";
    pub const CORRECTION_THROTTLE: &str = "correction_throttle";
    pub const HIGH_ALTITUDE_PRESSURE: &str = "high_altitude_pressure";
    pub const HIGH_ALTITUDE_APOAPSIS_TIME: &str = "high_altitude_apoapsis_time";
    pub const COMPLETION_DELAY: &str = "completion_delay";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Number,
    Flag,
    Text,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKind::Number => f.write_str("number"),
            ParamKind::Flag => f.write_str("flag"),
            ParamKind::Text => f.write_str("text"),
        }
    }
}

/// One parameter value. Text also carries references such as step names.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl ParamValue {
    pub fn kind(&self) -> ParamKind {
        match self {
            ParamValue::Number(_) => ParamKind::Number,
            ParamValue::Flag(_) => ParamKind::Flag,
            ParamValue::Text(_) => ParamKind::Text,
        }
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Number(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Number(f64::from(v))
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Flag(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

/// The mission's parameter set.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Parameters {
    values: BTreeMap<String, ParamValue>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.values.insert(key.into(), value.into());
    }

    /// Insert only when the key is not yet present.
    pub fn set_default(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.values.entry(key.into()).or_insert_with(|| value.into());
    }

    /// Add every entry of `defaults` whose key is not yet present.
    pub fn fill_defaults(&mut self, defaults: &Parameters) {
        for (key, value) in &defaults.values {
            self.values.entry(key.clone()).or_insert_with(|| value.clone());
        }
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        self.values.remove(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn number(&self, key: &str) -> Result<f64> {
        match self.require(key)? {
            ParamValue::Number(v) => Ok(*v),
            other => Err(type_error(key, ParamKind::Number, other)),
        }
    }

    /// Numeric value, or `default` when the key is absent.
    pub fn number_or(&self, key: &str, default: f64) -> Result<f64> {
        if self.contains(key) {
            self.number(key)
        } else {
            Ok(default)
        }
    }

    pub fn flag(&self, key: &str) -> Result<bool> {
        match self.require(key)? {
            ParamValue::Flag(v) => Ok(*v),
            other => Err(type_error(key, ParamKind::Flag, other)),
        }
    }

    pub fn text(&self, key: &str) -> Result<&str> {
        match self.require(key)? {
            ParamValue::Text(v) => Ok(v.as_str()),
            other => Err(type_error(key, ParamKind::Text, other)),
        }
    }

    /// Apply `overrides` on top of `self` (overrides win). An override whose
    /// kind differs from the value it replaces is rejected.
    pub fn layer(&mut self, overrides: &Parameters) -> Result<()> {
        for (key, value) in &overrides.values {
            if let Some(existing) = self.values.get(key) {
                if existing.kind() != value.kind() {
                    return Err(type_error(key, existing.kind(), value));
                }
            }
            self.values.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    fn require(&self, key: &str) -> Result<&ParamValue> {
        self.values
            .get(key)
            .ok_or_else(|| MissionError::MissingParameter(key.to_string()))
    }
}

fn type_error(key: &str, expected: ParamKind, found: &ParamValue) -> MissionError {
    MissionError::ParameterType {
        key: key.to_string(),
        expected,
        found: found.kind(),
    }
}
