use std::any::Any;
use std::collections::HashMap;

use tracing::info;

use crate::error::{MissionError, Result};
use crate::mission::event::EventTable;
use crate::mission::params::Parameters;
use crate::vehicle::Telemetry;

// ---------------------------------------------------------------------------
// Step lifecycle
// ---------------------------------------------------------------------------

/// Which step is active and since when.
#[derive(Debug, Clone)]
pub struct StepState {
    pub(crate) index: usize,
    pub(crate) first_call: bool,
    pub(crate) entered_at: f64,
}

impl StepState {
    pub fn index(&self) -> usize {
        self.index
    }

    /// True exactly on the first tick after entering the step.
    pub fn first_call(&self) -> bool {
        self.first_call
    }

    pub fn entered_at(&self) -> f64 {
        self.entered_at
    }
}

// ---------------------------------------------------------------------------
// Scratch: auxiliary objects shared between ticks (PIDs, maneuver plans)
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct Scratch {
    entries: HashMap<String, Box<dyn Any>>,
}

impl Scratch {
    pub fn insert<T: Any>(&mut self, key: impl Into<String>, value: T) {
        self.entries.insert(key.into(), Box::new(value));
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Borrow an entry the caller expects to exist.
    pub fn get<T: Any>(&self, key: &str) -> Result<&T> {
        self.entries
            .get(key)
            .ok_or_else(|| MissionError::MissingScratch(key.to_string()))?
            .downcast_ref::<T>()
            .ok_or_else(|| MissionError::ScratchType(key.to_string()))
    }

    pub fn get_mut<T: Any>(&mut self, key: &str) -> Result<&mut T> {
        self.entries
            .get_mut(key)
            .ok_or_else(|| MissionError::MissingScratch(key.to_string()))?
            .downcast_mut::<T>()
            .ok_or_else(|| MissionError::ScratchType(key.to_string()))
    }

    /// Like `get`, but absence is not an error.
    pub fn find<T: Any>(&self, key: &str) -> Option<&T> {
        self.entries.get(key).and_then(|v| v.downcast_ref::<T>())
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for Scratch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<_> = self.entries.keys().collect();
        keys.sort();
        f.debug_struct("Scratch").field("keys", &keys).finish()
    }
}

// ---------------------------------------------------------------------------
// Mission context
// ---------------------------------------------------------------------------

/// All mutable mission state. Steps and event actions get it by exclusive
/// reference for the duration of their call.
pub struct MissionContext<V> {
    pub vessel: V,
    pub params: Parameters,
    pub scratch: Scratch,
    pub events: EventTable<V>,
    sequence: Vec<String>,
    state: StepState,
    running: bool,
    done: bool,
    transitions: u64,
}

impl<V: Telemetry> MissionContext<V> {
    pub(crate) fn new(vessel: V, params: Parameters, events: EventTable<V>, sequence: Vec<String>) -> Self {
        Self {
            vessel,
            params,
            scratch: Scratch::default(),
            events,
            sequence,
            state: StepState { index: 0, first_call: true, entered_at: 0.0 },
            running: false,
            done: false,
            transitions: 0,
        }
    }

    pub fn current_step(&self) -> &str {
        &self.sequence[self.state.index]
    }

    pub fn step_state(&self) -> &StepState {
        &self.state
    }

    pub fn first_call(&self) -> bool {
        self.state.first_call
    }

    /// Seconds of simulated time spent in the current step.
    pub fn elapsed_in_step(&self) -> f64 {
        self.vessel.ut() - self.state.entered_at
    }

    pub fn sequence(&self) -> &[String] {
        &self.sequence
    }

    pub fn has_step(&self, id: &str) -> bool {
        self.sequence.iter().any(|s| s == id)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Number of transitions so far.
    pub fn transitions(&self) -> u64 {
        self.transitions
    }

    /// Switch to `target`, or to the next declared step when `None`
    /// (terminating after the last one).
    pub fn transition(&mut self, target: Option<&str>) -> Result<()> {
        match target {
            Some(id) => self.transition_to(id),
            None => {
                self.advance_with(true);
                Ok(())
            }
        }
    }

    pub fn transition_to(&mut self, id: &str) -> Result<()> {
        let index = self
            .sequence
            .iter()
            .position(|s| s == id)
            .ok_or_else(|| MissionError::UnknownStep(id.to_string()))?;
        self.enter(index);
        Ok(())
    }

    /// Move to the next declared step; terminate after the last.
    pub fn advance(&mut self) {
        self.advance_with(true);
    }

    /// Move to the next declared step. At the last step the mission either
    /// terminates or, with `auto_terminate = false`, stays put.
    pub fn advance_with(&mut self, auto_terminate: bool) {
        let next = self.state.index + 1;
        if next < self.sequence.len() {
            self.enter(next);
        } else if auto_terminate {
            self.terminate();
        }
    }

    /// Go to `id` when this mission declares it, otherwise advance in order.
    pub fn jump_or_advance(&mut self, id: &str) {
        match self.sequence.iter().position(|s| s == id) {
            Some(index) => self.enter(index),
            None => self.advance(),
        }
    }

    pub fn terminate(&mut self) {
        if self.running {
            info!(step = %self.current_step(), "Terminating mission");
        }
        self.running = false;
        self.done = true;
    }

    pub(crate) fn start_at(&mut self, index: usize) {
        self.state = StepState {
            index,
            first_call: true,
            entered_at: self.vessel.ut(),
        };
        self.running = true;
        self.done = false;
        info!(step = %self.current_step(), "Starting mission");
    }

    pub(crate) fn clear_first_call(&mut self) {
        self.state.first_call = false;
    }

    fn enter(&mut self, index: usize) {
        self.state = StepState {
            index,
            first_call: true,
            entered_at: self.vessel.ut(),
        };
        self.transitions += 1;
        info!(step = %self.current_step(), "Switching to step");
    }
}
