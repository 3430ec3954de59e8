use tracing::{debug, info};

use crate::error::{MissionError, Result};
use crate::mission::context::MissionContext;
use crate::mission::event::{Event, EventOutcome, EventTable};
use crate::mission::params::{ParamValue, Parameters};
use crate::mission::step::Step;
use crate::vehicle::Vessel;

/// Result of one call to [`Mission::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The mission was not running; nothing happened.
    Idle,
    /// The mission is still running.
    Continue,
    /// The mission stopped during this tick.
    Finished,
}

// ---------------------------------------------------------------------------
// Mission: ordered steps driven one tick at a time
// ---------------------------------------------------------------------------

pub struct Mission<V> {
    name: String,
    steps: Vec<Box<dyn Step<V>>>,
    ctx: MissionContext<V>,
    ticks: u64,
}

impl<V: Vessel> Mission<V> {
    pub fn builder(vessel: V) -> MissionBuilder<V> {
        MissionBuilder::new(vessel)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Begin at the first declared step, or at `step` to resume mid-sequence.
    pub fn start(&mut self, step: Option<&str>) -> Result<()> {
        let index = match step {
            None => 0,
            Some(id) => self
                .steps
                .iter()
                .position(|s| s.name() == id)
                .ok_or_else(|| MissionError::UnknownStep(id.to_string()))?,
        };
        self.ctx.start_at(index);
        Ok(())
    }

    /// Run the current step once, then evaluate the event table.
    ///
    /// Step and event errors propagate unchanged; the mission state is left
    /// as it was at the failure point.
    pub fn tick(&mut self) -> Result<TickOutcome> {
        if !self.ctx.is_running() {
            return Ok(TickOutcome::Idle);
        }
        self.ticks += 1;

        let transitions = self.ctx.transitions();
        let index = self.ctx.step_state().index();
        self.steps[index].run(&mut self.ctx)?;

        // a fresh transition keeps first_call for the entered step's next tick
        if self.ctx.transitions() == transitions {
            self.ctx.clear_first_call();
        }

        if self.fire_events()? == EventOutcome::Halt {
            info!(step = %self.ctx.current_step(), "Mission halted by event");
            self.ctx.terminate();
        }

        Ok(if self.ctx.is_running() {
            TickOutcome::Continue
        } else {
            TickOutcome::Finished
        })
    }

    /// Evaluate events in insertion order against the post-step state.
    ///
    /// Events registered by actions wait for the next tick. A failing action
    /// leaves the table intact, its own event included.
    fn fire_events(&mut self) -> Result<EventOutcome> {
        let names: Vec<String> = self.ctx.events.names().map(str::to_owned).collect();
        let mut outcome = EventOutcome::Continue;

        for name in names {
            // removed by an earlier action
            let Some(mut event) = self.ctx.events.take(&name) else {
                continue;
            };
            if !event.check(&self.ctx) {
                self.ctx.events.restore(&name, event);
                continue;
            }

            debug!(event = %name, "Event fired");
            let fired = event.fire(&mut self.ctx);
            if event.is_persistent() || fired.is_err() {
                self.ctx.events.restore(&name, event);
            } else {
                self.ctx.events.retire(&name);
            }
            if fired? == EventOutcome::Halt {
                outcome = EventOutcome::Halt;
            }
        }

        Ok(outcome)
    }

    pub fn is_running(&self) -> bool {
        self.ctx.is_running()
    }

    pub fn is_done(&self) -> bool {
        self.ctx.is_done()
    }

    pub fn current_step(&self) -> &str {
        self.ctx.current_step()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn context(&self) -> &MissionContext<V> {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut MissionContext<V> {
        &mut self.ctx
    }

    pub fn vessel(&self) -> &V {
        &self.ctx.vessel
    }

    pub fn vessel_mut(&mut self) -> &mut V {
        &mut self.ctx.vessel
    }
}

// ---------------------------------------------------------------------------
// Mission builder
// ---------------------------------------------------------------------------

pub struct MissionBuilder<V> {
    name: String,
    vessel: V,
    steps: Vec<Box<dyn Step<V>>>,
    overrides: Parameters,
    events: EventTable<V>,
}

impl<V: Vessel> MissionBuilder<V> {
    pub fn new(vessel: V) -> Self {
        Self {
            name: "mission".into(),
            vessel,
            steps: vec![],
            overrides: Parameters::new(),
            events: EventTable::default(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn step(mut self, step: impl Step<V> + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    pub fn boxed_steps(mut self, steps: impl IntoIterator<Item = Box<dyn Step<V>>>) -> Self {
        self.steps.extend(steps);
        self
    }

    /// Caller overrides, layered over step defaults.
    pub fn params(mut self, params: Parameters) -> Self {
        for (key, value) in params.iter() {
            self.overrides.set(key, value.clone());
        }
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.overrides.set(key, value);
        self
    }

    pub fn event(mut self, name: impl Into<String>, event: Event<V>) -> Self {
        self.events.insert(name, event);
        self
    }

    /// Merge and validate parameters, then assemble the mission (not started).
    pub fn build(self) -> Result<Mission<V>> {
        if self.steps.is_empty() {
            return Err(MissionError::EmptySequence);
        }

        let mut sequence: Vec<String> = Vec::with_capacity(self.steps.len());
        for step in &self.steps {
            let name = step.name().to_string();
            if sequence.contains(&name) {
                return Err(MissionError::DuplicateStep(name));
            }
            sequence.push(name);
        }

        let mut params = Parameters::new();
        for step in &self.steps {
            params.fill_defaults(&step.defaults());
        }
        params.layer(&self.overrides)?;

        for step in &self.steps {
            if let Some(missing) = step.required().iter().find(|k| !params.contains(k)) {
                return Err(MissionError::MissingParameter(missing.to_string()));
            }
            step.validate(&params)?;
        }

        debug!(mission = %self.name, steps = sequence.len(), params = params.len(), "Mission built");

        Ok(Mission {
            name: self.name,
            steps: self.steps,
            ctx: MissionContext::new(self.vessel, params, self.events, sequence),
            ticks: 0,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
