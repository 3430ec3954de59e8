use crate::error::Result;
use crate::mission::context::MissionContext;
use crate::mission::params::Parameters;

/// A named phase of a mission.
///
/// `run` is called once per tick while the step is current. It may change the
/// context, command the vessel and request a transition.
pub trait Step<V> {
    fn name(&self) -> &str;

    /// Parameter defaults this step declares. Caller overrides win.
    fn defaults(&self) -> Parameters {
        Parameters::new()
    }

    /// Keys that must be present once defaults and overrides are merged.
    fn required(&self) -> &[&'static str] {
        &[]
    }

    /// Check derived constraints on the merged parameters at build time.
    fn validate(&self, _params: &Parameters) -> Result<()> {
        Ok(())
    }

    fn run(&mut self, ctx: &mut MissionContext<V>) -> Result<()>;
}

/// A step backed by a closure.
pub struct FnStep<F> {
    name: String,
    handler: F,
    defaults: Parameters,
}

impl<F> FnStep<F> {
    pub fn new(name: impl Into<String>, handler: F) -> Self {
        Self { name: name.into(), handler, defaults: Parameters::new() }
    }

    pub fn with_defaults(mut self, defaults: Parameters) -> Self {
        self.defaults = defaults;
        self
    }
}

impl<V, F> Step<V> for FnStep<F>
where
    F: FnMut(&mut MissionContext<V>) -> Result<()>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn defaults(&self) -> Parameters {
        self.defaults.clone()
    }

    fn run(&mut self, ctx: &mut MissionContext<V>) -> Result<()> {
        (self.handler)(ctx)
    }
}

/// Shorthand for [`FnStep::new`].
pub fn step_fn<V, F>(name: impl Into<String>, handler: F) -> FnStep<F>
where
    F: FnMut(&mut MissionContext<V>) -> Result<()>,
{
    FnStep::new(name, handler)
}
