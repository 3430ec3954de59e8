use tracing::info;

use crate::error::Result;
use crate::mission::{keys, MissionContext, Parameters};
use crate::steps::{defaults, scratch};
use crate::vehicle::Vessel;

/// Parameters read by [`auto_stage`] and [`stage_if_ready`].
pub fn staging_defaults() -> Parameters {
    Parameters::new()
        .with(keys::MAX_AUTOSTAGE, defaults::MAX_AUTOSTAGE)
        .with(keys::STAGE_WAIT, defaults::STAGE_WAIT)
}

/// Trigger the next stage unless one was triggered less than `stage_wait`
/// seconds ago. Returns whether a stage was activated.
pub fn stage_if_ready<V: Vessel>(ctx: &mut MissionContext<V>) -> Result<bool> {
    let wait = ctx.params.number(keys::STAGE_WAIT)?;
    let now = ctx.vessel.ut();
    if let Some(last) = ctx.scratch.find::<f64>(scratch::LAST_STAGING) {
        if now - last < wait {
            return Ok(false);
        }
    }

    ctx.vessel.activate_next_stage();
    ctx.scratch.insert(scratch::LAST_STAGING, now);
    info!(stage = ctx.vessel.current_stage(), ut = now, "Staging");
    Ok(true)
}

/// Stage when the active engines have no thrust left and the current stage
/// number is still above `max_autostage`.
pub fn auto_stage<V: Vessel>(ctx: &mut MissionContext<V>) -> Result<bool> {
    let max_autostage = ctx.params.number(keys::MAX_AUTOSTAGE)?;
    if ctx.vessel.available_thrust() > 0.0 || f64::from(ctx.vessel.current_stage()) <= max_autostage {
        return Ok(false);
    }
    stage_if_ready(ctx)
}
