use std::time::Duration;

use tracing::{info, warn};

use crate::error::Result;
use crate::mission::runner::{Mission, TickOutcome};
use crate::vehicle::Vessel;

/// How long the driver waits between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pacing {
    /// Tick again as soon as the previous tick returns.
    #[default]
    Immediate,
    /// Sleep a fixed wall-clock interval between ticks.
    Fixed(Duration),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverReport {
    pub ticks: u64,
    pub finished: bool,
    pub final_step: String,
}

/// Calls `tick()` in a loop until the mission stops or the tick cap is hit.
#[derive(Debug, Clone, Default)]
pub struct Driver {
    pub pacing: Pacing,
    pub max_ticks: Option<u64>,
}

impl Driver {
    pub fn new(pacing: Pacing) -> Self {
        Self { pacing, max_ticks: None }
    }

    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = Some(max_ticks);
        self
    }

    /// Start `mission` at `start` (or its first step) and tick it to completion.
    /// `between` runs after every tick that leaves the mission running.
    pub fn run<V, F>(&self, mission: &mut Mission<V>, start: Option<&str>, mut between: F) -> Result<DriverReport>
    where
        V: Vessel,
        F: FnMut(&mut V),
    {
        mission.start(start)?;
        let mut ticks = 0u64;

        loop {
            if self.max_ticks.is_some_and(|cap| ticks >= cap) {
                warn!(ticks, step = %mission.current_step(), "Tick budget exhausted before mission end");
                break;
            }

            ticks += 1;
            match mission.tick()? {
                TickOutcome::Continue => {}
                TickOutcome::Finished | TickOutcome::Idle => break,
            }

            between(mission.vessel_mut());
            if let Pacing::Fixed(interval) = self.pacing {
                std::thread::sleep(interval);
            }
        }

        let report = DriverReport {
            ticks,
            finished: mission.is_done(),
            final_step: mission.current_step().to_string(),
        };
        info!(ticks = report.ticks, finished = report.finished, step = %report.final_step, "Driver stopped");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mission::context::MissionContext;
    use crate::mission::step::step_fn;
    use crate::testing::ScriptedVessel;

    fn timed_mission(hold: f64) -> Mission<ScriptedVessel> {
        Mission::builder(ScriptedVessel::default())
            .step(step_fn("wait", move |ctx: &mut MissionContext<ScriptedVessel>| {
                if ctx.elapsed_in_step() >= hold {
                    ctx.advance();
                }
                Ok(())
            }))
            .build()
            .unwrap()
    }

    #[test]
    fn runs_until_finished() {
        let mut mission = timed_mission(1.0);
        let report = Driver::default()
            .run(&mut mission, None, |v: &mut ScriptedVessel| v.ut += 0.25)
            .unwrap();
        assert!(report.finished);
        assert_eq!(report.ticks, 5);
        assert_eq!(report.final_step, "wait");
    }

    #[test]
    fn tick_cap_stops_early() {
        let mut mission = timed_mission(100.0);
        let report = Driver::default()
            .with_max_ticks(10)
            .run(&mut mission, None, |v: &mut ScriptedVessel| v.ut += 0.1)
            .unwrap();
        assert!(!report.finished);
        assert_eq!(report.ticks, 10);
        assert!(mission.is_running());
    }

    #[test]
    fn fixed_pacing_sleeps_between_ticks() {
        let mut mission = timed_mission(0.5);
        let started = std::time::Instant::now();
        let report = Driver::new(Pacing::Fixed(Duration::from_millis(2)))
            .run(&mut mission, None, |v: &mut ScriptedVessel| v.ut += 0.25)
            .unwrap();
        assert_eq!(report.ticks, 3);
        assert!(started.elapsed() >= Duration::from_millis(4));
    }
}
