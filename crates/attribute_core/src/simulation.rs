//! Scripted runs against a single character, used by the CLI and by
//! regression tests.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::attribute_set::ReplicatedHealth;
use crate::character::Character;
use crate::defaults::DefaultAttributes;
use crate::error::AttributeResult;
use crate::report::{SimulationReport, StepOutcome, StepRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOp {
    SetCurrent,
    SetMax,
    Damage,
    Heal,
}

impl StepOp {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SetCurrent => "set_current",
            Self::SetMax => "set_max",
            Self::Damage => "damage",
            Self::Heal => "heal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScriptStep {
    pub op: StepOp,
    pub value: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationScript {
    #[serde(default, rename = "step")]
    pub steps: Vec<ScriptStep>,
}

impl SimulationScript {
    pub fn from_path(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read script at {}", path.display()))?;
        let script: SimulationScript = toml::from_str(&data)
            .with_context(|| format!("invalid script in {}", path.display()))?;
        Ok(script)
    }

    pub fn push(&mut self, op: StepOp, value: f32) -> &mut Self {
        self.steps.push(ScriptStep { op, value });
        self
    }
}

pub fn run_simulation(
    defaults: &DefaultAttributes,
    script: &SimulationScript,
    run_id: impl Into<String>,
) -> Result<SimulationReport> {
    let mut character = Character::new("simulated");
    character.begin_play(Some(defaults))?;
    // Initialization is not part of the run's replication stream.
    character.attributes_mut().drain_replication();
    let initial = character.attributes().snapshot();

    let mut steps = Vec::with_capacity(script.steps.len());
    let mut health_events = Vec::new();
    for (index, step) in script.steps.iter().enumerate() {
        let outcome = match apply_step(&mut character, step) {
            Ok(()) => StepOutcome::Applied,
            Err(err) => {
                warn!(target: "attribute_core.simulation", index, %err, "step rejected");
                StepOutcome::Rejected {
                    reason: err.to_string(),
                }
            }
        };
        let events = character.take_health_events();
        steps.push(StepRecord {
            index,
            step: *step,
            outcome,
            after: character.attributes().snapshot(),
            notifications: events.len(),
        });
        health_events.extend(events);
    }

    let replication = character.attributes_mut().drain_replication();
    let final_state: ReplicatedHealth = character.attributes().snapshot();
    info!(
        target: "attribute_core.simulation",
        steps = steps.len(),
        notifications = health_events.len(),
        current = final_state.current_health,
        max = final_state.max_health,
        "simulation finished"
    );

    Ok(SimulationReport::new(
        run_id,
        initial,
        final_state,
        character.is_dead(),
        steps,
        health_events,
        replication,
    ))
}

fn apply_step(character: &mut Character, step: &ScriptStep) -> AttributeResult<()> {
    match step.op {
        StepOp::SetCurrent => character.attributes_mut().set_current_health(step.value)?,
        StepOp::SetMax => character.attributes_mut().set_max_health(step.value)?,
        StepOp::Damage => character.apply_damage(step.value)?,
        StepOp::Heal => character.heal(step.value)?,
    };
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ReportStatus;

    #[test]
    fn script_parses_step_tables() {
        let script: SimulationScript = toml::from_str(
            r#"
            [[step]]
            op = "damage"
            value = 30.0

            [[step]]
            op = "set_max"
            value = 50.0
            "#,
        )
        .unwrap();
        assert_eq!(2, script.steps.len());
        assert_eq!(StepOp::SetMax, script.steps[1].op);
    }

    #[test]
    fn rejected_steps_do_not_stop_the_run() {
        let mut script = SimulationScript::default();
        script
            .push(StepOp::SetCurrent, 30.0)
            .push(StepOp::SetMax, -4.0)
            .push(StepOp::SetMax, 20.0);

        let report = run_simulation(&DefaultAttributes::default(), &script, "t").unwrap();
        assert_eq!(20.0, report.final_state.current_health);
        assert!(matches!(
            report.steps[1].outcome,
            StepOutcome::Rejected { .. }
        ));
        assert_eq!(ReportStatus::Warn, report.summary.status);
        assert_eq!(2, report.health_events.len());
        // current 100->30, max 100->20, current 30->20
        assert_eq!(3, report.replication.len());
    }

    #[test]
    fn clean_run_passes() {
        let mut script = SimulationScript::default();
        script.push(StepOp::Damage, 150.0);
        let report = run_simulation(&DefaultAttributes::default(), &script, "t").unwrap();
        assert_eq!(ReportStatus::Pass, report.summary.status);
        assert!(report.summary.dead);
        assert_eq!(100.0, report.initial.current_health);
    }
}
