use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::attribute_set::{AttributeChange, ReplicatedHealth};
use crate::character::HealthChanged;
use crate::simulation::ScriptStep;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    pub id: String,
    pub timestamp: String,
    pub initial: ReplicatedHealth,
    pub final_state: ReplicatedHealth,
    pub summary: ReportSummary,
    pub steps: Vec<StepRecord>,
    pub health_events: Vec<HealthChanged>,
    pub replication: Vec<AttributeChange>,
}

impl SimulationReport {
    pub fn new(
        id: impl Into<String>,
        initial: ReplicatedHealth,
        final_state: ReplicatedHealth,
        dead: bool,
        steps: Vec<StepRecord>,
        health_events: Vec<HealthChanged>,
        replication: Vec<AttributeChange>,
    ) -> Self {
        let summary = summarize(&steps, &health_events, dead);
        Self {
            id: id.into(),
            timestamp: Utc::now().to_rfc3339(),
            initial,
            final_state,
            summary,
            steps,
            health_events,
            replication,
        }
    }
}

fn summarize(steps: &[StepRecord], events: &[HealthChanged], dead: bool) -> ReportSummary {
    let rejected = steps
        .iter()
        .filter(|s| matches!(s.outcome, StepOutcome::Rejected { .. }))
        .count();
    let status = if rejected > 0 {
        ReportStatus::Warn
    } else {
        ReportStatus::Pass
    };
    ReportSummary {
        status,
        applied: steps.len() - rejected,
        rejected,
        net_delta: events.iter().map(|e| e.delta).sum(),
        dead,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummary {
    pub status: ReportStatus,
    pub applied: usize,
    pub rejected: usize,
    pub net_delta: f32,
    pub dead: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Pass,
    Warn,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub index: usize,
    pub step: ScriptStep,
    pub outcome: StepOutcome,
    pub after: ReplicatedHealth,
    pub notifications: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StepOutcome {
    Applied,
    Rejected { reason: String },
}
