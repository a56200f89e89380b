//! Helpers for deterministic regression tests.

use std::fmt::Write;

use attribute_core::{SimulationReport, SimulationScript, StepOp, StepOutcome};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const DEFAULT_SEED: u64 = 42;

/// A reproducible mix of damage, heals and bound changes.
pub fn seeded_script(seed: u64, steps: usize) -> SimulationScript {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut script = SimulationScript::default();
    for _ in 0..steps {
        let (op, value) = match rng.gen_range(0..10) {
            0..=4 => (StepOp::Damage, rng.gen_range(1..=40) as f32),
            5..=6 => (StepOp::Heal, rng.gen_range(1..=30) as f32),
            7 => (StepOp::SetMax, rng.gen_range(20..=200) as f32),
            _ => (StepOp::SetCurrent, rng.gen_range(-50..=250) as f32),
        };
        script.push(op, value);
    }
    script
}

/// Plain-text rendering of a report, stable across runs (no id or timestamp).
pub fn render_trace(report: &SimulationReport) -> String {
    let mut out = String::new();
    for record in &report.steps {
        let outcome = match &record.outcome {
            StepOutcome::Applied => "applied".to_string(),
            StepOutcome::Rejected { reason } => format!("rejected: {reason}"),
        };
        let _ = writeln!(
            out,
            "#{} {} {:.1} => {:.1}/{:.1} {} ({})",
            record.index,
            record.step.op.as_str(),
            record.step.value,
            record.after.current_health,
            record.after.max_health,
            outcome,
            record.notifications
        );
    }
    out.push_str("events:\n");
    for event in &report.health_events {
        let _ = writeln!(out, "{:.1} -> {:.1} ({:+.1})", event.old, event.new, event.delta);
    }
    out.push_str("replication:\n");
    for change in &report.replication {
        let _ = writeln!(
            out,
            "{} {} {:.1} -> {:.1}",
            change.sequence,
            change.attribute.as_str(),
            change.old,
            change.new
        );
    }
    let _ = write!(
        out,
        "final: {:.1}/{:.1} dead={}",
        report.final_state.current_health, report.final_state.max_health, report.summary.dead
    );
    out
}
