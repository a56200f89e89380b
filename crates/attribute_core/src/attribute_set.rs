//! Health attributes for one character, plus the change journal a
//! replication layer reads from.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::attribute::{BoundedAttribute, Observer, ValueChange};
use crate::error::{ensure_non_negative, AttributeError, AttributeResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    CurrentHealth,
    MaxHealth,
}

impl AttributeKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CurrentHealth => "current_health",
            Self::MaxHealth => "max_health",
        }
    }
}

/// One committed local mutation, ordered by `sequence`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttributeChange {
    pub sequence: u64,
    pub attribute: AttributeKind,
    pub old: f32,
    pub new: f32,
}

impl AttributeChange {
    pub fn delta(&self) -> f32 {
        self.new - self.old
    }
}

/// Wire form of the replicated health values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReplicatedHealth {
    pub current_health: f32,
    pub max_health: f32,
}

#[derive(Debug, Default)]
pub struct HealthAttributeSet {
    health: BoundedAttribute,
    next_sequence: u64,
    pending: Vec<AttributeChange>,
}

impl HealthAttributeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_health(&self) -> f32 {
        self.health.current()
    }

    pub fn max_health(&self) -> f32 {
        self.health.max()
    }

    pub fn base_health(&self) -> f32 {
        self.health.base()
    }

    pub fn health(&self) -> &BoundedAttribute {
        &self.health
    }

    pub fn register_health_observer(&mut self, observer: Observer) {
        self.health.register_observer(observer);
    }

    pub fn clear_health_observer(&mut self) {
        self.health.clear_observer();
    }

    pub fn set_current_health(&mut self, value: f32) -> AttributeResult<Option<ValueChange>> {
        let change = self.health.set_current(value)?;
        if let Some(change) = change {
            self.record(AttributeKind::CurrentHealth, change);
        }
        Ok(change)
    }

    /// Journals the max change first, then the re-clamp of current health if
    /// the new bound forced one.
    pub fn set_max_health(&mut self, value: f32) -> AttributeResult<Option<ValueChange>> {
        let old_max = self.health.max();
        let clamped = self.health.set_max(value)?;
        if old_max != self.health.max() {
            self.record(
                AttributeKind::MaxHealth,
                ValueChange {
                    old: old_max,
                    new: self.health.max(),
                },
            );
        }
        if let Some(change) = clamped {
            self.record(AttributeKind::CurrentHealth, change);
        }
        Ok(clamped)
    }

    pub fn set_base_health(&mut self, value: f32) -> AttributeResult<f32> {
        self.health.set_base(value)
    }

    pub fn pending_replication(&self) -> &[AttributeChange] {
        &self.pending
    }

    pub fn drain_replication(&mut self) -> Vec<AttributeChange> {
        std::mem::take(&mut self.pending)
    }

    pub fn snapshot(&self) -> ReplicatedHealth {
        ReplicatedHealth {
            current_health: self.current_health(),
            max_health: self.max_health(),
        }
    }

    /// Reconciles against values received from the authority. Both values are
    /// checked before anything is written, then they go through the normal
    /// setters so the observer sees remote changes exactly like local ones.
    pub fn apply_replicated(&mut self, incoming: &ReplicatedHealth) -> AttributeResult<()> {
        if let Err(err) = validate_snapshot(incoming) {
            warn!(target: "attribute_core.replication", %err, "rejected replicated health");
            return Err(err);
        }
        self.set_max_health(incoming.max_health)?;
        self.set_current_health(incoming.current_health)?;
        debug!(
            target: "attribute_core.replication",
            current = self.current_health(),
            max = self.max_health(),
            "replicated health applied"
        );
        Ok(())
    }

    fn record(&mut self, attribute: AttributeKind, change: ValueChange) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.pending.push(AttributeChange {
            sequence,
            attribute,
            old: change.old,
            new: change.new,
        });
    }
}

fn validate_snapshot(incoming: &ReplicatedHealth) -> AttributeResult<()> {
    ensure_non_negative("max", incoming.max_health)?;
    if incoming.current_health.is_nan() {
        return Err(AttributeError::invalid(
            "current",
            incoming.current_health,
            "must not be NaN",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn journal_orders_max_before_reclamp() {
        let mut set = HealthAttributeSet::new();
        set.set_current_health(80.0).unwrap();
        set.set_max_health(50.0).unwrap();

        let journal = set.drain_replication();
        let kinds: Vec<_> = journal.iter().map(|c| c.attribute).collect();
        assert_eq!(
            vec![
                AttributeKind::CurrentHealth,
                AttributeKind::MaxHealth,
                AttributeKind::CurrentHealth
            ],
            kinds
        );
        assert!(journal.windows(2).all(|w| w[0].sequence < w[1].sequence));
        assert_eq!(-30.0, journal[2].delta());
        assert!(set.pending_replication().is_empty());
    }

    #[test]
    fn unchanged_values_are_not_journaled() {
        let mut set = HealthAttributeSet::new();
        set.set_current_health(100.0).unwrap();
        set.set_max_health(100.0).unwrap();
        assert!(set.pending_replication().is_empty());
    }

    #[test]
    fn sequence_keeps_growing_across_drains() {
        let mut set = HealthAttributeSet::new();
        set.set_current_health(10.0).unwrap();
        let first = set.drain_replication();
        set.set_current_health(20.0).unwrap();
        let second = set.drain_replication();
        assert!(second[0].sequence > first[0].sequence);
    }

    #[test]
    fn replicated_values_fire_the_observer() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut set = HealthAttributeSet::new();
        set.register_health_observer(Box::new(move |old, new| {
            sink.lock().unwrap().push((old, new));
        }));

        set.apply_replicated(&ReplicatedHealth {
            current_health: 40.0,
            max_health: 60.0,
        })
        .unwrap();

        assert_eq!(40.0, set.current_health());
        assert_eq!(60.0, set.max_health());
        assert_eq!(vec![(100.0, 60.0), (60.0, 40.0)], *seen.lock().unwrap());
        assert_eq!(
            ReplicatedHealth {
                current_health: 40.0,
                max_health: 60.0
            },
            set.snapshot()
        );
    }

    #[test]
    fn cleared_observer_still_journals() {
        let calls = Arc::new(Mutex::new(0usize));
        let counter = Arc::clone(&calls);
        let mut set = HealthAttributeSet::new();
        set.register_health_observer(Box::new(move |_, _| {
            *counter.lock().unwrap() += 1;
        }));
        assert!(set.health().has_observer());

        set.clear_health_observer();
        assert!(!set.health().has_observer());
        set.set_current_health(25.0).unwrap();
        assert_eq!(0, *calls.lock().unwrap());
        assert_eq!(1, set.pending_replication().len());
    }

    #[test]
    fn bad_snapshot_leaves_state_untouched() {
        let mut set = HealthAttributeSet::new();
        let err = set
            .apply_replicated(&ReplicatedHealth {
                current_health: f32::NAN,
                max_health: 10.0,
            })
            .unwrap_err();
        assert!(matches!(err, AttributeError::InvalidArgument { .. }));
        assert_eq!(100.0, set.max_health());
        assert!(set.pending_replication().is_empty());
    }
}
