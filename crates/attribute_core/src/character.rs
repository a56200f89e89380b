//! The owning side of a health attribute set.
//!
//! The attribute set only manages numbers. Everything that reacts to a change
//! (building the delta broadcast, deciding that a character died) runs inside
//! the health observer, on the caller's thread, before the setter returns.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::attribute::ValueChange;
use crate::attribute_set::HealthAttributeSet;
use crate::defaults::DefaultAttributes;
use crate::error::{ensure_non_negative, AttributeResult};

/// Broadcast for every committed change to current health.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthChanged {
    pub old: f32,
    pub new: f32,
    pub delta: f32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// State the health observer writes to. `tags` holds the tags of the write
/// in progress and is empty between writes.
#[derive(Debug, Default)]
struct HealthState {
    dead: bool,
    tags: Vec<String>,
    events: Vec<HealthChanged>,
}

impl HealthState {
    fn handle_health_changed(&mut self, character: &str, change: ValueChange) {
        let delta = change.delta();
        debug!(
            target: "attribute_core.character",
            character,
            old = change.old,
            new = change.new,
            delta,
            "health changed"
        );
        if !self.dead && change.new <= 0.0 {
            self.dead = true;
            info!(target: "attribute_core.character", character, "character died");
        } else if self.dead && change.new > 0.0 {
            self.dead = false;
            info!(target: "attribute_core.character", character, "character revived");
        }
        self.events.push(HealthChanged {
            old: change.old,
            new: change.new,
            delta,
            tags: self.tags.clone(),
        });
    }
}

fn lock(state: &Mutex<HealthState>) -> MutexGuard<'_, HealthState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug)]
pub struct Character {
    name: String,
    attributes: HealthAttributeSet,
    state: Arc<Mutex<HealthState>>,
}

impl Character {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: HealthAttributeSet::new(),
            state: Arc::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &HealthAttributeSet {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut HealthAttributeSet {
        &mut self.attributes
    }

    pub fn is_dead(&self) -> bool {
        lock(&self.state).dead
    }

    /// Applies defaults, then starts listening. Whatever initialization
    /// changes is not broadcast. The observer is bound even when the
    /// defaults are rejected, and the rejection is returned afterwards.
    pub fn begin_play(&mut self, defaults: Option<&DefaultAttributes>) -> AttributeResult<()> {
        let initialized = self.initialize_attributes(defaults);
        let state = Arc::clone(&self.state);
        let name = self.name.clone();
        self.attributes
            .register_health_observer(Box::new(move |old, new| {
                lock(&state).handle_health_changed(&name, ValueChange { old, new });
            }));
        initialized
    }

    pub fn initialize_attributes(
        &mut self,
        defaults: Option<&DefaultAttributes>,
    ) -> AttributeResult<()> {
        let Some(defaults) = defaults else {
            warn!(
                target: "attribute_core.character",
                character = %self.name,
                "initialize_attributes called without defaults"
            );
            return Ok(());
        };
        defaults.validate()?;

        let health = &defaults.health;
        self.attributes.set_max_health(health.max)?;
        self.attributes.set_base_health(health.base())?;
        self.attributes.set_current_health(health.current())?;
        info!(
            target: "attribute_core.character",
            character = %self.name,
            "initial health set to {:.0} / {:.0}",
            self.attributes.current_health(),
            self.attributes.max_health()
        );
        Ok(())
    }

    pub fn apply_damage(&mut self, amount: f32) -> AttributeResult<Option<ValueChange>> {
        self.apply_damage_tagged(amount, Vec::new())
    }

    /// Damage whose broadcast carries `tags` (damage type, source, ...).
    pub fn apply_damage_tagged(
        &mut self,
        amount: f32,
        tags: Vec<String>,
    ) -> AttributeResult<Option<ValueChange>> {
        let amount = ensure_non_negative("damage", amount)?;
        let target = self.attributes.current_health() - amount;
        self.set_current_tagged(target, tags)
    }

    pub fn heal(&mut self, amount: f32) -> AttributeResult<Option<ValueChange>> {
        self.heal_tagged(amount, Vec::new())
    }

    pub fn heal_tagged(
        &mut self,
        amount: f32,
        tags: Vec<String>,
    ) -> AttributeResult<Option<ValueChange>> {
        let amount = ensure_non_negative("heal", amount)?;
        let target = self.attributes.current_health() + amount;
        self.set_current_tagged(target, tags)
    }

    /// Hands out the broadcasts built so far, oldest first.
    pub fn take_health_events(&mut self) -> Vec<HealthChanged> {
        std::mem::take(&mut lock(&self.state).events)
    }

    // The lock must be released before the setter runs: the observer takes it.
    fn set_current_tagged(
        &mut self,
        target: f32,
        tags: Vec<String>,
    ) -> AttributeResult<Option<ValueChange>> {
        lock(&self.state).tags = tags;
        let result = self.attributes.set_current_health(target);
        lock(&self.state).tags.clear();
        result
    }
}
