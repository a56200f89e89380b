use std::path::PathBuf;

use attribute_core::{AttributeChange, Character, DefaultAttributes, HealthChanged};
use bevy::prelude::*;
use tracing::{debug, warn};

/// Characters wired into the ECS: defaults on spawn, damage and heal events
/// in, health broadcasts and replication records out.
pub struct CharacterPlugin;

impl Plugin for CharacterPlugin {
    fn build(&self, app: &mut App) {
        if !app.world().contains_resource::<CharacterDefaults>() {
            app.insert_resource(CharacterDefaults::from_env());
        }

        app.init_resource::<ReplicationOutbox>()
            .add_event::<DamageEvent>()
            .add_event::<HealEvent>()
            .add_event::<HealthChangedEvent>()
            .add_systems(
                Update,
                (
                    initialize_characters,
                    apply_health_events,
                    broadcast_health_changes,
                    collect_replication,
                )
                    .chain(),
            );
    }
}

#[derive(Resource, Clone, Debug, Default)]
pub struct CharacterDefaults(pub DefaultAttributes);

impl CharacterDefaults {
    /// Loads the file named by `CHARACTER_DEFAULTS`, falling back to the
    /// built-in values when unset or unreadable.
    pub fn from_env() -> Self {
        let Some(path) = std::env::var_os("CHARACTER_DEFAULTS").map(PathBuf::from) else {
            return Self::default();
        };
        match DefaultAttributes::from_path(&path) {
            Ok(defaults) => Self(defaults),
            Err(err) => {
                warn!(
                    target: "character_game.health",
                    path = %path.display(),
                    "falling back to built-in defaults: {err:#}"
                );
                Self::default()
            }
        }
    }
}

#[derive(Component, Debug)]
pub struct CharacterAttributes(pub Character);

impl CharacterAttributes {
    pub fn new(name: impl Into<String>) -> Self {
        Self(Character::new(name))
    }
}

/// Marker added once a character's health reaches zero.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dead;

#[derive(Event, Debug, Clone)]
pub struct DamageEvent {
    pub target: Entity,
    pub amount: f32,
    /// Copied onto the resulting `HealthChanged`.
    pub tags: Vec<String>,
}

#[derive(Event, Debug, Clone)]
pub struct HealEvent {
    pub target: Entity,
    pub amount: f32,
    /// Copied onto the resulting `HealthChanged`.
    pub tags: Vec<String>,
}

#[derive(Event, Debug, Clone)]
pub struct HealthChangedEvent {
    pub entity: Entity,
    pub change: HealthChanged,
}

/// Replication records waiting for a transport to pick them up.
#[derive(Resource, Debug, Default)]
pub struct ReplicationOutbox {
    pub pending: Vec<(Entity, AttributeChange)>,
}

impl ReplicationOutbox {
    pub fn drain(&mut self) -> Vec<(Entity, AttributeChange)> {
        std::mem::take(&mut self.pending)
    }
}

fn initialize_characters(
    defaults: Res<CharacterDefaults>,
    mut spawned: Query<(Entity, &mut CharacterAttributes), Added<CharacterAttributes>>,
) {
    for (entity, mut character) in spawned.iter_mut() {
        if let Err(err) = character.0.begin_play(Some(&defaults.0)) {
            warn!(target: "character_game.health", ?entity, %err, "character initialization failed");
        }
    }
}

fn apply_health_events(
    mut damage: EventReader<DamageEvent>,
    mut heals: EventReader<HealEvent>,
    mut characters: Query<&mut CharacterAttributes>,
) {
    for event in damage.read() {
        let Ok(mut character) = characters.get_mut(event.target) else {
            debug!(target: "character_game.health", entity = ?event.target, "damage for unknown character");
            continue;
        };
        let tags = event.tags.clone();
        if let Err(err) = character.0.apply_damage_tagged(event.amount, tags) {
            warn!(target: "character_game.health", entity = ?event.target, %err, "damage rejected");
        }
    }
    for event in heals.read() {
        let Ok(mut character) = characters.get_mut(event.target) else {
            debug!(target: "character_game.health", entity = ?event.target, "heal for unknown character");
            continue;
        };
        let tags = event.tags.clone();
        if let Err(err) = character.0.heal_tagged(event.amount, tags) {
            warn!(target: "character_game.health", entity = ?event.target, %err, "heal rejected");
        }
    }
}

fn broadcast_health_changes(
    mut commands: Commands,
    mut characters: Query<(Entity, &mut CharacterAttributes, Has<Dead>)>,
    mut changed: EventWriter<HealthChangedEvent>,
) {
    for (entity, mut character, marked_dead) in characters.iter_mut() {
        let character = &mut character.bypass_change_detection().0;
        let events = character.take_health_events();
        if events.is_empty() {
            continue;
        }
        for change in events {
            changed.send(HealthChangedEvent { entity, change });
        }
        match (character.is_dead(), marked_dead) {
            (true, false) => {
                commands.entity(entity).insert(Dead);
            }
            (false, true) => {
                commands.entity(entity).remove::<Dead>();
            }
            _ => {}
        }
    }
}

fn collect_replication(
    mut characters: Query<(Entity, &mut CharacterAttributes)>,
    mut outbox: ResMut<ReplicationOutbox>,
) {
    for (entity, mut character) in characters.iter_mut() {
        let attributes = character.bypass_change_detection().0.attributes_mut();
        if attributes.pending_replication().is_empty() {
            continue;
        }
        outbox
            .pending
            .extend(attributes.drain_replication().into_iter().map(|c| (entity, c)));
    }
}
