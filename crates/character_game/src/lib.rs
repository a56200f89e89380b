//! Bevy integration for health attributes.

pub mod health;

pub use health::{
    CharacterAttributes, CharacterDefaults, CharacterPlugin, DamageEvent, Dead, HealEvent,
    HealthChangedEvent, ReplicationOutbox,
};
