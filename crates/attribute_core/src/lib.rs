//! Bounded health attributes with change notification.
//!
//! [`BoundedAttribute`] keeps a value inside `[0, max]` and calls one observer
//! with `(old, new)` whenever the value moves. [`HealthAttributeSet`] wraps it
//! with a replication journal, and [`Character`] owns a set and turns observer
//! calls into [`HealthChanged`] broadcasts.

pub mod attribute;
pub mod attribute_set;
pub mod character;
pub mod check;
pub mod defaults;
pub mod error;
pub mod report;
pub mod shared;
pub mod simulation;

pub use attribute::{BoundedAttribute, Observer, ValueChange, DEFAULT_ATTRIBUTE_VALUE};
pub use attribute_set::{AttributeChange, AttributeKind, HealthAttributeSet, ReplicatedHealth};
pub use character::{Character, HealthChanged};
pub use check::{check_defaults_dir, DefaultsCheck, FileCheck};
pub use defaults::{DefaultAttributes, HealthDefaults, TelemetryConfig};
pub use error::{AttributeError, AttributeResult};
pub use report::{ReportStatus, ReportSummary, SimulationReport, StepOutcome, StepRecord};
pub use shared::SharedAttribute;
pub use simulation::{run_simulation, ScriptStep, SimulationScript, StepOp};
