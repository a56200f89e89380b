use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::attribute::DEFAULT_ATTRIBUTE_VALUE;
use crate::error::{ensure_non_negative, AttributeError, AttributeResult};

/// Designer-tuned starting stats, loaded from a TOML file.
///
/// `[health]` is required and unknown keys are rejected, so a file written
/// for something else (a step script, say) does not pass as defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct DefaultAttributes {
    pub health: HealthDefaults,
    #[serde(default)]
    pub telemetry: Option<TelemetryConfig>,
}

impl DefaultAttributes {
    pub fn from_path(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read defaults at {}", path.display()))?;
        Self::from_toml_str(&data)
            .with_context(|| format!("invalid defaults in {}", path.display()))
    }

    pub fn from_toml_str(data: &str) -> Result<Self> {
        let defaults: DefaultAttributes = toml::from_str(data)?;
        defaults.validate()?;
        Ok(defaults)
    }

    pub fn validate(&self) -> AttributeResult<()> {
        self.health.validate()
    }

    pub fn trace_filter(&self) -> Option<&str> {
        self.telemetry
            .as_ref()
            .and_then(|t| t.trace_filter.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HealthDefaults {
    pub max: f32,
    #[serde(default)]
    pub base: Option<f32>,
    #[serde(default)]
    pub current: Option<f32>,
}

impl HealthDefaults {
    pub fn base(&self) -> f32 {
        self.base.unwrap_or(self.max)
    }

    pub fn current(&self) -> f32 {
        self.current.unwrap_or_else(|| self.base())
    }

    fn validate(&self) -> AttributeResult<()> {
        let max = ensure_non_negative("max", self.max)?;
        let base = ensure_non_negative("base", self.base())?;
        let current = ensure_non_negative("current", self.current())?;
        if base > max {
            return Err(AttributeError::invalid("base", base, "must not exceed max"));
        }
        if current > max {
            return Err(AttributeError::invalid("current", current, "must not exceed max"));
        }
        Ok(())
    }
}

impl Default for HealthDefaults {
    fn default() -> Self {
        Self {
            max: DEFAULT_ATTRIBUTE_VALUE,
            base: None,
            current: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TelemetryConfig {
    #[serde(default)]
    pub trace_filter: Option<String>,
}
