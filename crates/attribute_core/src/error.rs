use thiserror::Error;

/// The only failure an attribute operation can report.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AttributeError {
    #[error("invalid {field}: {value} ({reason})")]
    InvalidArgument {
        field: &'static str,
        value: f32,
        reason: &'static str,
    },
}

impl AttributeError {
    pub(crate) fn invalid(field: &'static str, value: f32, reason: &'static str) -> Self {
        Self::InvalidArgument {
            field,
            value,
            reason,
        }
    }
}

pub type AttributeResult<T> = Result<T, AttributeError>;

/// Rejects NaN and infinities, then anything below zero.
pub(crate) fn ensure_non_negative(field: &'static str, value: f32) -> AttributeResult<f32> {
    if !value.is_finite() {
        return Err(AttributeError::invalid(field, value, "must be finite"));
    }
    if value < 0.0 {
        return Err(AttributeError::invalid(field, value, "must not be negative"));
    }
    Ok(value)
}
