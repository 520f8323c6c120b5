//! Errors raised while building simulation inputs.

use thiserror::Error;

/// Failure to construct a valid simulation input.
///
/// Every variant is raised before any month is evaluated, so a batch driver
/// can catch it per consumer unit and carry on with the next one.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// A field is outside its declared range or domain.
    #[error("invalid parameter `{field}`: {constraint}")]
    InvalidParameter {
        /// Field name as it appears in scenario files (e.g. `icms_pct`).
        field: &'static str,
        /// Human-readable description of the violated constraint.
        constraint: String,
    },

    /// The contract ends before it starts.
    #[error(
        "invalid contract period: end {end_month:02}/{end_year} precedes start {start_month:02}/{start_year}"
    )]
    InvalidPeriod {
        start_month: u32,
        start_year: i32,
        end_month: u32,
        end_year: i32,
    },

    /// The tariff modality name is neither Blue nor Green.
    #[error("unknown tariff modality \"{0}\", expected \"Blue\" or \"Green\"")]
    UnknownModality(String),
}

impl SimError {
    pub(crate) fn invalid(field: &'static str, constraint: impl Into<String>) -> Self {
        Self::InvalidParameter {
            field,
            constraint: constraint.into(),
        }
    }

    /// Name of the offending field, when the error concerns a single field.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::InvalidParameter { field, .. } => Some(field),
            Self::InvalidPeriod { .. } => Some("period"),
            Self::UnknownModality(_) => Some("modality"),
        }
    }
}
