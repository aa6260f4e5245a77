//! Configuration errors
//!
//! The simulation itself never fails; only loading tuning data can.

use std::fmt;

/// Error raised while loading or validating a [`crate::Tuning`]
#[derive(Debug)]
pub enum TuningError {
    /// Tuning JSON could not be parsed
    Json(serde_json::Error),
    /// A field holds a value the simulation cannot run with
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

impl TuningError {
    pub(crate) fn invalid(field: &'static str, reason: &'static str) -> Self {
        TuningError::Invalid { field, reason }
    }
}

impl std::error::Error for TuningError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TuningError::Json(e) => Some(e),
            TuningError::Invalid { .. } => None,
        }
    }
}

impl fmt::Display for TuningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TuningError::Json(e) => write!(f, "tuning JSON error: {}", e),
            TuningError::Invalid { field, reason } => {
                write!(f, "invalid tuning value `{}`: {}", field, reason)
            }
        }
    }
}

impl From<serde_json::Error> for TuningError {
    fn from(err: serde_json::Error) -> Self {
        TuningError::Json(err)
    }
}
