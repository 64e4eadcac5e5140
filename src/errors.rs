//! Error type for the pointer analysis engine.
//!
//! Only configuration problems are fail-fast and reach the caller as an
//! `Err`; everything else (adapter errors, unresolved calls,
//! iteration-cap stops, soundness notices) is accumulated in
//! [`crate::domain::Diagnostics`] instead.

use thiserror::Error;

/// Configuration and setup errors. The only error kind this crate raises.
#[derive(Debug, Error)]
pub enum PtaError {
    /// An unrecognized context-policy string.
    #[error("unknown context policy {policy:?} (expected one of: {valid})")]
    UnknownPolicy { policy: String, valid: &'static str },

    /// A numeric config field outside its valid range.
    #[error("config field `{field}` = {value} is out of range [{min}, {max}]{hint}")]
    OutOfRange {
        field: &'static str,
        value: String,
        min: String,
        max: String,
        hint: String,
    },

    /// An unrecognized preset name.
    #[error("unknown preset {0:?} (expected one of: fast, balanced, thorough)")]
    UnknownPreset(String),

    /// Two config options that cannot both hold (e.g. a field-sensitivity
    /// mode requiring a container list that was left empty).
    #[error("conflicting configuration: {issue} ({fix})")]
    Conflict { issue: String, fix: String },

    /// The event stream could not be parsed into well-formed events at
    /// all (malformed JSON framing, not just an unrecognized event kind,
    /// which is instead recorded in `Diagnostics`).
    #[error("malformed event stream: {0}")]
    MalformedInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PtaError {
    pub fn out_of_range(
        field: &'static str,
        value: impl std::fmt::Display,
        min: impl std::fmt::Display,
        max: impl std::fmt::Display,
        hint: impl Into<String>,
    ) -> Self {
        let hint = hint.into();
        let hint = if hint.is_empty() { String::new() } else { format!(" ({hint})") };
        Self::OutOfRange {
            field,
            value: value.to_string(),
            min: min.to_string(),
            max: max.to_string(),
            hint,
        }
    }

    pub fn unknown_policy(policy: impl Into<String>) -> Self {
        Self::UnknownPolicy {
            policy: policy.into(),
            valid: "0-cfa, k-cfa, k-obj, k-type, k-rcv, hybrid",
        }
    }
}

pub type PtaResult<T> = std::result::Result<T, PtaError>;
