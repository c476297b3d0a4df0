//! Error type shared by the spec object model.
//!
//! Construction is fail-fast: every parser and constructor returns
//! `Result<_, SpecError>` and nothing partially built escapes.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecError {
    /// A required key, field or resolvable reference is missing.
    #[error("insufficient specification: {0}")]
    InsufficientSpecification(String),

    /// A value is present but has the wrong shape, type or content.
    #[error("incorrect specification: {0}")]
    IncorrectSpecification(String),

    /// No entity of the requested name exists in a load specification.
    #[error("unable to merge: there is no entity {0} in current load object")]
    UnableToMerge(String),

    #[error("entity {0} needs at least one of Id, HID or autoincrement fields")]
    MissingIdentifyingField(String),

    #[error("type {field_type} has no {table} mapping (field {field})")]
    UnmappedType {
        field: String,
        field_type: String,
        table: &'static str,
    },

    #[error("timeframe has to be defined for entity {0}")]
    TimeframeUndefined(String),
}

impl SpecError {
    pub fn insufficient(msg: impl Into<String>) -> Self {
        Self::InsufficientSpecification(msg.into())
    }

    pub fn incorrect(msg: impl Into<String>) -> Self {
        Self::IncorrectSpecification(msg.into())
    }
}

pub type Result<T, E = SpecError> = std::result::Result<T, E>;
