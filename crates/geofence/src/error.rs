//! Error types, one enum per concern.
//!
//! Geometry never errors (degenerate input degrades to empty results); these
//! cover mutations and payload parsing only. Every failing call leaves prior
//! state untouched.

use thiserror::Error;

use crate::trigger::{TriggerType, ValidationErrors};

#[derive(Debug, Error, PartialEq)]
pub enum BandError {
    #[error("band thickness must be a finite positive number of meters, got {0}")]
    InvalidThickness(f64),
}

#[derive(Debug, Error, PartialEq)]
pub enum StructureError {
    #[error("structure code is empty")]
    EmptyCode,
    #[error("structure code {0} already exists")]
    DuplicateCode(String),
    #[error("structure {0} not found")]
    NotFound(String),
    #[error("parent structure {0} not found")]
    UnknownParent(String),
    #[error("cannot make {parent} the parent of {child}: the hierarchy would contain a cycle")]
    WouldCycle { child: String, parent: String },
    #[error(transparent)]
    Band(#[from] BandError),
}

#[derive(Debug, Error, PartialEq)]
pub enum TriggerError {
    #[error("invalid trigger: {0}")]
    Invalid(ValidationErrors),
    #[error("structure {structure_code} already has a {trigger_type} trigger")]
    DuplicateMembership {
        structure_code: String,
        trigger_type: TriggerType,
    },
    #[error("structure {structure_code} already has a {hours}h permanence trigger")]
    DuplicatePermanence { structure_code: String, hours: u8 },
    #[error("trigger {0} not found")]
    NotFound(String),
    #[error("structure {0} does not exist")]
    UnknownStructure(String),
}

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}
