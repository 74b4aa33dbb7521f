//! TriggerRules: membership and permanence notification rules.
//!
//! - `types`: `Trigger`, `TriggerKind`, drafts and the export envelope.
//! - `validate`: accumulated field validation and duplicate scans.
//! - `book`: `TriggerBook`, CRUD that enforces both, plus import/export.
//!
//! Uniqueness: one membership trigger per `(structure, direction)` and one
//! permanence trigger per `(structure, hours)`.

mod book;
mod types;
mod validate;

pub use book::{export_all, ImportOutcome, TriggerBook};
pub use types::{
    NotificationConfig, Trigger, TriggerDraft, TriggerExport, TriggerExportMetadata, TriggerKind,
    TriggerType,
};
pub use validate::{
    is_duplicate_membership, is_duplicate_permanence, validate, TriggerField, ValidationErrors,
    ValidationReport, BODY_LEN, PERMANENCE_HOURS, TITLE_LEN,
};
