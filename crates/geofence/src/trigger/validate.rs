//! Field validation and duplicate detection for triggers.
//!
//! Validation accumulates: every field is checked even after one fails, so a
//! form can show all errors at once.

use std::collections::BTreeMap;

use serde::Serialize;

use super::types::{Trigger, TriggerKind, TriggerType};

pub const TITLE_LEN: std::ops::RangeInclusive<usize> = 3..=50;
pub const BODY_LEN: std::ops::RangeInclusive<usize> = 3..=100;
pub const PERMANENCE_HOURS: std::ops::RangeInclusive<i64> = 1..=24;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TriggerField {
    Title,
    Body,
    FlowId,
    PermanenceHours,
}

impl TriggerField {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerField::Title => "title",
            TriggerField::Body => "body",
            TriggerField::FlowId => "flowId",
            TriggerField::PermanenceHours => "permanenceHours",
        }
    }
}

/// Field → message map of validation failures.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors(pub BTreeMap<TriggerField, String>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: TriggerField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    fn insert(&mut self, field: TriggerField, msg: impl Into<String>) {
        self.0.insert(field, msg.into());
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, msg) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", field.as_str(), msg)?;
            first = false;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors_by_field: ValidationErrors,
}

fn is_flow_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Check notification text, flow id and (for permanence triggers) hours.
///
/// Lengths count characters of the trimmed text.
pub fn validate(
    title: &str,
    body: &str,
    flow_id: &str,
    permanence_hours: Option<i64>,
) -> ValidationReport {
    let mut errors = ValidationErrors::default();

    let n = title.trim().chars().count();
    if !TITLE_LEN.contains(&n) {
        errors.insert(
            TriggerField::Title,
            format!(
                "title must be {}-{} characters (got {n})",
                TITLE_LEN.start(),
                TITLE_LEN.end()
            ),
        );
    }

    let n = body.trim().chars().count();
    if !BODY_LEN.contains(&n) {
        errors.insert(
            TriggerField::Body,
            format!(
                "body must be {}-{} characters (got {n})",
                BODY_LEN.start(),
                BODY_LEN.end()
            ),
        );
    }

    if flow_id.is_empty() {
        errors.insert(TriggerField::FlowId, "flow id is required");
    } else if !flow_id.chars().all(is_flow_id_char) {
        errors.insert(
            TriggerField::FlowId,
            "flow id may only contain letters, digits, '_' and '-'",
        );
    }

    if let Some(h) = permanence_hours {
        if !PERMANENCE_HOURS.contains(&h) {
            errors.insert(
                TriggerField::PermanenceHours,
                format!(
                    "permanence must be {}-{} hours (got {h})",
                    PERMANENCE_HOURS.start(),
                    PERMANENCE_HOURS.end()
                ),
            );
        }
    }

    ValidationReport {
        is_valid: errors.is_empty(),
        errors_by_field: errors,
    }
}

fn others<'a>(
    triggers: &'a [Trigger],
    structure_code: &'a str,
    exclude_id: Option<&'a str>,
) -> impl Iterator<Item = &'a Trigger> {
    triggers
        .iter()
        .filter(move |t| t.structure_code == structure_code && Some(t.id.as_str()) != exclude_id)
}

/// An existing, non-excluded membership trigger with the same structure and
/// direction.
pub fn is_duplicate_membership(
    triggers: &[Trigger],
    structure_code: &str,
    trigger_type: TriggerType,
    exclude_id: Option<&str>,
) -> bool {
    others(triggers, structure_code, exclude_id)
        .any(|t| t.kind == TriggerKind::Membership { trigger_type })
}

/// An existing, non-excluded permanence trigger with the same structure and
/// hours.
pub fn is_duplicate_permanence(
    triggers: &[Trigger],
    structure_code: &str,
    hours: u8,
    exclude_id: Option<&str>,
) -> bool {
    others(triggers, structure_code, exclude_id).any(|t| {
        t.kind
            == TriggerKind::Permanence {
                permanence_hours: hours,
            }
    })
}
