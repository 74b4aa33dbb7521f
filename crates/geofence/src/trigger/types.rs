//! Trigger records and their wire shape.
//!
//! On the wire a trigger is a flat camelCase object whose `type` tag selects
//! the variant fields:
//! `{"id", "structureCode", "type": "membership", "triggerType": "enter", ...}`
//! `{"id", "structureCode", "type": "permanence", "permanenceHours": 2, ...}`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Boundary crossing direction for membership triggers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerType {
    Enter,
    Exit,
}

impl std::fmt::Display for TriggerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            TriggerType::Enter => "enter",
            TriggerType::Exit => "exit",
        })
    }
}

/// What makes a trigger fire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TriggerKind {
    /// Fires on crossing the structure's boundary.
    Membership {
        #[serde(rename = "triggerType")]
        trigger_type: TriggerType,
    },
    /// Fires after dwelling inside for `permanence_hours` (1..=24).
    Permanence {
        #[serde(rename = "permanenceHours")]
        permanence_hours: u8,
    },
}

impl TriggerKind {
    pub fn permanence_hours(&self) -> Option<u8> {
        match self {
            TriggerKind::Permanence { permanence_hours } => Some(*permanence_hours),
            TriggerKind::Membership { .. } => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationConfig {
    pub title: String,
    pub body: String,
}

/// A notification rule bound to one structure by code.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trigger {
    pub id: String,
    pub structure_code: String,
    #[serde(flatten)]
    pub kind: TriggerKind,
    pub notification_config: NotificationConfig,
    pub flow_id: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

/// Caller-supplied fields for `create` and `update`.
#[derive(Clone, Debug, PartialEq)]
pub struct TriggerDraft {
    pub structure_code: String,
    pub kind: TriggerKind,
    pub title: String,
    pub body: String,
    pub flow_id: String,
    pub is_active: bool,
}

impl TriggerDraft {
    pub fn membership(
        structure_code: &str,
        trigger_type: TriggerType,
        title: &str,
        body: &str,
        flow_id: &str,
    ) -> Self {
        Self {
            structure_code: structure_code.to_string(),
            kind: TriggerKind::Membership { trigger_type },
            title: title.to_string(),
            body: body.to_string(),
            flow_id: flow_id.to_string(),
            is_active: true,
        }
    }

    pub fn permanence(
        structure_code: &str,
        permanence_hours: u8,
        title: &str,
        body: &str,
        flow_id: &str,
    ) -> Self {
        Self {
            structure_code: structure_code.to_string(),
            kind: TriggerKind::Permanence { permanence_hours },
            title: title.to_string(),
            body: body.to_string(),
            flow_id: flow_id.to_string(),
            is_active: true,
        }
    }
}

impl From<&Trigger> for TriggerDraft {
    fn from(t: &Trigger) -> Self {
        Self {
            structure_code: t.structure_code.clone(),
            kind: t.kind,
            title: t.notification_config.title.clone(),
            body: t.notification_config.body.clone(),
            flow_id: t.flow_id.clone(),
            is_active: t.is_active,
        }
    }
}

/// Versioned trigger export envelope.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TriggerExport {
    pub version: String,
    pub triggers: Vec<Trigger>,
    pub metadata: TriggerExportMetadata,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerExportMetadata {
    pub exported_at: DateTime<Utc>,
    pub total_triggers: usize,
}
