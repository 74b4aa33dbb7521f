//! `TriggerBook`: the owned trigger collection with enforced invariants.
//!
//! `create` and `update` validate fields and reject duplicates themselves;
//! callers cannot bypass the checks by skipping a form layer. Structure
//! existence is not checked here (see `Workspace::create_trigger`), and
//! triggers pointing at deleted structures are kept until pruned.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::types::{
    NotificationConfig, Trigger, TriggerDraft, TriggerExport, TriggerExportMetadata, TriggerKind,
};
use super::validate::{is_duplicate_membership, is_duplicate_permanence, validate};
use crate::cfg::EXPORT_VERSION;
use crate::error::{ExchangeError, TriggerError};
use crate::ids;
use crate::structure::{normalize_code, Structure};

/// Counts from a trigger import.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImportOutcome {
    pub added: usize,
    pub skipped: usize,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TriggerBook {
    triggers: Vec<Trigger>,
}

/// Field validation plus uniqueness against `existing`, ignoring `exclude_id`.
fn check_draft(
    existing: &[Trigger],
    draft: &TriggerDraft,
    exclude_id: Option<&str>,
) -> Result<(), TriggerError> {
    let report = validate(
        &draft.title,
        &draft.body,
        &draft.flow_id,
        draft.kind.permanence_hours().map(i64::from),
    );
    if !report.is_valid {
        return Err(TriggerError::Invalid(report.errors_by_field));
    }
    let code = draft.structure_code.as_str();
    match draft.kind {
        TriggerKind::Membership { trigger_type } => {
            if is_duplicate_membership(existing, code, trigger_type, exclude_id) {
                return Err(TriggerError::DuplicateMembership {
                    structure_code: code.to_string(),
                    trigger_type,
                });
            }
        }
        TriggerKind::Permanence { permanence_hours } => {
            if is_duplicate_permanence(existing, code, permanence_hours, exclude_id) {
                return Err(TriggerError::DuplicatePermanence {
                    structure_code: code.to_string(),
                    hours: permanence_hours,
                });
            }
        }
    }
    Ok(())
}

fn normalized(draft: TriggerDraft) -> TriggerDraft {
    TriggerDraft {
        structure_code: normalize_code(&draft.structure_code),
        title: draft.title.trim().to_string(),
        body: draft.body.trim().to_string(),
        ..draft
    }
}

impl TriggerBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> &[Trigger] {
        &self.triggers
    }

    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Trigger> {
        self.triggers.iter().find(|t| t.id == id)
    }

    pub fn for_structure<'a>(&'a self, code: &str) -> impl Iterator<Item = &'a Trigger> + 'a {
        let code = normalize_code(code);
        self.triggers.iter().filter(move |t| t.structure_code == code)
    }

    pub fn create(&mut self, draft: TriggerDraft) -> Result<&Trigger, TriggerError> {
        self.create_with_rng(draft, &mut rand::thread_rng())
    }

    pub fn create_with_rng<R: Rng + ?Sized>(
        &mut self,
        draft: TriggerDraft,
        rng: &mut R,
    ) -> Result<&Trigger, TriggerError> {
        let draft = normalized(draft);
        check_draft(&self.triggers, &draft, None)?;
        let mut id = ids::trigger_id(rng);
        while self.get(&id).is_some() {
            id = ids::trigger_id(rng);
        }
        let now = Utc::now();
        let trigger = Trigger {
            id,
            structure_code: draft.structure_code,
            kind: draft.kind,
            notification_config: NotificationConfig {
                title: draft.title,
                body: draft.body,
            },
            flow_id: draft.flow_id,
            is_active: draft.is_active,
            created_at: now,
            updated_at: now,
        };
        info!(id = %trigger.id, structure = %trigger.structure_code, kind = ?trigger.kind, "trigger created");
        self.triggers.push(trigger);
        Ok(&self.triggers[self.triggers.len() - 1])
    }

    /// Replace the fields of trigger `id`. `created_at` is kept.
    pub fn update(&mut self, id: &str, draft: TriggerDraft) -> Result<&Trigger, TriggerError> {
        let idx = self
            .triggers
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| TriggerError::NotFound(id.to_string()))?;
        let draft = normalized(draft);
        check_draft(&self.triggers, &draft, Some(id))?;
        let t = &mut self.triggers[idx];
        t.structure_code = draft.structure_code;
        t.kind = draft.kind;
        t.notification_config.title = draft.title;
        t.notification_config.body = draft.body;
        t.flow_id = draft.flow_id;
        t.is_active = draft.is_active;
        t.updated_at = Utc::now();
        debug!(id, "trigger updated");
        Ok(&self.triggers[idx])
    }

    pub fn set_active(&mut self, id: &str, active: bool) -> Result<&Trigger, TriggerError> {
        let t = self
            .triggers
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| TriggerError::NotFound(id.to_string()))?;
        if t.is_active != active {
            t.is_active = active;
            t.updated_at = Utc::now();
        }
        Ok(&*t)
    }

    pub fn delete(&mut self, id: &str) -> Result<Trigger, TriggerError> {
        let idx = self
            .triggers
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| TriggerError::NotFound(id.to_string()))?;
        debug!(id, "trigger deleted");
        Ok(self.triggers.remove(idx))
    }

    /// Triggers whose structure code matches none of `structures`.
    pub fn orphaned<'a>(&'a self, structures: &[Structure]) -> Vec<&'a Trigger> {
        self.triggers
            .iter()
            .filter(|t| !structures.iter().any(|s| s.code == t.structure_code))
            .collect()
    }

    /// Remove and return orphaned triggers.
    pub fn prune_orphans(&mut self, structures: &[Structure]) -> Vec<Trigger> {
        let (keep, gone): (Vec<_>, Vec<_>) = std::mem::take(&mut self.triggers)
            .into_iter()
            .partition(|t| structures.iter().any(|s| s.code == t.structure_code));
        self.triggers = keep;
        if !gone.is_empty() {
            info!(count = gone.len(), "pruned orphaned triggers");
        }
        gone
    }

    pub fn export_all(&self) -> TriggerExport {
        export_all(&self.triggers)
    }

    /// Replace wholesale (`replace_all`) or merge by id, first write wins.
    ///
    /// Incoming records that fail validation or collide with an existing
    /// `(structure, type)` / `(structure, hours)` rule are skipped.
    pub fn import(&mut self, payload: TriggerExport, replace_all: bool) -> ImportOutcome {
        let mut out = ImportOutcome::default();
        let mut next = if replace_all {
            Vec::with_capacity(payload.triggers.len())
        } else {
            self.triggers.clone()
        };
        for mut t in payload.triggers {
            if next.iter().any(|x| x.id == t.id) {
                debug!(id = %t.id, "import: id exists, keeping current");
                out.skipped += 1;
                continue;
            }
            t.structure_code = normalize_code(&t.structure_code);
            if let Err(e) = check_draft(&next, &TriggerDraft::from(&t), None) {
                warn!(id = %t.id, error = %e, "import: trigger skipped");
                out.skipped += 1;
                continue;
            }
            next.push(t);
            out.added += 1;
        }
        self.triggers = next;
        info!(added = out.added, skipped = out.skipped, replace_all, "triggers imported");
        out
    }

    /// Parse a trigger export envelope and `import` it. Records that cannot
    /// be read at all are skipped one by one and counted with the rest.
    pub fn import_json(&mut self, json: &str, replace_all: bool) -> Result<ImportOutcome, ExchangeError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let is_envelope = value
            .get("triggers")
            .map(serde_json::Value::is_array)
            .unwrap_or(false);
        if !is_envelope {
            return Err(ExchangeError::UnsupportedFormat(
                "expected an object with a `triggers` array".into(),
            ));
        }
        let (payload, unreadable) = parse_trigger_envelope(value);
        let mut out = self.import(payload, replace_all);
        out.skipped += unreadable;
        Ok(out)
    }
}

/// Lenient view of one trigger: timestamps may be missing.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TriggerRecord {
    id: String,
    structure_code: String,
    #[serde(flatten)]
    kind: TriggerKind,
    notification_config: NotificationConfig,
    flow_id: String,
    #[serde(default = "default_active")]
    is_active: bool,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

impl From<TriggerRecord> for Trigger {
    fn from(r: TriggerRecord) -> Self {
        let created_at = r.created_at.unwrap_or_else(Utc::now);
        Self {
            id: r.id,
            structure_code: r.structure_code,
            kind: r.kind,
            notification_config: r.notification_config,
            flow_id: r.flow_id,
            is_active: r.is_active,
            created_at,
            updated_at: r.updated_at.unwrap_or(created_at),
        }
    }
}

/// Lenient envelope parse: missing `version`/`metadata` are backfilled and
/// unreadable records are dropped. Returns the envelope and the drop count.
fn parse_trigger_envelope(value: serde_json::Value) -> (TriggerExport, usize) {
    let version = value
        .get("version")
        .and_then(serde_json::Value::as_str)
        .unwrap_or(EXPORT_VERSION)
        .to_string();
    let mut unreadable = 0;
    let triggers: Vec<Trigger> = value
        .get("triggers")
        .and_then(serde_json::Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|v| match serde_json::from_value::<TriggerRecord>(v.clone()) {
                    Ok(r) => Some(Trigger::from(r)),
                    Err(e) => {
                        warn!(error = %e, "import: unreadable trigger record skipped");
                        unreadable += 1;
                        None
                    }
                })
                .collect()
        })
        .unwrap_or_default();
    let metadata = value
        .get("metadata")
        .and_then(|m| serde_json::from_value(m.clone()).ok())
        .unwrap_or_else(|| TriggerExportMetadata {
            exported_at: Utc::now(),
            total_triggers: triggers.len(),
        });
    (
        TriggerExport {
            version,
            triggers,
            metadata,
        },
        unreadable,
    )
}

/// Versioned export envelope of `triggers`.
pub fn export_all(triggers: &[Trigger]) -> TriggerExport {
    TriggerExport {
        version: EXPORT_VERSION.to_string(),
        triggers: triggers.to_vec(),
        metadata: TriggerExportMetadata {
            exported_at: Utc::now(),
            total_triggers: triggers.len(),
        },
    }
}
