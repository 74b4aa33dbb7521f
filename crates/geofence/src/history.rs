//! HistoryLog: append-only undo stack over additive point edits.
//!
//! The log only records; applying an undo to a structure is the owner's job
//! (`Workspace::undo`). Growth is unbounded within a session, one entry per
//! added point.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geomath::Point;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HistoryAction {
    AddMapPoint,
    AddWalkPoint,
    AddTriggerPoint,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub action_type: HistoryAction,
    pub structure_code: String,
    pub payload: Point,
    /// The structure's `last_modified` before the edit, restored on undo.
    pub prior_modified: DateTime<Utc>,
}

#[derive(Clone, Debug, Default)]
pub struct HistoryLog {
    entries: Vec<HistoryEntry>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
    }

    /// Convenience over `push`.
    pub fn record(
        &mut self,
        action_type: HistoryAction,
        structure_code: &str,
        payload: Point,
        prior_modified: DateTime<Utc>,
    ) {
        self.push(HistoryEntry {
            action_type,
            structure_code: structure_code.to_string(),
            payload,
            prior_modified,
        });
    }

    pub fn pop(&mut self) -> Option<HistoryEntry> {
        self.entries.pop()
    }

    pub fn peek(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifo_order() {
        let mut log = HistoryLog::new();
        assert!(log.pop().is_none());
        let t = Utc::now();
        log.record(HistoryAction::AddMapPoint, "A", Point::new(1.0, 2.0), t);
        log.record(HistoryAction::AddTriggerPoint, "B", Point::new(3.0, 4.0), t);
        assert_eq!(log.len(), 2);
        assert_eq!(log.peek().unwrap().structure_code, "B");
        assert_eq!(log.pop().unwrap().action_type, HistoryAction::AddTriggerPoint);
        assert_eq!(log.pop().unwrap().payload, Point::new(1.0, 2.0));
        assert!(log.is_empty());
    }
}
