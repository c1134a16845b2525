//! Saved-state wire format and the typed store API around it.
//!
//! One record per checklist under `checklist_<id>`, plus a side index of
//! all ids with saved state under a fixed key, so a "resume available"
//! affordance never has to load every record.

use std::{
    collections::BTreeMap,
    sync::Arc,
};

use chrono::{
    DateTime,
    Utc,
};
use log::warn;
use serde::{
    Deserialize,
    Serialize,
};

use super::StateStore;
use crate::{
    core::{
        Checklist,
        Position,
        TaskList,
    },
    session::CompletionTracker,
};

const RECORD_KEY_PREFIX: &str = "checklist_";

// Outside the record prefix so a checklist literally named "index" (or
// anything else) cannot collide with it.
const INDEX_KEY: &str = "saved_checklists";

/// One persisted snapshot: the reading position plus, per `"{section}_{list}"`
/// compound key, the identifiers of that list's completed items. Identifiers
/// are challenge text (index-as-string when the challenge is empty), so a
/// lightly re-ordered document keeps most of its saved progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedChecklistState {
    pub section_index: usize,
    pub list_index: usize,
    pub item_index: usize,
    #[serde(default)]
    pub completed: BTreeMap<String, Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

impl SavedChecklistState {
    pub fn capture(
        position: Position,
        tracker: &CompletionTracker,
        checklist: &Checklist,
    ) -> Self {
        let mut completed = BTreeMap::new();
        for (s, section) in checklist.sections.iter().enumerate() {
            for (l, list) in section.lists.iter().enumerate() {
                let indices = tracker.completed_in(s, l);
                if indices.is_empty() {
                    continue;
                }
                let identifiers = indices
                    .iter()
                    .filter_map(|&i| list.item(i).map(|item| item.identifier(i)))
                    .collect();
                completed.insert(format!("{}_{}", s, l), identifiers);
            }
        }

        Self {
            section_index: position.section,
            list_index: position.list,
            item_index: position.item,
            completed,
            saved_at: Some(Utc::now()),
        }
    }

    /// Rebuilds a position and tracker against a freshly loaded document.
    /// Identifiers that no longer match anything are dropped silently, and
    /// position fields clamp per level. Lossy by design, never an error.
    pub fn restore(&self, checklist: &Checklist) -> (Position, CompletionTracker) {
        let mut tracker = CompletionTracker::for_checklist(checklist);

        for (key, identifiers) in &self.completed {
            let Some((section, list)) = parse_compound_key(key) else {
                warn!("Dropping malformed completion key '{}'", key);
                continue;
            };
            let Some(target) = checklist.list(section, list) else {
                continue;
            };
            for identifier in identifiers {
                match match_identifier(target, identifier) {
                    Some(index) => {
                        tracker.mark_complete(checklist, section, list, index);
                    }
                    None => {
                        warn!("Dropping saved item '{}' from {}: no longer present", identifier, key)
                    }
                }
            }
        }

        let position = checklist.clamp_position(Position {
            section: self.section_index,
            list: self.list_index,
            item: self.item_index,
        });
        (position, tracker)
    }
}

fn parse_compound_key(key: &str) -> Option<(usize, usize)> {
    let (section, list) = key.split_once('_')?;
    Some((section.parse().ok()?, list.parse().ok()?))
}

/// Challenge text first; a purely numeric identifier falls back to being
/// the index itself. Either way only task items match.
fn match_identifier(list: &TaskList, identifier: &str) -> Option<usize> {
    if let Some(index) =
        list.items.iter().position(|item| item.is_task() && item.challenge == identifier)
    {
        return Some(index);
    }

    if !identifier.is_empty() && identifier.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(index) = identifier.parse::<usize>() {
            if list.item(index).map(|item| item.is_task()).unwrap_or(false) {
                return Some(index);
            }
        }
    }

    None
}

/// Typed API over the raw key-value store: keeps the per-checklist record
/// and the side index consistent with each other.
pub struct ProgressStore {
    store: Arc<dyn StateStore>,
}

impl ProgressStore {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    fn record_key(identifier: &str) -> String {
        format!("{}{}", RECORD_KEY_PREFIX, identifier)
    }

    pub fn save(&self, identifier: &str, state: &SavedChecklistState) {
        match serde_json::to_string(state) {
            Ok(json) => {
                self.store.put(&Self::record_key(identifier), &json);
                let mut ids = self.store.get_string_set(INDEX_KEY);
                if ids.insert(identifier.to_string()) {
                    self.store.put_string_set(INDEX_KEY, &ids);
                }
            }
            Err(e) => warn!("Failed to serialize saved state for '{}': {}", identifier, e),
        }
    }

    /// A missing or unreadable record reads as "no saved state".
    pub fn load(&self, identifier: &str) -> Option<SavedChecklistState> {
        let json = self.store.get(&Self::record_key(identifier))?;
        match serde_json::from_str(&json) {
            Ok(state) => Some(state),
            Err(e) => {
                warn!("Unreadable saved state for '{}': {}. Starting fresh.", identifier, e);
                None
            }
        }
    }

    pub fn clear(&self, identifier: &str) {
        self.store.remove(&Self::record_key(identifier));
        let mut ids = self.store.get_string_set(INDEX_KEY);
        if ids.remove(identifier) {
            self.store.put_string_set(INDEX_KEY, &ids);
        }
    }

    pub fn has_saved_state(&self, identifier: &str) -> bool {
        self.store.get_string_set(INDEX_KEY).contains(identifier)
    }

    pub fn saved_checklist_ids(&self) -> std::collections::HashSet<String> {
        self.store.get_string_set(INDEX_KEY)
    }
}
