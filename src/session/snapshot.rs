use std::sync::Arc;

use serde::Serialize;

use crate::core::{
    Checklist,
    Item,
    Position,
    Section,
    TaskList,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    /// Document fetch in flight; operations are ignored.
    Loading,
    /// Document active, operations accepted.
    Ready,
    /// Load failed; `error` carries the message. Operations stay disabled
    /// until a successful reload.
    Failed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    pub fn new(completed: usize, total: usize) -> Self {
        Self { completed, total }
    }

    pub fn percent(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f32 / self.total as f32 * 100.0
        }
    }
}

/// Immutable state snapshot published to the UI layer. Each mutation
/// replaces the whole view, so a reader never observes a partial update;
/// the document itself is shared behind the `Arc` rather than copied.
#[derive(Debug, Clone)]
pub struct SessionView {
    pub phase: SessionPhase,
    pub checklist: Option<Arc<Checklist>>,
    pub error: Option<String>,
    pub position: Position,
    /// Sorted completed indices of the active list.
    pub completed_items: Vec<usize>,
    /// Edge-triggered: stays true once every mandatory item has been
    /// complete at the same time, even if one is un-checked afterwards.
    pub all_required_complete: bool,
    pub list_progress: Progress,
    pub document_progress: Progress,
}

impl SessionView {
    pub fn loading() -> Self {
        Self {
            phase: SessionPhase::Loading,
            checklist: None,
            error: None,
            position: Position::default(),
            completed_items: Vec::new(),
            all_required_complete: false,
            list_progress: Progress::default(),
            document_progress: Progress::default(),
        }
    }

    pub fn failed(message: String) -> Self {
        Self { phase: SessionPhase::Failed, error: Some(message), ..Self::loading() }
    }

    pub fn is_ready(&self) -> bool {
        self.phase == SessionPhase::Ready
    }

    pub fn active_section(&self) -> Option<&Section> {
        self.checklist.as_ref().and_then(|c| c.section(self.position.section))
    }

    pub fn active_list(&self) -> Option<&TaskList> {
        self.checklist.as_ref().and_then(|c| c.list(self.position.section, self.position.list))
    }

    pub fn active_item(&self) -> Option<&Item> {
        self.checklist
            .as_ref()
            .and_then(|c| c.item(self.position.section, self.position.list, self.position.item))
    }

    pub fn is_item_complete(&self, index: usize) -> bool {
        self.completed_items.binary_search(&index).is_ok()
    }
}
