use log::debug;

use super::completion::CompletionTracker;
use crate::core::{
    Checklist,
    Position,
};

/// The current reading position. Section and list changes re-point the item
/// at the first incomplete task of the newly active list; item selection is
/// direct and bounds-rejected so caller bugs surface instead of being
/// clamped away.
#[derive(Debug, Default)]
pub struct NavigationState {
    position: Position,
}

impl NavigationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores a persisted position, clamped against the freshly loaded
    /// document's actual shape.
    pub fn restore(checklist: &Checklist, position: Position) -> Self {
        Self { position: checklist.clamp_position(position) }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Returns true when the position changed.
    pub fn select_section(
        &mut self,
        index: usize,
        checklist: &Checklist,
        tracker: &CompletionTracker,
    ) -> bool {
        if index == self.position.section {
            return false;
        }
        if index >= checklist.sections.len() {
            debug!("Rejected section index {} (have {})", index, checklist.sections.len());
            return false;
        }

        self.position.section = index;
        self.position.list = 0;
        self.position.item = tracker.first_incomplete(checklist, index, 0).unwrap_or(0);
        true
    }

    /// Returns true when the position changed.
    pub fn select_list(
        &mut self,
        index: usize,
        checklist: &Checklist,
        tracker: &CompletionTracker,
    ) -> bool {
        if index == self.position.list {
            return false;
        }
        let list_count =
            checklist.section(self.position.section).map(|s| s.lists.len()).unwrap_or(0);
        if index >= list_count {
            debug!("Rejected list index {} (have {})", index, list_count);
            return false;
        }

        self.position.list = index;
        self.position.item =
            tracker.first_incomplete(checklist, self.position.section, index).unwrap_or(0);
        true
    }

    /// Returns true when the position changed. Out-of-range requests are
    /// rejected rather than clamped.
    pub fn select_item(&mut self, index: usize, checklist: &Checklist) -> bool {
        let item_count = checklist
            .list(self.position.section, self.position.list)
            .map(|l| l.items.len())
            .unwrap_or(0);
        if index >= item_count {
            debug!("Rejected item index {} (have {})", index, item_count);
            return false;
        }
        if index == self.position.item {
            return false;
        }

        self.position.item = index;
        true
    }

    /// Direct item move for callers that already computed a valid index
    /// (check-advance, skip, search).
    pub fn set_item(&mut self, index: usize) {
        self.position.item = index;
    }

    /// Structural-change guard: after a document reload, indices pointing
    /// past the new shape reset to 0.
    pub fn clamp(&mut self, checklist: &Checklist) {
        self.position = checklist.clamp_position(self.position);
    }
}
