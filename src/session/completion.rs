use std::collections::HashSet;

use crate::core::Checklist;

/// Per-list sets of completed item indices, shaped one set per list when a
/// document is loaded. Only task items ever enter a set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionTracker {
    completed: Vec<Vec<HashSet<usize>>>,
}

impl CompletionTracker {
    pub fn for_checklist(checklist: &Checklist) -> Self {
        let completed = checklist
            .sections
            .iter()
            .map(|section| section.lists.iter().map(|_| HashSet::new()).collect())
            .collect();
        Self { completed }
    }

    fn set(&self, section: usize, list: usize) -> Option<&HashSet<usize>> {
        self.completed.get(section).and_then(|lists| lists.get(list))
    }

    fn set_mut(&mut self, section: usize, list: usize) -> Option<&mut HashSet<usize>> {
        self.completed.get_mut(section).and_then(|lists| lists.get_mut(list))
    }

    /// Flips completion of one item. Returns false without touching any
    /// state for non-task items and out-of-range coordinates.
    pub fn toggle(
        &mut self,
        checklist: &Checklist,
        section: usize,
        list: usize,
        item: usize,
    ) -> bool {
        match checklist.item(section, list, item) {
            Some(target) if target.is_task() => {}
            _ => return false,
        }

        let Some(set) = self.set_mut(section, list) else {
            return false;
        };
        if !set.remove(&item) {
            set.insert(item);
        }
        true
    }

    /// Add-only variant used by restore and mark-all. Returns true only
    /// when the item was newly marked.
    pub fn mark_complete(
        &mut self,
        checklist: &Checklist,
        section: usize,
        list: usize,
        item: usize,
    ) -> bool {
        match checklist.item(section, list, item) {
            Some(target) if target.is_task() => {}
            _ => return false,
        }

        self.set_mut(section, list).map(|set| set.insert(item)).unwrap_or(false)
    }

    pub fn is_complete(&self, section: usize, list: usize, item: usize) -> bool {
        self.set(section, list).map(|set| set.contains(&item)).unwrap_or(false)
    }

    /// Full-document recompute: false at the first mandatory task not in
    /// its list's completed set. Documents are small, so no incremental
    /// bookkeeping is kept.
    pub fn all_mandatory_complete(&self, checklist: &Checklist) -> bool {
        for (s, section) in checklist.sections.iter().enumerate() {
            for (l, list) in section.lists.iter().enumerate() {
                for (i, item) in list.items.iter().enumerate() {
                    if item.mandatory && !self.is_complete(s, l, i) {
                        return false;
                    }
                }
            }
        }
        true
    }

    /// Smallest index of a task item not yet complete, or `None` when the
    /// list is empty, has no tasks, or is fully complete.
    pub fn first_incomplete(
        &self,
        checklist: &Checklist,
        section: usize,
        list: usize,
    ) -> Option<usize> {
        let target = checklist.list(section, list)?;
        target
            .items
            .iter()
            .enumerate()
            .find(|(i, item)| item.is_task() && !self.is_complete(section, list, *i))
            .map(|(i, _)| i)
    }

    /// Strictly-forward scan for the first index past `current` not in the
    /// completed set. No wrap-around: `None` past the end, and callers
    /// leave the position unchanged.
    pub fn first_skipped_after(
        &self,
        checklist: &Checklist,
        current: usize,
        section: usize,
        list: usize,
    ) -> Option<usize> {
        let target = checklist.list(section, list)?;
        ((current + 1)..target.items.len()).find(|i| !self.is_complete(section, list, *i))
    }

    /// First task index anywhere in the list that is incomplete and not
    /// the current one. Backs the "search first skipped" jump.
    pub fn first_unchecked_excluding(
        &self,
        checklist: &Checklist,
        section: usize,
        list: usize,
        current: usize,
    ) -> Option<usize> {
        let target = checklist.list(section, list)?;
        target
            .items
            .iter()
            .enumerate()
            .find(|(i, item)| {
                item.is_task() && *i != current && !self.is_complete(section, list, *i)
            })
            .map(|(i, _)| i)
    }

    /// Sorted completed indices for one list.
    pub fn completed_in(&self, section: usize, list: usize) -> Vec<usize> {
        let mut indices: Vec<usize> =
            self.set(section, list).map(|set| set.iter().copied().collect()).unwrap_or_default();
        indices.sort_unstable();
        indices
    }

    /// Total completed items across the whole document.
    pub fn completed_count(&self) -> usize {
        self.completed.iter().flatten().map(|set| set.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        Item,
        ItemKind,
        Section,
        SectionKind,
        TaskList,
    };

    fn item(kind: ItemKind, challenge: &str, mandatory: bool) -> Item {
        Item { kind, challenge: challenge.to_string(), response: None, mandatory }
    }

    fn doc() -> Checklist {
        Checklist {
            title: "Doc".to_string(),
            sections: vec![Section {
                kind: SectionKind::Checklist,
                title: "Main".to_string(),
                lists: vec![TaskList {
                    title: "List".to_string(),
                    items: vec![
                        item(ItemKind::Label, "ENGINE", false),
                        item(ItemKind::Task, "Mixture", true),
                        item(ItemKind::Task, "Throttle", true),
                        item(ItemKind::Task, "Lights", false),
                    ],
                }],
            }],
        }
    }

    #[test]
    fn toggle_twice_restores_the_prior_set() {
        let doc = doc();
        let mut tracker = CompletionTracker::for_checklist(&doc);
        let before = tracker.clone();

        assert!(tracker.toggle(&doc, 0, 0, 1));
        assert!(tracker.is_complete(0, 0, 1));
        assert!(tracker.toggle(&doc, 0, 0, 1));
        assert_eq!(tracker, before);
    }

    #[test]
    fn toggle_rejects_non_task_items_and_bad_coordinates() {
        let doc = doc();
        let mut tracker = CompletionTracker::for_checklist(&doc);

        assert!(!tracker.toggle(&doc, 0, 0, 0)); // label
        assert!(!tracker.toggle(&doc, 0, 0, 9));
        assert!(!tracker.toggle(&doc, 3, 0, 1));
        assert_eq!(tracker.completed_in(0, 0), Vec::<usize>::new());
    }

    #[test]
    fn all_mandatory_complete_ignores_optional_tasks() {
        let doc = doc();
        let mut tracker = CompletionTracker::for_checklist(&doc);
        assert!(!tracker.all_mandatory_complete(&doc));

        tracker.toggle(&doc, 0, 0, 1);
        assert!(!tracker.all_mandatory_complete(&doc));

        tracker.toggle(&doc, 0, 0, 2);
        // Item 3 is optional and still incomplete.
        assert!(tracker.all_mandatory_complete(&doc));
    }

    #[test]
    fn first_incomplete_skips_non_task_items() {
        let doc = doc();
        let mut tracker = CompletionTracker::for_checklist(&doc);
        assert_eq!(tracker.first_incomplete(&doc, 0, 0), Some(1));

        tracker.toggle(&doc, 0, 0, 1);
        tracker.toggle(&doc, 0, 0, 2);
        tracker.toggle(&doc, 0, 0, 3);
        assert_eq!(tracker.first_incomplete(&doc, 0, 0), None);
    }

    #[test]
    fn first_skipped_after_does_not_wrap() {
        let doc = doc();
        let mut tracker = CompletionTracker::for_checklist(&doc);

        // Everything from index 2 on is complete; scanning forward from 2
        // finds nothing and must not wrap back to the start.
        tracker.toggle(&doc, 0, 0, 2);
        tracker.toggle(&doc, 0, 0, 3);
        assert_eq!(tracker.first_skipped_after(&doc, 2, 0, 0), None);

        // From the top, the incomplete non-task line at 0 is not a barrier:
        // index 1 is the first unchecked position after it.
        assert_eq!(tracker.first_skipped_after(&doc, 0, 0, 0), Some(1));
    }

    #[test]
    fn first_unchecked_excluding_searches_the_whole_list() {
        let doc = doc();
        let mut tracker = CompletionTracker::for_checklist(&doc);

        tracker.toggle(&doc, 0, 0, 2);
        // Position parked at 3: the earlier incomplete task at 1 is found.
        assert_eq!(tracker.first_unchecked_excluding(&doc, 0, 0, 3), Some(1));

        tracker.toggle(&doc, 0, 0, 1);
        assert_eq!(tracker.first_unchecked_excluding(&doc, 0, 0, 3), None);
    }

    #[test]
    fn mark_complete_reports_only_new_marks() {
        let doc = doc();
        let mut tracker = CompletionTracker::for_checklist(&doc);

        assert!(tracker.mark_complete(&doc, 0, 0, 1));
        assert!(!tracker.mark_complete(&doc, 0, 0, 1));
        assert!(!tracker.mark_complete(&doc, 0, 0, 0));
        assert!(tracker.is_complete(0, 0, 1));
    }
}
