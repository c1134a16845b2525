//! The checklist session: one owner for position, completion and the
//! save/restore lifecycle of a single viewed document.

pub mod completion;
pub mod navigation;
pub mod snapshot;


pub use completion::CompletionTracker;
pub use navigation::NavigationState;
pub use snapshot::{
    Progress,
    SessionPhase,
    SessionView,
};

use std::sync::Arc;

use log::warn;
use tokio::sync::watch;

use crate::{
    core::Checklist,
    document::DocumentLoader,
    persistence::{
        codec::{
            ProgressStore,
            SavedChecklistState,
        },
        saver::SaveScheduler,
        StateStore,
    },
};

struct ActiveDocument {
    identifier: String,
    checklist: Arc<Checklist>,
    navigation: NavigationState,
    tracker: CompletionTracker,
    all_required_complete: bool,
}

/// Orchestrates navigation, completion and persistence for one checklist
/// at a time, publishing immutable [`SessionView`] snapshots over a watch
/// channel. All services are injected at construction, so tests and hosts
/// substitute their own loaders and stores.
///
/// Every operation is a synchronous read-modify-publish cycle through
/// `&mut self`; readers of the channel always observe a whole snapshot.
pub struct ChecklistSession {
    loader: Arc<dyn DocumentLoader>,
    progress: ProgressStore,
    saver: SaveScheduler,
    active: Option<ActiveDocument>,
    view_tx: watch::Sender<SessionView>,
}

impl ChecklistSession {
    pub fn new(loader: Arc<dyn DocumentLoader>, store: Arc<dyn StateStore>) -> Self {
        let saver = SaveScheduler::new(store.clone());
        let progress = ProgressStore::new(store);
        let (view_tx, _) = watch::channel(SessionView::loading());

        Self { loader, progress, saver, active: None, view_tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view_tx.subscribe()
    }

    pub fn view(&self) -> SessionView {
        self.view_tx.borrow().clone()
    }

    /// True when the named checklist has a resumable snapshot in the store.
    pub fn has_saved_state(&self, identifier: &str) -> bool {
        self.progress.has_saved_state(identifier)
    }

    /// Loads a document, replacing whatever was active. Pending saves for
    /// the previous document are flushed first. With `resume`, a stored
    /// snapshot (if any) is applied before the first ready view; without
    /// it, saved state is left alone until the next mutation overwrites it.
    pub async fn load(&mut self, identifier: &str, resume: bool) {
        self.saver.flush().await;
        self.active = None;
        // send_replace keeps the stored view current even with no
        // subscribers, so view() never reads stale state.
        self.view_tx.send_replace(SessionView::loading());

        match self.loader.load(identifier) {
            Ok(checklist) => {
                let checklist = Arc::new(checklist);
                let saved = if resume { self.progress.load(identifier) } else { None };
                let (navigation, tracker) = match saved {
                    Some(saved) => {
                        let (position, tracker) = saved.restore(&checklist);
                        (NavigationState::restore(&checklist, position), tracker)
                    }
                    None => {
                        (NavigationState::new(), CompletionTracker::for_checklist(&checklist))
                    }
                };
                let all_required_complete = tracker.all_mandatory_complete(&checklist);

                self.active = Some(ActiveDocument {
                    identifier: identifier.to_string(),
                    checklist,
                    navigation,
                    tracker,
                    all_required_complete,
                });
                self.publish();
            }
            Err(e) => {
                warn!("Failed to load checklist '{}': {}", identifier, e);
                self.view_tx.send_replace(SessionView::failed(e.to_string()));
            }
        }
    }

    /// Toggles the item at the current position. When the item is now
    /// complete, the position advances to the first incomplete task of the
    /// current list; un-checking never moves the position.
    pub fn check_current_item(&mut self) {
        let Some(active) = self.active.as_mut() else {
            return;
        };

        let pos = active.navigation.position();
        if !active.tracker.toggle(&active.checklist, pos.section, pos.list, pos.item) {
            return;
        }

        if active.tracker.is_complete(pos.section, pos.list, pos.item) {
            if let Some(next) =
                active.tracker.first_incomplete(&active.checklist, pos.section, pos.list)
            {
                active.navigation.set_item(next);
            }
        }

        self.refresh_latch();
        self.publish_and_save();
    }

    /// Moves forward to the next unchecked position, leaving completion
    /// untouched. Nothing past the current position means no movement and
    /// no save.
    pub fn skip_item(&mut self) {
        let Some(active) = self.active.as_mut() else {
            return;
        };

        let pos = active.navigation.position();
        let Some(next) =
            active.tracker.first_skipped_after(&active.checklist, pos.item, pos.section, pos.list)
        else {
            return;
        };

        active.navigation.set_item(next);
        self.publish_and_save();
    }

    /// Jumps to the first incomplete task anywhere in the current list
    /// other than the current position.
    pub fn search_first_skipped(&mut self) {
        let Some(active) = self.active.as_mut() else {
            return;
        };

        let pos = active.navigation.position();
        let Some(target) = active.tracker.first_unchecked_excluding(
            &active.checklist,
            pos.section,
            pos.list,
            pos.item,
        ) else {
            return;
        };

        active.navigation.set_item(target);
        self.publish_and_save();
    }

    pub fn select_section(&mut self, index: usize) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        if !active.navigation.select_section(index, &active.checklist, &active.tracker) {
            return;
        }
        self.publish_and_save();
    }

    pub fn select_list(&mut self, index: usize) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        if !active.navigation.select_list(index, &active.checklist, &active.tracker) {
            return;
        }
        self.publish_and_save();
    }

    pub fn select_item(&mut self, index: usize) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        if !active.navigation.select_item(index, &active.checklist) {
            return;
        }
        self.publish_and_save();
    }

    /// Marks every task of the current list complete as one update.
    pub fn mark_all_complete(&mut self) {
        let Some(active) = self.active.as_mut() else {
            return;
        };

        let pos = active.navigation.position();
        let Some(list) = active.checklist.list(pos.section, pos.list) else {
            return;
        };

        let mut changed = false;
        for index in 0..list.items.len() {
            changed |= active.tracker.mark_complete(&active.checklist, pos.section, pos.list, index);
        }
        if !changed {
            return;
        }

        self.refresh_latch();
        self.publish_and_save();
    }

    /// Discards all progress for the active document: fresh tracker,
    /// position back to the top, latch re-derived, saved record removed.
    pub fn restart(&mut self) {
        let Some(active) = self.active.as_mut() else {
            return;
        };

        active.tracker = CompletionTracker::for_checklist(&active.checklist);
        active.navigation = NavigationState::new();
        active.all_required_complete = active.tracker.all_mandatory_complete(&active.checklist);

        let identifier = active.identifier.clone();
        self.saver.schedule_remove(&identifier);
        self.publish();
    }

    /// Session teardown: waits for any pending save, then stops the worker.
    pub async fn close(self) {
        self.saver.shutdown().await;
    }

    // The latch only ever fires; un-checking afterwards does not clear it.
    fn refresh_latch(&mut self) {
        if let Some(active) = self.active.as_mut() {
            if !active.all_required_complete
                && active.tracker.all_mandatory_complete(&active.checklist)
            {
                active.all_required_complete = true;
            }
        }
    }

    fn publish(&self) {
        self.view_tx.send_replace(self.build_view());
    }

    fn publish_and_save(&mut self) {
        self.publish();
        if let Some(active) = &self.active {
            let state = SavedChecklistState::capture(
                active.navigation.position(),
                &active.tracker,
                &active.checklist,
            );
            self.saver.schedule_save(&active.identifier, state);
        }
    }

    fn build_view(&self) -> SessionView {
        let Some(active) = &self.active else {
            return SessionView::loading();
        };

        let pos = active.navigation.position();
        let completed_items = active.tracker.completed_in(pos.section, pos.list);
        let list_total =
            active.checklist.list(pos.section, pos.list).map(|l| l.task_count()).unwrap_or(0);

        SessionView {
            phase: SessionPhase::Ready,
            checklist: Some(active.checklist.clone()),
            error: None,
            position: pos,
            list_progress: Progress::new(completed_items.len(), list_total),
            document_progress: Progress::new(
                active.tracker.completed_count(),
                active.checklist.task_count(),
            ),
            completed_items,
            all_required_complete: active.all_required_complete,
        }
    }
}
