//! Background save worker.
//!
//! Saves are fire-and-forget from the session's point of view: requests go
//! through a watch channel, so a newer save supersedes a queued older one
//! and at most one write is in flight per session. `flush` waits for the
//! most recently submitted request to be acknowledged; the session calls it
//! at teardown and before switching documents.

use std::{
    sync::Arc,
    thread::{
        self,
        JoinHandle,
    },
};

use log::{
    error,
    warn,
};
use tokio::{
    runtime,
    sync::watch,
};

use super::{
    codec::{
        ProgressStore,
        SavedChecklistState,
    },
    StateStore,
};

#[derive(Debug, Clone)]
enum SaveRequest {
    Write { identifier: String, state: SavedChecklistState },
    Remove { identifier: String },
}

pub struct SaveScheduler {
    request_tx: watch::Sender<Option<(u64, SaveRequest)>>,
    acked_rx: watch::Receiver<u64>,
    next_seq: u64,
    worker: Option<JoinHandle<()>>,
}

impl SaveScheduler {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        let (request_tx, mut request_rx) = watch::channel(None);
        let (acked_tx, acked_rx) = watch::channel(0u64);

        let worker = thread::spawn(move || {
            let rt = match runtime::Builder::new_current_thread().enable_all().build() {
                Ok(rt) => rt,
                Err(e) => {
                    error!("Failed to build save worker runtime: {}", e);
                    return;
                }
            };

            let progress = ProgressStore::new(store);
            rt.block_on(async move {
                while request_rx.changed().await.is_ok() {
                    let request = request_rx.borrow_and_update().clone();
                    let Some((seq, request)) = request else {
                        continue;
                    };
                    match request {
                        SaveRequest::Write { identifier, state } => {
                            progress.save(&identifier, &state)
                        }
                        SaveRequest::Remove { identifier } => progress.clear(&identifier),
                    }
                    let _ = acked_tx.send(seq);
                }
            });
        });

        Self { request_tx, acked_rx, next_seq: 0, worker: Some(worker) }
    }

    pub fn schedule_save(&mut self, identifier: &str, state: SavedChecklistState) {
        self.submit(SaveRequest::Write { identifier: identifier.to_string(), state });
    }

    pub fn schedule_remove(&mut self, identifier: &str) {
        self.submit(SaveRequest::Remove { identifier: identifier.to_string() });
    }

    fn submit(&mut self, request: SaveRequest) {
        self.next_seq += 1;
        if self.request_tx.send(Some((self.next_seq, request))).is_err() {
            warn!("Save worker is gone; dropping save request");
        }
    }

    /// Waits until the most recently submitted request has been written.
    /// Returns immediately when nothing was ever submitted.
    pub async fn flush(&mut self) {
        let target = self.next_seq;
        if target == 0 {
            return;
        }

        let mut acked = self.acked_rx.clone();
        while *acked.borrow_and_update() < target {
            if acked.changed().await.is_err() {
                break;
            }
        }
    }

    /// Flush, close the request channel, and join the worker.
    pub async fn shutdown(mut self) {
        self.flush().await;
        drop(self.request_tx);
        if let Some(worker) = self.worker.take() {
            // The worker exits as soon as it observes the closed channel.
            let _ = worker.join();
        }
    }
}
