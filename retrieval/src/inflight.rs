//! Deduplication of concurrent identical requests.
//!
//! The first request for a key spawns the work as a task and registers a
//! shared handle to it. Later requests for the same key await that handle
//! instead of starting their own. The entry is removed once the task settles,
//! whether it succeeded or not.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tracing::{debug, warn};

use crate::result::{ExplanationResult, FailureKind};

type SharedResult = Shared<BoxFuture<'static, ExplanationResult>>;
type Entries = Arc<Mutex<HashMap<String, SharedResult>>>;

/// Map from request hash to the task computing it.
#[derive(Clone, Default)]
pub struct InFlightRegistry {
    entries: Entries,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Await the in-flight task for `key`, or start `work` as that task.
    ///
    /// Once started, the task runs to completion even if every caller stops
    /// waiting.
    pub async fn run<F>(&self, key: String, work: F) -> ExplanationResult
    where
        F: Future<Output = ExplanationResult> + Send + 'static,
    {
        let shared = {
            let mut entries = lock(&self.entries);
            match entries.get(&key) {
                Some(existing) => {
                    debug!("Joining in-flight request {key}");
                    existing.clone()
                }
                None => {
                    let guard = RemoveOnDrop {
                        entries: Arc::clone(&self.entries),
                        key: key.clone(),
                    };
                    let handle = tokio::spawn(async move {
                        let _guard = guard;
                        work.await
                    });
                    let shared = async move {
                        handle.await.unwrap_or_else(|e| {
                            warn!("Explanation task failed: {e}");
                            ExplanationResult::failure(FailureKind::Unknown)
                        })
                    }
                    .boxed()
                    .shared();
                    entries.insert(key, shared.clone());
                    shared
                }
            }
        };

        shared.await
    }

    /// Number of requests currently in flight.
    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn lock(entries: &Entries) -> MutexGuard<'_, HashMap<String, SharedResult>> {
    entries.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Removes a registry entry when the owning task finishes or is dropped.
struct RemoveOnDrop {
    entries: Entries,
    key: String,
}

impl Drop for RemoveOnDrop {
    fn drop(&mut self) {
        lock(&self.entries).remove(&self.key);
    }
}
