//! Async handle around a [`ListState`].
//!
//! The lock is taken only around state transitions and released before the
//! caller's request is awaited, so loads and mutations for different keys
//! overlap freely.
//!
//! A future that is dropped before its request resolves (timeout, `select!`,
//! a page going away) undoes its optimistic change through [`Unsettled`], so
//! no key stays pending and no load stays marked in progress.

use crate::error::{ErrorKind, ReconcileError, ReconcileResult};
use crate::filter::FilterValue;
use crate::identity::EntityKey;
use crate::list_state::{CommitOutcome, ListState, LoadTicket, Removal};
use crate::notify::{Notification, NotificationAction, NotifierPort};
use crate::Record;
use futures_util::future::join_all;
use std::collections::BTreeSet;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Per-key results of [`Reconciler::bulk_mutate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkReport {
    pub confirmed: Vec<EntityKey>,
    pub rolled_back: Vec<ReconcileError>,
    pub skipped: Vec<ReconcileError>,
}

impl BulkReport {
    pub fn is_complete_success(&self) -> bool {
        self.rolled_back.is_empty() && self.skipped.is_empty()
    }
}

// ============================================================================
// Drop guard
// ============================================================================

enum Undo<T> {
    Load(LoadTicket),
    Patches(Vec<EntityKey>),
    Removal(Removal<T>),
}

impl<T: Record> Undo<T> {
    fn apply(self, state: &mut ListState<T>) {
        match self {
            Undo::Load(ticket) => state.abandon_load(ticket),
            Undo::Patches(keys) => {
                for key in &keys {
                    state.abandon(key);
                }
            }
            Undo::Removal(removal) => state.restore(removal),
        }
    }
}

/// Optimistic state that no commit has settled yet.
///
/// Disarmed by [`Unsettled::settle`] in the same critical section that
/// commits. If dropped while still armed, the change is undone: right away if
/// the lock is free, otherwise on a spawned task.
struct Unsettled<T: Record> {
    state: Arc<Mutex<ListState<T>>>,
    undo: Option<Undo<T>>,
}

impl<T: Record> Unsettled<T> {
    fn new(state: &Arc<Mutex<ListState<T>>>, undo: Undo<T>) -> Self {
        Self {
            state: Arc::clone(state),
            undo: Some(undo),
        }
    }

    fn settle(&mut self) -> Option<Undo<T>> {
        self.undo.take()
    }
}

impl<T: Record> Drop for Unsettled<T> {
    fn drop(&mut self) {
        let Some(undo) = self.undo.take() else {
            return;
        };
        if let Ok(mut state) = self.state.try_lock() {
            undo.apply(&mut state);
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let state = Arc::clone(&self.state);
                handle.spawn(async move {
                    undo.apply(&mut *state.lock().await);
                });
            }
            Err(_) => tracing::warn!("request dropped outside a runtime, optimistic change left in place"),
        }
    }
}

// ============================================================================
// Reconciler
// ============================================================================

pub struct Reconciler<T: Record> {
    state: Arc<Mutex<ListState<T>>>,
    notifier: Arc<dyn NotifierPort>,
}

impl<T: Record> Clone for Reconciler<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            notifier: Arc::clone(&self.notifier),
        }
    }
}

impl<T: Record> Reconciler<T> {
    pub fn new(resource: impl Into<String>, notifier: Arc<dyn NotifierPort>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ListState::new(resource))),
            notifier,
        }
    }

    pub fn notifier(&self) -> &Arc<dyn NotifierPort> {
        &self.notifier
    }

    /// Fetch and replace the canonical list.
    ///
    /// `fetch` must already normalize server records into `T`.
    pub async fn load<F, Fut, E>(&self, fetch: F) -> ReconcileResult<usize>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, E>>,
        E: fmt::Display,
    {
        let ticket = self.state.lock().await.begin_load();
        let mut unsettled = Unsettled::new(&self.state, Undo::Load(ticket));
        let result = fetch().await;
        let outcome = {
            let mut state = self.state.lock().await;
            unsettled.settle();
            state.complete_load(ticket, result)
        };
        if let Err(err) = &outcome {
            self.report(err);
        }
        outcome
    }

    /// Optimistically patch `key`, await `request`, then reconcile.
    ///
    /// `request` resolves to the server's replacement for the item, if it
    /// returned one.
    pub async fn mutate<F, Fut, E>(
        &self,
        key: &EntityKey,
        patch: F,
        request: Fut,
    ) -> ReconcileResult<CommitOutcome>
    where
        F: Fn(&T) -> T + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<T>, E>>,
        E: fmt::Display,
    {
        self.state.lock().await.apply_optimistic(key, patch)?;
        let mut unsettled = Unsettled::new(&self.state, Undo::Patches(vec![key.clone()]));
        let result = request.await;
        let outcome = {
            let mut state = self.state.lock().await;
            unsettled.settle();
            state.commit(key, result)
        };
        if let Err(err) = &outcome {
            self.report(err);
        }
        outcome
    }

    /// Patch every key at once, then send one request per key concurrently.
    /// Only keys whose request fails are rolled back.
    pub async fn bulk_mutate<F, R, Fut, E>(
        &self,
        keys: &[EntityKey],
        patch: F,
        request: R,
    ) -> BulkReport
    where
        F: Fn(&T) -> T + Send + Sync + 'static,
        R: Fn(EntityKey) -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
        E: fmt::Display,
    {
        let applied = self.state.lock().await.bulk_apply(keys, patch);
        let mut unsettled = Unsettled::new(&self.state, Undo::Patches(applied.applied.clone()));
        let requests = applied.applied.iter().map(|key| {
            let pending = request(key.clone());
            async move { (key.clone(), pending.await) }
        });
        let results = join_all(requests).await;

        let mut report = BulkReport {
            skipped: applied.skipped,
            ..BulkReport::default()
        };
        {
            let mut state = self.state.lock().await;
            unsettled.settle();
            for (key, result) in results {
                match state.commit(&key, result) {
                    Ok(_) => report.confirmed.push(key),
                    Err(err) if err.kind() == ErrorKind::MutationRejected => {
                        report.rolled_back.push(err)
                    }
                    Err(err) => tracing::debug!(key = %key, error = %err, "bulk commit ignored"),
                }
            }
        }

        if !report.rolled_back.is_empty() {
            let total = report.confirmed.len() + report.rolled_back.len();
            let first = report.rolled_back[0].user_message();
            self.notifier.notify(
                Notification::error(
                    format!("{} of {} changes failed", report.rolled_back.len(), total),
                    first,
                )
                .with_action(NotificationAction::Retry),
            );
        }
        report
    }

    /// Optimistically remove `key`, await the delete `request`, then
    /// reconcile. A failed delete puts the item back where it was.
    pub async fn remove_with<Fut, E>(&self, key: &EntityKey, request: Fut) -> ReconcileResult<()>
    where
        Fut: Future<Output = Result<(), E>>,
        E: fmt::Display,
    {
        let removal = self.state.lock().await.remove_optimistic(key)?;
        let mut unsettled = Unsettled::new(&self.state, Undo::Removal(removal));
        let result = request.await;
        let outcome = {
            let mut state = self.state.lock().await;
            match unsettled.settle() {
                Some(Undo::Removal(removal)) => state.settle_removal(removal, result),
                _ => Err(ReconcileError::StaleCommit { key: key.clone() }),
            }
        };
        if let Err(err) = &outcome {
            self.report(err);
        }
        outcome
    }

    fn report(&self, err: &ReconcileError) {
        if !err.is_user_visible() {
            tracing::debug!(code = err.error_code(), error = %err, "silently ignored");
            return;
        }
        let notification = match err {
            ReconcileError::FetchFailed { resource, message } => {
                Notification::warning(format!("Could not refresh {resource}"), message.clone())
                    .with_action(NotificationAction::Retry)
            }
            other => Notification::error("Update failed", other.user_message()),
        };
        self.notifier.notify(notification);
    }

    // ------------------------------------------------------------------------
    // Filters and single-item changes
    // ------------------------------------------------------------------------

    pub async fn set_filter(&self, key: impl Into<String>, value: FilterValue) {
        self.state.lock().await.set_filter(key, value);
    }

    pub async fn clear_filter(&self, key: &str) {
        self.state.lock().await.clear_filter(key);
    }

    pub async fn clear_filters(&self) {
        self.state.lock().await.clear_filters();
    }

    pub async fn upsert(&self, item: T) {
        self.state.lock().await.upsert(item);
    }

    pub async fn remove(&self, key: &EntityKey) -> Option<T> {
        self.state.lock().await.remove(key)
    }

    // ------------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------------

    /// Run `f` against a consistent view of the state.
    pub async fn read<R>(&self, f: impl FnOnce(&ListState<T>) -> R) -> R {
        let state = self.state.lock().await;
        f(&state)
    }

    pub async fn view(&self) -> Vec<T> {
        self.read(ListState::view_cloned).await
    }

    pub async fn items(&self) -> Vec<T> {
        self.read(|state| state.items().to_vec()).await
    }

    pub async fn get(&self, key: &EntityKey) -> Option<T> {
        self.read(|state| state.get(key).cloned()).await
    }

    pub async fn is_pending(&self, key: &EntityKey) -> bool {
        self.read(|state| state.is_pending(key)).await
    }

    pub async fn pending_keys(&self) -> BTreeSet<EntityKey> {
        self.read(ListState::pending_keys).await
    }

    pub async fn is_loading(&self) -> bool {
        self.read(ListState::is_loading).await
    }

    pub async fn facet(&self, field: &str) -> Vec<String> {
        self.read(|state| state.facet(field)).await
    }
}
