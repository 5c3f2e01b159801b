//! Canonical list state, optimistic patches and the derived view.
//!
//! `ListState<T>` is the single place where a page's copy of a server
//! collection changes. The derived view is an index cache rebuilt by
//! `recompute` after every change to items or filters and never edited on its
//! own.

use crate::error::{user_facing_message, ReconcileError, ReconcileResult};
use crate::filter::{FilterSet, FilterValue};
use crate::identity::EntityKey;
use crate::Record;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Pure old-item to new-item function applied optimistically.
pub type Patch<T> = Arc<dyn Fn(&T) -> T + Send + Sync>;

/// Sequence number handed out by [`ListState::begin_load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LoadTicket {
    sequence: u64,
}

impl LoadTicket {
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

/// How a successful commit was reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Server gave no replacement; the optimistic value stands.
    Kept,
    /// Server value replaced the optimistic guess.
    Replaced,
    /// The item left the list while the request was in flight.
    Vanished,
}

/// An item taken out of the list ahead of a delete request.
#[derive(Debug, Clone, PartialEq)]
pub struct Removal<T> {
    pub index: usize,
    pub item: T,
}

/// Result of [`ListState::bulk_apply`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkApplied {
    pub applied: Vec<EntityKey>,
    pub skipped: Vec<ReconcileError>,
}

struct PendingMutation<T> {
    /// Last known-authoritative value, restored on failure.
    prior: T,
    patch: Patch<T>,
}

pub struct ListState<T: Record> {
    resource: String,
    items: Vec<T>,
    filters: FilterSet,
    view: Vec<usize>,
    view_generation: u64,
    pending: HashMap<EntityKey, PendingMutation<T>>,
    issued_loads: u64,
    applied_load: u64,
    loading: bool,
    last_error: Option<ReconcileError>,
}

impl<T: Record> ListState<T> {
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            items: Vec::new(),
            filters: FilterSet::new(),
            view: Vec::new(),
            view_generation: 0,
            pending: HashMap::new(),
            issued_loads: 0,
            applied_load: 0,
            loading: false,
            last_error: None,
        }
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, key: &EntityKey) -> Option<&T> {
        self.position(key).map(|index| &self.items[index])
    }

    /// Items passing every active filter, in canonical order.
    pub fn view(&self) -> impl Iterator<Item = &T> + '_ {
        self.view.iter().filter_map(|&index| self.items.get(index))
    }

    pub fn view_cloned(&self) -> Vec<T> {
        self.view().cloned().collect()
    }

    pub fn view_len(&self) -> usize {
        self.view.len()
    }

    /// Bumped once per derived-view recomputation.
    pub fn view_generation(&self) -> u64 {
        self.view_generation
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn is_pending(&self, key: &EntityKey) -> bool {
        self.pending.contains_key(key)
    }

    pub fn pending_keys(&self) -> BTreeSet<EntityKey> {
        self.pending.keys().cloned().collect()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn last_error(&self) -> Option<&ReconcileError> {
        self.last_error.as_ref()
    }

    /// Sorted distinct non-empty values of `field` across all items.
    pub fn facet(&self, field: &str) -> Vec<String> {
        let values: BTreeSet<&str> = self
            .items
            .iter()
            .flat_map(|item| item.field_values(field))
            .filter(|value| !value.trim().is_empty())
            .collect();
        values.into_iter().map(str::to_string).collect()
    }

    /// Number of items per distinct value of `field`.
    pub fn count_by(&self, field: &str) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for item in &self.items {
            for value in item.field_values(field) {
                *counts.entry(value.to_string()).or_insert(0) += 1;
            }
        }
        counts
    }

    // ------------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------------

    pub fn begin_load(&mut self) -> LoadTicket {
        self.issued_loads += 1;
        self.loading = true;
        LoadTicket {
            sequence: self.issued_loads,
        }
    }

    /// Apply the result of the fetch started with `ticket`.
    ///
    /// Returns the number of items now in the list. Results older than the
    /// last applied load are discarded.
    pub fn complete_load<E: fmt::Display>(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<T>, E>,
    ) -> ReconcileResult<usize> {
        if ticket.sequence == self.issued_loads {
            self.loading = false;
        }

        if ticket.sequence <= self.applied_load {
            tracing::debug!(
                resource = %self.resource,
                sequence = ticket.sequence,
                applied = self.applied_load,
                "discarding stale load"
            );
            return Err(ReconcileError::StaleLoad {
                resource: self.resource.clone(),
                sequence: ticket.sequence,
                applied: self.applied_load,
            });
        }

        let fetched = match result {
            Ok(items) => items,
            Err(err) => {
                let error = ReconcileError::FetchFailed {
                    resource: self.resource.clone(),
                    message: user_facing_message(&err.to_string()),
                };
                tracing::warn!(resource = %self.resource, error = %err, "load failed, keeping stale items");
                self.last_error = Some(error.clone());
                return Err(error);
            }
        };

        self.applied_load = ticket.sequence;
        self.items = self.dedupe(fetched);
        self.reapply_pending();
        self.last_error = None;
        self.recompute();

        tracing::debug!(
            resource = %self.resource,
            sequence = ticket.sequence,
            items = self.items.len(),
            pending = self.pending.len(),
            "load applied"
        );
        Ok(self.items.len())
    }

    fn dedupe(&self, fetched: Vec<T>) -> Vec<T> {
        let mut seen = HashSet::with_capacity(fetched.len());
        let mut unique = Vec::with_capacity(fetched.len());
        for item in fetched {
            let key = item.key();
            if seen.insert(key.clone()) {
                unique.push(item);
            } else {
                tracing::warn!(resource = %self.resource, key = %key, "duplicate identity key in load, keeping first");
            }
        }
        unique
    }

    /// Layer in-flight optimistic patches over freshly loaded values.
    fn reapply_pending(&mut self) {
        for (key, pending) in self.pending.iter_mut() {
            let Some(item) = self.items.iter_mut().find(|item| item.key() == *key) else {
                continue;
            };
            let patched = (*pending.patch)(item);
            if patched.key() == *key {
                pending.prior = std::mem::replace(item, patched);
            } else {
                pending.prior = item.clone();
            }
        }
    }

    // ------------------------------------------------------------------------
    // Optimistic mutations
    // ------------------------------------------------------------------------

    pub fn apply_optimistic<F>(&mut self, key: &EntityKey, patch: F) -> ReconcileResult<()>
    where
        F: Fn(&T) -> T + Send + Sync + 'static,
    {
        self.apply_patch(key, Arc::new(patch))?;
        self.recompute();
        Ok(())
    }

    /// Apply one patch to many keys with a single view recomputation.
    ///
    /// Each key is tracked independently, so each must be committed on its
    /// own.
    pub fn bulk_apply<F>(&mut self, keys: &[EntityKey], patch: F) -> BulkApplied
    where
        F: Fn(&T) -> T + Send + Sync + 'static,
    {
        let patch: Patch<T> = Arc::new(patch);
        let mut outcome = BulkApplied::default();
        for key in keys {
            match self.apply_patch(key, Arc::clone(&patch)) {
                Ok(()) => outcome.applied.push(key.clone()),
                Err(err) => outcome.skipped.push(err),
            }
        }
        self.recompute();
        outcome
    }

    fn apply_patch(&mut self, key: &EntityKey, patch: Patch<T>) -> ReconcileResult<()> {
        if self.pending.contains_key(key) {
            return Err(ReconcileError::MutationInFlight { key: key.clone() });
        }
        let index = self.position(key).ok_or_else(|| ReconcileError::MissingItem {
            resource: self.resource.clone(),
            key: key.clone(),
        })?;

        let patched = (*patch)(&self.items[index]);
        let changed_to = patched.key();
        if changed_to != *key {
            return Err(ReconcileError::IdentityChanged {
                key: key.clone(),
                changed_to,
            });
        }

        let prior = std::mem::replace(&mut self.items[index], patched);
        self.pending.insert(key.clone(), PendingMutation { prior, patch });
        Ok(())
    }

    /// Drop the pending patch for `key` without a server answer.
    ///
    /// The item goes back to its last authoritative value. Returns `false`
    /// when nothing was pending.
    pub fn abandon(&mut self, key: &EntityKey) -> bool {
        let Some(pending) = self.pending.remove(key) else {
            return false;
        };
        if let Some(index) = self.position(key) {
            self.items[index] = pending.prior;
        }
        self.recompute();
        tracing::info!(resource = %self.resource, key = %key, "mutation abandoned, rolled back");
        true
    }

    /// Forget a load whose result will never arrive.
    pub fn abandon_load(&mut self, ticket: LoadTicket) {
        if ticket.sequence == self.issued_loads && self.loading {
            self.loading = false;
            tracing::debug!(resource = %self.resource, sequence = ticket.sequence, "load abandoned");
        }
    }

    /// Reconcile the request that an optimistic patch anticipated.
    ///
    /// The pending mark for `key` is always cleared. On failure the item is
    /// rolled back to its last authoritative value.
    pub fn commit<E: fmt::Display>(
        &mut self,
        key: &EntityKey,
        result: Result<Option<T>, E>,
    ) -> ReconcileResult<CommitOutcome> {
        let Some(pending) = self.pending.remove(key) else {
            tracing::debug!(resource = %self.resource, key = %key, "commit without pending mutation");
            return Err(ReconcileError::StaleCommit { key: key.clone() });
        };
        let position = self.position(key);

        let outcome = match result {
            Ok(Some(server)) => match position {
                Some(_) if server.key() != *key => {
                    tracing::warn!(
                        resource = %self.resource,
                        key = %key,
                        returned = %server.key(),
                        "server returned a different entity, keeping optimistic value"
                    );
                    CommitOutcome::Kept
                }
                Some(index) => {
                    self.items[index] = server;
                    CommitOutcome::Replaced
                }
                None => CommitOutcome::Vanished,
            },
            Ok(None) if position.is_some() => CommitOutcome::Kept,
            Ok(None) => CommitOutcome::Vanished,
            Err(err) => {
                if let Some(index) = position {
                    self.items[index] = pending.prior;
                }
                self.recompute();
                let error = ReconcileError::MutationRejected {
                    key: key.clone(),
                    message: user_facing_message(&err.to_string()),
                };
                tracing::info!(resource = %self.resource, key = %key, error = %err, "mutation rejected, rolled back");
                self.last_error = Some(error.clone());
                return Err(error);
            }
        };

        self.recompute();
        tracing::debug!(resource = %self.resource, key = %key, ?outcome, "mutation committed");
        Ok(outcome)
    }

    // ------------------------------------------------------------------------
    // Server-originated single-item changes
    // ------------------------------------------------------------------------

    /// Insert or replace an item by key. A pending patch for the key is laid
    /// over the new value.
    pub fn upsert(&mut self, item: T) {
        let key = item.key();
        let value = match self.pending.get_mut(&key) {
            Some(pending) => {
                let patched = (*pending.patch)(&item);
                if patched.key() == key {
                    pending.prior = item;
                    patched
                } else {
                    pending.prior = item.clone();
                    item
                }
            }
            None => item,
        };
        match self.position(&key) {
            Some(index) => self.items[index] = value,
            None => self.items.push(value),
        }
        self.recompute();
    }

    pub fn remove(&mut self, key: &EntityKey) -> Option<T> {
        let index = self.position(key)?;
        let removed = self.items.remove(index);
        self.recompute();
        Some(removed)
    }

    /// Take `key` out of the list ahead of a delete request.
    ///
    /// Refused while a patch for the same key is in flight.
    pub fn remove_optimistic(&mut self, key: &EntityKey) -> ReconcileResult<Removal<T>> {
        if self.pending.contains_key(key) {
            return Err(ReconcileError::MutationInFlight { key: key.clone() });
        }
        let index = self.position(key).ok_or_else(|| ReconcileError::MissingItem {
            resource: self.resource.clone(),
            key: key.clone(),
        })?;
        let item = self.items.remove(index);
        self.recompute();
        Ok(Removal { index, item })
    }

    /// Reconcile a delete request started with [`ListState::remove_optimistic`].
    ///
    /// On failure the item returns to its old position unless a load has
    /// already brought it back.
    pub fn settle_removal<E: fmt::Display>(
        &mut self,
        removal: Removal<T>,
        result: Result<(), E>,
    ) -> ReconcileResult<()> {
        let key = removal.item.key();
        match result {
            Ok(()) => {
                if let Some(index) = self.position(&key) {
                    self.items.remove(index);
                    self.recompute();
                }
                tracing::debug!(resource = %self.resource, key = %key, "removal confirmed");
                Ok(())
            }
            Err(err) => {
                self.restore(removal);
                let error = ReconcileError::MutationRejected {
                    key: key.clone(),
                    message: user_facing_message(&err.to_string()),
                };
                tracing::info!(resource = %self.resource, key = %key, error = %err, "removal rejected, restored");
                self.last_error = Some(error.clone());
                Err(error)
            }
        }
    }

    /// Put an optimistically removed item back.
    pub fn restore(&mut self, removal: Removal<T>) {
        let key = removal.item.key();
        if self.position(&key).is_none() {
            let index = removal.index.min(self.items.len());
            self.items.insert(index, removal.item);
        }
        self.recompute();
    }

    // ------------------------------------------------------------------------
    // Filters
    // ------------------------------------------------------------------------

    pub fn set_filter(&mut self, key: impl Into<String>, value: FilterValue) {
        self.filters.set(key, value);
        self.recompute();
    }

    pub fn clear_filter(&mut self, key: &str) {
        self.filters.remove(key);
        self.recompute();
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
        self.recompute();
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn position(&self, key: &EntityKey) -> Option<usize> {
        self.items.iter().position(|item| item.key() == *key)
    }

    fn recompute(&mut self) {
        self.view = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| self.filters.matches(*item))
            .map(|(index, _)| index)
            .collect();
        self.view_generation += 1;
    }
}

impl<T: Record> fmt::Debug for ListState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListState")
            .field("resource", &self.resource)
            .field("items", &self.items.len())
            .field("view", &self.view.len())
            .field("filters", &self.filters)
            .field("pending", &self.pending_keys())
            .field("loading", &self.loading)
            .field("issued_loads", &self.issued_loads)
            .field("applied_load", &self.applied_load)
            .finish()
    }
}

// ============================================================================
// TESTS
// ============================================================================
