use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::db::{InMemoryStore, Repository, StatusSwap};
use crate::error::{AppError, Result};
use crate::models::{Item, ItemStatus};
use crate::services::clock::{Clock, SystemClock};

/// The marketplace ledger service.
///
/// Owns the item catalog, swap requests and the point ledger through an
/// injected [`Repository`]. Operations are split across the catalog, swap
/// workflow, ledger and moderation modules; every operation that writes
/// takes the workflow lock so multi-record changes are never interleaved.
pub struct Marketplace {
    store: Arc<dyn Repository>,
    clock: Arc<dyn Clock>,
    workflow_lock: Mutex<()>,
}

impl Marketplace {
    pub fn new(store: Arc<dyn Repository>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn Repository>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            workflow_lock: Mutex::new(()),
        }
    }

    /// Service backed by a fresh process-local store
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryStore::new()))
    }

    pub(crate) fn store(&self) -> &dyn Repository {
        self.store.as_ref()
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub(crate) fn lock_workflow(&self) -> MutexGuard<'_, ()> {
        // The guard protects no data of its own, so a poisoned lock is still usable
        self.workflow_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn require_item(&self, id: Uuid) -> Result<Item> {
        self.store
            .find_item(id)?
            .ok_or_else(|| AppError::NotFound(format!("item {}", id)))
    }

    /// Compare-and-set that reports a lost race as an invalid transition
    pub(crate) fn transition_item(
        &self,
        id: Uuid,
        expected: ItemStatus,
        next: ItemStatus,
    ) -> Result<Item> {
        match self
            .store
            .compare_and_set_item_status(id, expected, next, self.now())?
        {
            StatusSwap::Swapped(item) => Ok(item),
            StatusSwap::Mismatch(current) => Err(AppError::InvalidTransition {
                entity: "item",
                from: current.to_string(),
                to: next.to_string(),
            }),
            StatusSwap::Missing => Err(AppError::NotFound(format!("item {}", id))),
        }
    }

    /// Compare-and-set for side effects that must not override a newer status.
    /// A missing item or a status other than `expected` is logged and left alone.
    pub(crate) fn settle_item(&self, id: Uuid, expected: ItemStatus, next: ItemStatus) -> Result<()> {
        match self
            .store
            .compare_and_set_item_status(id, expected, next, self.now())?
        {
            StatusSwap::Swapped(_) => {}
            StatusSwap::Mismatch(current) => {
                tracing::warn!(item_id = %id, status = %current, expected = %expected, "Item status changed elsewhere, leaving it as is");
            }
            StatusSwap::Missing => {
                tracing::warn!(item_id = %id, "Item no longer exists, skipping status update");
            }
        }
        Ok(())
    }
}
