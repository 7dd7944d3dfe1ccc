use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{Repository, StatusSwap, StoreError};
use crate::models::{Item, ItemStatus, PointTransaction, SwapRequest};

/// Process-local store. Records live for the lifetime of the process.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    items: RwLock<Vec<Item>>,
    swap_requests: RwLock<Vec<SwapRequest>>,
    transactions: RwLock<Vec<PointTransaction>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>, StoreError> {
    lock.read().map_err(|_| StoreError::Poisoned)
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>, StoreError> {
    lock.write().map_err(|_| StoreError::Poisoned)
}

impl Repository for InMemoryStore {
    fn insert_item(&self, item: Item) -> Result<(), StoreError> {
        let mut items = write(&self.items)?;
        if items.iter().any(|existing| existing.id == item.id) {
            return Err(StoreError::Duplicate(item.id));
        }
        items.push(item);
        Ok(())
    }

    fn find_item(&self, id: Uuid) -> Result<Option<Item>, StoreError> {
        let items = read(&self.items)?;
        Ok(items.iter().find(|item| item.id == id).cloned())
    }

    fn save_item(&self, item: Item) -> Result<(), StoreError> {
        let mut items = write(&self.items)?;
        let slot = items
            .iter_mut()
            .find(|existing| existing.id == item.id)
            .ok_or(StoreError::Missing(item.id))?;
        *slot = item;
        Ok(())
    }

    fn delete_item(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut items = write(&self.items)?;
        let before = items.len();
        items.retain(|item| item.id != id);
        Ok(items.len() != before)
    }

    fn list_items(&self) -> Result<Vec<Item>, StoreError> {
        let items = read(&self.items)?;
        Ok(items.iter().rev().cloned().collect())
    }

    fn compare_and_set_item_status(
        &self,
        id: Uuid,
        expected: ItemStatus,
        next: ItemStatus,
        at: DateTime<Utc>,
    ) -> Result<StatusSwap, StoreError> {
        let mut items = write(&self.items)?;
        let Some(item) = items.iter_mut().find(|item| item.id == id) else {
            return Ok(StatusSwap::Missing);
        };

        if item.status != expected {
            return Ok(StatusSwap::Mismatch(item.status));
        }

        item.status = next;
        item.updated_at = at;
        Ok(StatusSwap::Swapped(item.clone()))
    }

    fn insert_swap_request(&self, request: SwapRequest) -> Result<(), StoreError> {
        let mut requests = write(&self.swap_requests)?;
        if requests.iter().any(|existing| existing.id == request.id) {
            return Err(StoreError::Duplicate(request.id));
        }
        requests.push(request);
        Ok(())
    }

    fn find_swap_request(&self, id: Uuid) -> Result<Option<SwapRequest>, StoreError> {
        let requests = read(&self.swap_requests)?;
        Ok(requests.iter().find(|request| request.id == id).cloned())
    }

    fn save_swap_request(&self, request: SwapRequest) -> Result<(), StoreError> {
        let mut requests = write(&self.swap_requests)?;
        let slot = requests
            .iter_mut()
            .find(|existing| existing.id == request.id)
            .ok_or(StoreError::Missing(request.id))?;
        *slot = request;
        Ok(())
    }

    fn list_swap_requests(&self) -> Result<Vec<SwapRequest>, StoreError> {
        let requests = read(&self.swap_requests)?;
        Ok(requests.iter().rev().cloned().collect())
    }

    fn append_point_transaction(&self, transaction: PointTransaction) -> Result<(), StoreError> {
        let mut transactions = write(&self.transactions)?;
        if transactions.iter().any(|existing| existing.id == transaction.id) {
            return Err(StoreError::Duplicate(transaction.id));
        }
        transactions.push(transaction);
        Ok(())
    }

    fn list_point_transactions(&self) -> Result<Vec<PointTransaction>, StoreError> {
        let transactions = read(&self.transactions)?;
        Ok(transactions.clone())
    }
}
