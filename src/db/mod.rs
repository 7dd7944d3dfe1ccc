use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{Item, ItemStatus, PointTransaction, SwapRequest};

pub mod memory;
pub mod seed;

pub use memory::InMemoryStore;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("Store lock poisoned")]
    Poisoned,

    #[error("Duplicate id: {0}")]
    Duplicate(Uuid),

    #[error("Record not found: {0}")]
    Missing(Uuid),
}

/// Outcome of a compare-and-set on an item's status
#[derive(Debug, Clone, PartialEq)]
pub enum StatusSwap {
    Swapped(Item),
    Mismatch(ItemStatus),
    Missing,
}

/// Storage for items, swap requests and the point ledger.
///
/// Implementations only need to make each call atomic on its own; the service
/// layer serializes multi-record workflows.
pub trait Repository: Send + Sync {
    fn insert_item(&self, item: Item) -> Result<(), StoreError>;

    fn find_item(&self, id: Uuid) -> Result<Option<Item>, StoreError>;

    /// Replaces a stored item. Fails with `Missing` if it was deleted.
    fn save_item(&self, item: Item) -> Result<(), StoreError>;

    /// Returns whether anything was removed
    fn delete_item(&self, id: Uuid) -> Result<bool, StoreError>;

    /// All items, newest first
    fn list_items(&self) -> Result<Vec<Item>, StoreError>;

    /// Moves `id` from `expected` to `next` only if it is still in `expected`
    fn compare_and_set_item_status(
        &self,
        id: Uuid,
        expected: ItemStatus,
        next: ItemStatus,
        at: DateTime<Utc>,
    ) -> Result<StatusSwap, StoreError>;

    fn insert_swap_request(&self, request: SwapRequest) -> Result<(), StoreError>;

    fn find_swap_request(&self, id: Uuid) -> Result<Option<SwapRequest>, StoreError>;

    fn save_swap_request(&self, request: SwapRequest) -> Result<(), StoreError>;

    /// All swap requests, newest first
    fn list_swap_requests(&self) -> Result<Vec<SwapRequest>, StoreError>;

    fn append_point_transaction(&self, transaction: PointTransaction) -> Result<(), StoreError>;

    /// Ledger entries in the order they were appended
    fn list_point_transactions(&self) -> Result<Vec<PointTransaction>, StoreError>;
}
