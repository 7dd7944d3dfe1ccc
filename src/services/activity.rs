use serde::Serialize;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{PointTransaction, SwapStatus};
use crate::services::ledger::sum_points;
use crate::services::marketplace::Marketplace;

const RECENT_TRANSACTIONS: usize = 5;

/// Dashboard numbers for one user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserActivity {
    pub user_id: Uuid,
    pub items_listed: usize,
    pub active_swaps: usize,
    pub completed_swaps: usize,
    pub ledger_balance: i64,
    /// Newest first
    pub recent_transactions: Vec<PointTransaction>,
}

impl Marketplace {
    pub fn user_activity(&self, user_id: Uuid) -> Result<UserActivity> {
        let items_listed = self.items_by_owner(user_id)?.len();

        let swaps = self.swap_requests_for_user(user_id)?;
        let active_swaps = swaps
            .iter()
            .filter(|s| s.status == SwapStatus::Pending)
            .count();
        let completed_swaps = swaps
            .iter()
            .filter(|s| s.status == SwapStatus::Accepted)
            .count();

        let ledger = self.ledger_for_user(user_id)?;
        let ledger_balance = sum_points(&ledger)?;
        let recent_transactions = ledger
            .into_iter()
            .rev()
            .take(RECENT_TRANSACTIONS)
            .collect();

        Ok(UserActivity {
            user_id,
            items_listed,
            active_swaps,
            completed_swaps,
            ledger_balance,
            recent_transactions,
        })
    }
}
