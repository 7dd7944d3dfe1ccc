use serde::Serialize;
use uuid::Uuid;

use crate::db::StatusSwap;
use crate::error::{AppError, Result};
use crate::models::{Item, ItemStatus, NewPointTransaction, PointTransaction, TransactionType};
use crate::services::marketplace::Marketplace;

/// Item and ledger entry produced by a successful redemption
#[derive(Debug, Clone, Serialize)]
pub struct Redemption {
    pub item: Item,
    pub transaction: PointTransaction,
}

/// Largest magnitude of a single ledger entry or listing price
pub const MAX_POINTS: i64 = 1_000_000;

/// Sums ledger entries, failing instead of wrapping on overflow
pub fn sum_points(transactions: &[PointTransaction]) -> Result<i64> {
    transactions
        .iter()
        .try_fold(0i64, |total, t| total.checked_add(t.points_amount))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("ledger balance overflowed")))
}

fn validate_entry(data: &NewPointTransaction) -> Result<()> {
    if data.points_amount == 0 {
        return Err(AppError::Validation(
            "Points amount must not be zero".to_string(),
        ));
    }
    if data.points_amount.unsigned_abs() > MAX_POINTS.unsigned_abs() {
        return Err(AppError::Validation(format!(
            "Points amount must be within {} either way",
            MAX_POINTS
        )));
    }
    if data.transaction_type.is_debit() != (data.points_amount < 0) {
        return Err(AppError::Validation(format!(
            "{:?} entries must be {}",
            data.transaction_type,
            if data.transaction_type.is_debit() {
                "negative"
            } else {
                "positive"
            }
        )));
    }
    if data.description.trim().is_empty() {
        return Err(AppError::Validation("Description is required".to_string()));
    }
    Ok(())
}

impl Marketplace {
    /// Appends a ledger entry. Entries are never changed afterwards.
    #[tracing::instrument(skip(self, data), fields(user_id = %data.user_id, amount = data.points_amount))]
    pub fn add_point_transaction(&self, data: NewPointTransaction) -> Result<PointTransaction> {
        validate_entry(&data)?;
        let _guard = self.lock_workflow();
        self.record_entry(data)
    }

    /// Caller must hold the workflow lock and have validated `data`
    pub(crate) fn record_entry(&self, data: NewPointTransaction) -> Result<PointTransaction> {
        let transaction = PointTransaction {
            id: Uuid::new_v4(),
            user_id: data.user_id,
            item_id: data.item_id,
            points_amount: data.points_amount,
            transaction_type: data.transaction_type,
            description: data.description,
            transaction_date: data.transaction_date.unwrap_or_else(|| self.now()),
        };

        self.store().append_point_transaction(transaction.clone())?;

        tracing::debug!(
            transaction_id = %transaction.id,
            transaction_type = ?transaction.transaction_type,
            "Ledger entry recorded"
        );

        Ok(transaction)
    }

    /// Redeems an item for points. Returns false without recording anything
    /// if the item is missing or not available. Debiting the user's stored
    /// balance is the caller's job (see `services::redemption`).
    pub fn redeem_item(&self, item_id: Uuid, user_id: Uuid) -> bool {
        match self.redeem(item_id, user_id) {
            Ok(redemption) => redemption.is_some(),
            Err(e) => {
                tracing::error!(item_id = %item_id, error = %e, "Redemption failed");
                false
            }
        }
    }

    /// Marks the item redeemed and appends the matching `spent` entry as one unit
    #[tracing::instrument(skip(self), fields(item_id = %item_id, user_id = %user_id))]
    pub(crate) fn redeem(&self, item_id: Uuid, user_id: Uuid) -> Result<Option<Redemption>> {
        let _guard = self.lock_workflow();

        let item = match self.store().compare_and_set_item_status(
            item_id,
            ItemStatus::Available,
            ItemStatus::Redeemed,
            self.now(),
        )? {
            StatusSwap::Swapped(item) => item,
            StatusSwap::Mismatch(current) => {
                tracing::warn!(status = %current, "Item not available for redemption");
                return Ok(None);
            }
            StatusSwap::Missing => {
                tracing::warn!("Item not found for redemption");
                return Ok(None);
            }
        };

        let transaction = self.record_entry(NewPointTransaction {
            user_id,
            item_id: Some(item.id),
            points_amount: -item.point_value,
            transaction_type: TransactionType::Spent,
            description: format!("Redeemed: {}", item.title),
            transaction_date: None,
        })?;

        tracing::info!(points = item.point_value, "Item redeemed");

        Ok(Some(Redemption { item, transaction }))
    }

    /// Undoes a redemption whose balance debit did not go through: the item
    /// goes back on the market and a compensating refund is appended.
    #[tracing::instrument(skip(self, redemption), fields(item_id = %redemption.item.id))]
    pub(crate) fn revert_redemption(&self, redemption: &Redemption) -> Result<PointTransaction> {
        let _guard = self.lock_workflow();

        if let StatusSwap::Mismatch(current) = self.store().compare_and_set_item_status(
            redemption.item.id,
            ItemStatus::Redeemed,
            ItemStatus::Available,
            self.now(),
        )? {
            tracing::warn!(status = %current, "Item changed since redemption, leaving status as is");
        }

        let refund = self.record_entry(NewPointTransaction {
            user_id: redemption.transaction.user_id,
            item_id: Some(redemption.item.id),
            points_amount: -redemption.transaction.points_amount,
            transaction_type: TransactionType::Refund,
            description: format!("Reverted redemption: {}", redemption.item.title),
            transaction_date: None,
        })?;

        tracing::warn!(refund_id = %refund.id, "Redemption reverted");

        Ok(refund)
    }

    /// A user's ledger entries, oldest first
    pub fn ledger_for_user(&self, user_id: Uuid) -> Result<Vec<PointTransaction>> {
        Ok(self
            .store()
            .list_point_transactions()?
            .into_iter()
            .filter(|t| t.user_id == user_id)
            .collect())
    }

    /// Sum of a user's ledger entries
    pub fn ledger_balance(&self, user_id: Uuid) -> Result<i64> {
        sum_points(&self.ledger_for_user(user_id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::marketplace::fixtures::{available_item, listing, market};

    fn entry(user_id: Uuid, amount: i64, kind: TransactionType) -> NewPointTransaction {
        NewPointTransaction {
            user_id,
            item_id: None,
            points_amount: amount,
            transaction_type: kind,
            description: "Scripted entry".to_string(),
            transaction_date: None,
        }
    }

    #[test]
    fn test_redeem_available_item_records_spent_entry() {
        let (market, _) = market();
        let user = Uuid::new_v4();
        let item = available_item(&market, Uuid::new_v4(), "Vintage Denim Jacket", 45);

        assert!(market.redeem_item(item.id, user));

        assert_eq!(market.find_item(item.id).unwrap().status, ItemStatus::Redeemed);
        let ledger = market.ledger_for_user(user).unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger[0].points_amount, -45);
        assert_eq!(ledger[0].transaction_type, TransactionType::Spent);
        assert_eq!(ledger[0].item_id, Some(item.id));
        assert_eq!(ledger[0].description, "Redeemed: Vintage Denim Jacket");
    }

    #[test]
    fn test_redeem_unavailable_or_missing_item_fails_closed() {
        let (market, _) = market();
        let user = Uuid::new_v4();
        let pending = market
            .create_item(listing(Uuid::new_v4(), "Coat", 60))
            .unwrap();
        let sold = available_item(&market, Uuid::new_v4(), "Hat", 15);
        assert!(market.redeem_item(sold.id, Uuid::new_v4()));

        assert!(!market.redeem_item(pending.id, user));
        assert!(!market.redeem_item(sold.id, user));
        assert!(!market.redeem_item(Uuid::new_v4(), user));
        assert!(market.ledger_for_user(user).unwrap().is_empty());
    }

    #[test]
    fn test_scripted_ledger_sums_to_balance() {
        let (market, _) = market();
        let user = Uuid::new_v4();

        market
            .add_point_transaction(entry(user, 100, TransactionType::Earned))
            .unwrap();
        market
            .add_point_transaction(entry(user, -45, TransactionType::Spent))
            .unwrap();
        market
            .add_point_transaction(entry(user, 10, TransactionType::Bonus))
            .unwrap();
        market
            .add_point_transaction(entry(Uuid::new_v4(), 500, TransactionType::Earned))
            .unwrap();

        assert_eq!(market.ledger_balance(user).unwrap(), 65);
    }

    #[test]
    fn test_malformed_entries_are_rejected() {
        let (market, _) = market();
        let user = Uuid::new_v4();

        for bad in [
            entry(user, 0, TransactionType::Bonus),
            entry(user, 20, TransactionType::Spent),
            entry(user, -20, TransactionType::Refund),
        ] {
            assert!(matches!(
                market.add_point_transaction(bad),
                Err(AppError::Validation(_))
            ));
        }

        let mut blank = entry(user, 5, TransactionType::Earned);
        blank.description = " ".to_string();
        assert!(matches!(
            market.add_point_transaction(blank),
            Err(AppError::Validation(_))
        ));

        assert!(market.ledger_for_user(user).unwrap().is_empty());
    }

    #[test]
    fn test_oversized_entries_are_rejected() {
        let (market, _) = market();
        let user = Uuid::new_v4();

        for bad in [
            entry(user, i64::MAX, TransactionType::Bonus),
            entry(user, i64::MIN, TransactionType::Penalty),
            entry(user, MAX_POINTS + 1, TransactionType::Earned),
        ] {
            assert!(matches!(
                market.add_point_transaction(bad),
                Err(AppError::Validation(_))
            ));
        }

        market
            .add_point_transaction(entry(user, MAX_POINTS, TransactionType::Bonus))
            .unwrap();
        market
            .add_point_transaction(entry(user, -MAX_POINTS, TransactionType::Penalty))
            .unwrap();
        assert_eq!(market.ledger_balance(user).unwrap(), 0);
    }

    #[test]
    fn test_sum_points_reports_overflow() {
        let (market, _) = market();
        let user = Uuid::new_v4();
        let recorded = market
            .add_point_transaction(entry(user, 10, TransactionType::Bonus))
            .unwrap();

        let mut huge = recorded.clone();
        huge.points_amount = i64::MAX;
        assert!(matches!(
            sum_points(&[recorded.clone(), huge]),
            Err(AppError::Internal(_))
        ));
        assert_eq!(sum_points(&[recorded.clone(), recorded]).unwrap(), 20);
    }

    #[test]
    fn test_revert_redemption_restores_item_and_refunds() {
        let (market, _) = market();
        let user = Uuid::new_v4();
        let item = available_item(&market, Uuid::new_v4(), "Sneakers", 50);

        let redemption = market.redeem(item.id, user).unwrap().unwrap();
        let refund = market.revert_redemption(&redemption).unwrap();

        assert_eq!(refund.points_amount, 50);
        assert_eq!(refund.transaction_type, TransactionType::Refund);
        assert_eq!(market.find_item(item.id).unwrap().status, ItemStatus::Available);
        assert_eq!(market.ledger_balance(user).unwrap(), 0);
    }
}
