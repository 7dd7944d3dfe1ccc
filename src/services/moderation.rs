use serde::Serialize;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{
    Item, ItemStatus, NewPointTransaction, PointTransaction, TransactionType, User, UserStatus,
};
use crate::services::catalog::validate_point_value;
use crate::services::ledger::MAX_POINTS;
use crate::services::marketplace::Marketplace;
use crate::services::user_directory::UserDirectory;

#[derive(Debug, Clone, Serialize)]
pub struct PointAdjustment {
    pub user: User,
    pub transaction: PointTransaction,
}

impl Marketplace {
    /// Publishes a listing that is waiting for moderation
    #[tracing::instrument(skip(self), fields(item_id = %id))]
    pub fn approve_item(&self, id: Uuid) -> Result<Item> {
        let _guard = self.lock_workflow();
        let item = self.transition_item(id, ItemStatus::PendingApproval, ItemStatus::Available)?;

        tracing::info!(item_id = %item.id, "Item approved");

        Ok(item)
    }

    /// Rejects a listing and keeps the reason on the item for auditing
    #[tracing::instrument(skip(self, reason), fields(item_id = %id))]
    pub fn reject_item(&self, id: Uuid, reason: &str) -> Result<Item> {
        if reason.trim().is_empty() {
            return Err(AppError::Validation(
                "A rejection reason is required".to_string(),
            ));
        }

        let _guard = self.lock_workflow();
        let mut item = self.require_item(id)?;
        if item.status != ItemStatus::PendingApproval {
            return Err(AppError::InvalidTransition {
                entity: "item",
                from: item.status.to_string(),
                to: ItemStatus::Rejected.to_string(),
            });
        }

        item.status = ItemStatus::Rejected;
        item.rejection_reason = Some(reason.trim().to_string());
        item.updated_at = self.now();
        self.store().save_item(item.clone())?;

        tracing::info!(item_id = %item.id, "Item rejected");

        Ok(item)
    }

    /// Admin correction of a listing's price
    #[tracing::instrument(skip(self), fields(item_id = %id))]
    pub fn correct_point_value(&self, id: Uuid, point_value: i64) -> Result<Item> {
        validate_point_value(point_value)?;

        let _guard = self.lock_workflow();
        let mut item = self.require_item(id)?;
        let previous = item.point_value;
        item.point_value = point_value;
        item.updated_at = self.now();
        self.store().save_item(item.clone())?;

        tracing::info!(item_id = %item.id, previous, point_value, "Point value corrected");

        Ok(item)
    }
}

/// Grants a bonus (positive) or applies a penalty (negative) to a user
#[tracing::instrument(skip(market, users, reason), fields(user_id = %user_id))]
pub async fn adjust_user_points(
    market: &Marketplace,
    users: &dyn UserDirectory,
    user_id: Uuid,
    amount: i64,
    reason: &str,
) -> Result<PointAdjustment> {
    if amount == 0 {
        return Err(AppError::Validation(
            "Adjustment amount must not be zero".to_string(),
        ));
    }
    if amount.unsigned_abs() > MAX_POINTS.unsigned_abs() {
        return Err(AppError::Validation(format!(
            "Adjustment amount must be within {} either way",
            MAX_POINTS
        )));
    }
    if reason.trim().is_empty() {
        return Err(AppError::Validation(
            "A reason is required for point adjustments".to_string(),
        ));
    }

    let user = users.adjust_points(user_id, amount, reason).await?;

    let transaction = market.add_point_transaction(NewPointTransaction {
        user_id,
        item_id: None,
        points_amount: amount,
        transaction_type: if amount > 0 {
            TransactionType::Bonus
        } else {
            TransactionType::Penalty
        },
        description: reason.trim().to_string(),
        transaction_date: None,
    })?;

    tracing::info!(new_balance = user.points, "User points adjusted");

    Ok(PointAdjustment { user, transaction })
}

pub async fn list_users(users: &dyn UserDirectory) -> Result<Vec<User>> {
    Ok(users.list_users().await?)
}

#[tracing::instrument(skip(users))]
pub async fn set_user_status(
    users: &dyn UserDirectory,
    user_id: Uuid,
    status: UserStatus,
) -> Result<User> {
    let user = users.set_status(user_id, status).await?;

    tracing::info!(user_id = %user.id, status = ?user.status, "User status changed");

    Ok(user)
}
