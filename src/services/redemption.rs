use std::time::Instant;

use serde::Serialize;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Item, ItemStatus, PointTransaction, User, UserStatus};
use crate::services::marketplace::Marketplace;
use crate::services::user_directory::UserDirectory;

#[derive(Debug, Clone, Serialize)]
pub struct RedemptionReceipt {
    pub item: Item,
    pub transaction: PointTransaction,
    pub user: User,
}

/// Redeems an item for a user and debits their stored balance.
///
/// The flow:
/// 1. Checks the item exists, is available and is not the user's own
/// 2. Loads the user and checks they are active with enough points
/// 3. Marks the item redeemed and records the `spent` entry
/// 4. Debits the balance through the user service
///
/// If step 4 fails the item goes back on the market and a refund entry is
/// recorded, so the ledger and the stored balance stay in step.
#[tracing::instrument(skip(market, users), fields(item_id = %item_id, user_id = %user_id))]
pub async fn redeem(
    market: &Marketplace,
    users: &dyn UserDirectory,
    item_id: Uuid,
    user_id: Uuid,
) -> Result<RedemptionReceipt> {
    let start = Instant::now();

    let item = market.find_item(item_id)?;
    if item.owner_id == user_id {
        return Err(AppError::Validation(
            "You cannot redeem your own item".to_string(),
        ));
    }
    if item.status != ItemStatus::Available {
        return Err(AppError::InvalidState(format!(
            "item {} is {}",
            item.id, item.status
        )));
    }

    let user = users.get_user(user_id).await?;
    if user.status != UserStatus::Active {
        tracing::warn!(status = ?user.status, "Inactive user attempted redemption");
        return Err(AppError::InvalidState(format!(
            "user {} is {:?}",
            user.id, user.status
        )));
    }
    if user.points < item.point_value {
        return Err(AppError::InsufficientBalance {
            required: item.point_value,
            available: user.points,
        });
    }

    let redemption = market.redeem(item_id, user_id)?.ok_or_else(|| {
        AppError::InvalidState(format!("item {} is no longer available", item_id))
    })?;

    let reason = redemption.transaction.description.clone();
    let user = match users
        .add_points(user_id, redemption.transaction.points_amount, &reason)
        .await
    {
        Ok(user) => user,
        Err(e) => {
            tracing::error!(error = %e, "Balance debit failed, reverting redemption");
            market.revert_redemption(&redemption)?;
            return Err(e.into());
        }
    };

    tracing::info!(
        points = item.point_value,
        remaining_points = user.points,
        duration_ms = start.elapsed().as_millis(),
        "Redemption completed"
    );

    Ok(RedemptionReceipt {
        item: redemption.item,
        transaction: redemption.transaction,
        user,
    })
}
