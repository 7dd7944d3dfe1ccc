use serde::Serialize;
use uuid::Uuid;

use crate::error::Result;
use crate::services::user_directory::UserDirectory;
use crate::services::Marketplace;

#[derive(Debug, Clone, Serialize)]
pub struct BalanceMismatch {
    pub user_id: Uuid,
    pub username: String,
    pub stored_points: i64,
    pub ledger_balance: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconciliationReport {
    pub total_checked: usize,
    pub consistent: usize,
    pub mismatches: Vec<BalanceMismatch>,
}

/// Background job that audits stored balances against the ledger
///
/// For each user known to the user service:
/// 1. Sum the user's ledger entries
/// 2. Compare with the balance the user service holds
/// 3. Report (and warn about) every user where the two differ
///
/// Nothing is corrected automatically; an admin adjusts points after review.
pub async fn reconcile_balances(
    market: &Marketplace,
    users: &dyn UserDirectory,
) -> Result<ReconciliationReport> {
    let users = users.list_users().await?;
    let mut report = ReconciliationReport {
        total_checked: users.len(),
        ..Default::default()
    };

    tracing::info!(
        total_users = report.total_checked,
        "Starting balance reconciliation job"
    );

    for user in users {
        let ledger_balance = market.ledger_balance(user.id)?;

        if ledger_balance == user.points {
            report.consistent += 1;
            continue;
        }

        tracing::warn!(
            user_id = %user.id,
            stored_points = user.points,
            ledger_balance,
            "Stored balance differs from ledger"
        );

        report.mismatches.push(BalanceMismatch {
            user_id: user.id,
            username: user.username,
            stored_points: user.points,
            ledger_balance,
        });
    }

    tracing::info!(
        total_checked = report.total_checked,
        consistent = report.consistent,
        mismatches = report.mismatches.len(),
        "Balance reconciliation job completed"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::{NewPointTransaction, TransactionType, User, UserStatus};
    use crate::services::user_directory::InMemoryUserDirectory;
    use chrono::Utc;

    fn user(username: &str, points: i64) -> User {
        User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: format!("{}@example.com", username),
            points,
            location: None,
            avatar: None,
            is_admin: false,
            status: UserStatus::Active,
            created_at: Utc::now(),
        }
    }

    fn credit(market: &Marketplace, user_id: Uuid, amount: i64) {
        market
            .add_point_transaction(NewPointTransaction {
                user_id,
                item_id: None,
                points_amount: amount,
                transaction_type: TransactionType::Earned,
                description: "Listing approved".to_string(),
                transaction_date: None,
            })
            .unwrap();
    }

    #[tokio::test]
    async fn test_flags_users_whose_balance_drifted() {
        let market = Marketplace::in_memory();
        let directory = InMemoryUserDirectory::new();
        let in_sync = user("in_sync", 30);
        let drifted = user("drifted", 100);
        directory.insert(in_sync.clone());
        directory.insert(drifted.clone());
        credit(&market, in_sync.id, 30);
        credit(&market, drifted.id, 40);

        let report = reconcile_balances(&market, &directory).await.unwrap();

        assert_eq!(report.total_checked, 2);
        assert_eq!(report.consistent, 1);
        assert_eq!(report.mismatches.len(), 1);
        let mismatch = &report.mismatches[0];
        assert_eq!(mismatch.user_id, drifted.id);
        assert_eq!(mismatch.stored_points, 100);
        assert_eq!(mismatch.ledger_balance, 40);
    }

    #[tokio::test]
    async fn test_reconcile_fails_when_user_service_is_down() {
        let market = Marketplace::in_memory();
        let directory = InMemoryUserDirectory::demo();
        directory.set_offline(true);

        let err = reconcile_balances(&market, &directory).await.unwrap_err();
        assert!(matches!(err, AppError::CollaboratorUnavailable(_)));
    }
}
