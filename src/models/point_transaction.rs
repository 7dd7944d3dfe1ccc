use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Earned,
    Spent,
    Bonus,
    Refund,
    Penalty,
}

impl TransactionType {
    /// Whether entries of this type must carry a negative amount
    pub fn is_debit(self) -> bool {
        matches!(self, TransactionType::Spent | TransactionType::Penalty)
    }
}

/// Immutable ledger entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointTransaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub item_id: Option<Uuid>,
    pub points_amount: i64,
    pub transaction_type: TransactionType,
    pub description: String,
    pub transaction_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPointTransaction {
    pub user_id: Uuid,
    pub item_id: Option<Uuid>,
    pub points_amount: i64,
    pub transaction_type: TransactionType,
    pub description: String,
    /// Defaults to the time of recording
    pub transaction_date: Option<DateTime<Utc>>,
}
