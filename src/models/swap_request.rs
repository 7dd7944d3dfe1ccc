use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::item::ItemStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapStatus {
    Pending,
    Accepted,
    Rejected,
    Cancelled,
}

impl SwapStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, SwapStatus::Pending)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SwapStatus::Pending => "pending",
            SwapStatus::Accepted => "accepted",
            SwapStatus::Rejected => "rejected",
            SwapStatus::Cancelled => "cancelled",
        }
    }

    /// Status the requested item takes when a request enters this state
    pub fn requested_item_status(self) -> ItemStatus {
        match self {
            SwapStatus::Pending => ItemStatus::PendingSwap,
            SwapStatus::Accepted => ItemStatus::Redeemed,
            SwapStatus::Rejected | SwapStatus::Cancelled => ItemStatus::Available,
        }
    }

    /// Status the offered item takes, if it changes at all
    pub fn offered_item_status(self) -> Option<ItemStatus> {
        match self {
            SwapStatus::Accepted => Some(ItemStatus::Redeemed),
            _ => None,
        }
    }
}

impl fmt::Display for SwapStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapRequest {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub requested_item_id: Uuid,
    pub offered_item_id: Option<Uuid>,
    pub message: String,
    pub status: SwapStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSwapRequest {
    pub requester_id: Uuid,
    pub requested_item_id: Uuid,
    pub offered_item_id: Option<Uuid>,
    #[serde(default)]
    pub message: String,
}
