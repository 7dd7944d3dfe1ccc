// Models module - marketplace entity representations

pub mod item;
pub mod point_transaction;
pub mod swap_request;
pub mod user;

pub use item::{Category, Condition, CreateItemData, Item, ItemStatus, UpdateItemData};
pub use point_transaction::{NewPointTransaction, PointTransaction, TransactionType};
pub use swap_request::{NewSwapRequest, SwapRequest, SwapStatus};
pub use user::{User, UserStatus, UserUpdate};
