// Services module - Business logic

pub mod activity;
pub mod catalog;
pub mod clock;
pub mod ledger;
pub mod marketplace;
pub mod moderation;
pub mod redemption;
pub mod swap_workflow;
pub mod user_directory;

pub use marketplace::Marketplace;
