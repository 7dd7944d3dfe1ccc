// Background jobs

pub mod balance_reconciler;
