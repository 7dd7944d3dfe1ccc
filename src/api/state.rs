use std::sync::Arc;

use axum::extract::FromRef;

use crate::services::user_directory::UserDirectory;
use crate::services::Marketplace;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub market: Arc<Marketplace>,
    pub users: Arc<dyn UserDirectory>,
}

impl AppState {
    pub fn new(market: Marketplace, users: Arc<dyn UserDirectory>) -> Self {
        Self {
            market: Arc::new(market),
            users,
        }
    }
}

impl FromRef<AppState> for Arc<Marketplace> {
    fn from_ref(state: &AppState) -> Arc<Marketplace> {
        state.market.clone()
    }
}

impl FromRef<AppState> for Arc<dyn UserDirectory> {
    fn from_ref(state: &AppState) -> Arc<dyn UserDirectory> {
        state.users.clone()
    }
}
