use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, put},
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;

use crate::api::extract::{ApiJson, ApiPath};
use crate::api::state::AppState;
use crate::error::{AppError, Result};
use crate::models::{Item, PointTransaction, SwapRequest, User, UserUpdate};
use crate::services::activity::UserActivity;
use crate::services::ledger::sum_points;
use crate::services::user_directory::UserDirectory;
use crate::services::Marketplace;

#[derive(Debug, Serialize)]
pub struct PointsResponse {
    pub user_id: Uuid,
    pub balance: i64,
    pub transactions: Vec<PointTransaction>,
}

async fn user_items(
    State(market): State<Arc<Marketplace>>,
    ApiPath(user_id): ApiPath<Uuid>,
) -> Result<Json<Vec<Item>>> {
    Ok(Json(market.items_by_owner(user_id)?))
}

async fn user_swap_requests(
    State(market): State<Arc<Marketplace>>,
    ApiPath(user_id): ApiPath<Uuid>,
) -> Result<Json<Vec<SwapRequest>>> {
    Ok(Json(market.swap_requests_for_user(user_id)?))
}

/// Ledger view: entries oldest first plus their sum
async fn user_points(
    State(market): State<Arc<Marketplace>>,
    ApiPath(user_id): ApiPath<Uuid>,
) -> Result<Json<PointsResponse>> {
    let transactions = market.ledger_for_user(user_id)?;
    let balance = sum_points(&transactions)?;

    Ok(Json(PointsResponse {
        user_id,
        balance,
        transactions,
    }))
}

async fn user_activity(
    State(market): State<Arc<Marketplace>>,
    ApiPath(user_id): ApiPath<Uuid>,
) -> Result<Json<UserActivity>> {
    Ok(Json(market.user_activity(user_id)?))
}

/// Profile edits are owned by the user service; this relays them
async fn update_user(
    State(users): State<Arc<dyn UserDirectory>>,
    ApiPath(user_id): ApiPath<Uuid>,
    ApiJson(update): ApiJson<UserUpdate>,
) -> Result<Json<User>> {
    for (field, value) in [("Username", &update.username), ("Email", &update.email)] {
        if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
            return Err(AppError::Validation(format!("{} must not be blank", field)));
        }
    }

    let user = users.update_user(user_id, update).await?;
    tracing::info!(user_id = %user.id, "User profile updated");

    Ok(Json(user))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/:id", put(update_user))
        .route("/users/:id/items", get(user_items))
        .route("/users/:id/swap-requests", get(user_swap_requests))
        .route("/users/:id/points", get(user_points))
        .route("/users/:id/activity", get(user_activity))
}
