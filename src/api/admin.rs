use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::state::AppState;
use crate::error::Result;
use crate::jobs::balance_reconciler::{reconcile_balances, ReconciliationReport};
use crate::models::{Item, ItemStatus, User, UserStatus};
use crate::services::moderation::{self, PointAdjustment};
use crate::services::Marketplace;

#[derive(Debug, Deserialize)]
struct ItemsQuery {
    status: Option<ItemStatus>,
}

#[derive(Debug, Deserialize)]
struct RejectRequest {
    reason: String,
}

#[derive(Debug, Deserialize)]
struct PointValueRequest {
    point_value: i64,
}

#[derive(Debug, Deserialize)]
struct AdjustPointsRequest {
    amount: i64,
    reason: String,
}

#[derive(Debug, Deserialize)]
struct UserStatusRequest {
    status: UserStatus,
}

/// Moderation queue; every item when no status is given
async fn list_items(
    State(market): State<Arc<Marketplace>>,
    ApiQuery(query): ApiQuery<ItemsQuery>,
) -> Result<Json<Vec<Item>>> {
    Ok(Json(market.list_items(query.status)?))
}

async fn approve_item(
    State(market): State<Arc<Marketplace>>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Item>> {
    Ok(Json(market.approve_item(id)?))
}

async fn reject_item(
    State(market): State<Arc<Marketplace>>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<RejectRequest>,
) -> Result<Json<Item>> {
    Ok(Json(market.reject_item(id, &body.reason)?))
}

async fn correct_point_value(
    State(market): State<Arc<Marketplace>>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<PointValueRequest>,
) -> Result<Json<Item>> {
    Ok(Json(market.correct_point_value(id, body.point_value)?))
}

async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>> {
    Ok(Json(moderation::list_users(state.users.as_ref()).await?))
}

async fn adjust_user_points(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<AdjustPointsRequest>,
) -> Result<Json<PointAdjustment>> {
    let adjustment = moderation::adjust_user_points(
        &state.market,
        state.users.as_ref(),
        user_id,
        body.amount,
        &body.reason,
    )
    .await?;

    Ok(Json(adjustment))
}

async fn set_user_status(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<UserStatusRequest>,
) -> Result<Json<User>> {
    let user = moderation::set_user_status(state.users.as_ref(), user_id, body.status).await?;
    Ok(Json(user))
}

/// Runs the balance audit on demand
async fn reconciliation(State(state): State<AppState>) -> Result<Json<ReconciliationReport>> {
    let report = reconcile_balances(&state.market, state.users.as_ref()).await?;
    Ok(Json(report))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/items", get(list_items))
        .route("/admin/items/:id/approve", post(approve_item))
        .route("/admin/items/:id/reject", post(reject_item))
        .route("/admin/items/:id/point-value", put(correct_point_value))
        .route("/admin/users", get(list_users))
        .route("/admin/users/:id/points", post(adjust_user_points))
        .route("/admin/users/:id/status", put(set_user_status))
        .route("/admin/reconciliation", get(reconciliation))
}
