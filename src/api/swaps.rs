use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::extract::{ApiJson, ApiPath};
use crate::api::state::AppState;
use crate::error::Result;
use crate::models::{NewSwapRequest, SwapRequest, SwapStatus};
use crate::services::swap_workflow::SwapRequestDetails;
use crate::services::Marketplace;

#[derive(Debug, Deserialize)]
struct StatusUpdate {
    status: SwapStatus,
}

async fn create_swap_request(
    State(market): State<Arc<Marketplace>>,
    ApiJson(data): ApiJson<NewSwapRequest>,
) -> Result<(StatusCode, Json<SwapRequest>)> {
    let request = market.create_swap_request(data)?;
    Ok((StatusCode::CREATED, Json(request)))
}

async fn get_swap_request(
    State(market): State<Arc<Marketplace>>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<SwapRequestDetails>> {
    Ok(Json(market.find_swap_request(id)?))
}

async fn update_swap_request(
    State(market): State<Arc<Marketplace>>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(update): ApiJson<StatusUpdate>,
) -> Result<Json<SwapRequest>> {
    Ok(Json(market.update_swap_request_status(id, update.status)?))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/swap-requests", post(create_swap_request))
        .route(
            "/swap-requests/:id",
            get(get_swap_request).patch(update_swap_request),
        )
}
