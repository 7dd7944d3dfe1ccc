use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};

use crate::api::extract::ApiJson;
use crate::api::state::AppState;
use crate::error::Result;
use crate::models::{NewPointTransaction, PointTransaction};
use crate::services::Marketplace;

/// Records a ledger entry directly (earned points, manual refunds)
async fn add_point_transaction(
    State(market): State<Arc<Marketplace>>,
    ApiJson(data): ApiJson<NewPointTransaction>,
) -> Result<(StatusCode, Json<PointTransaction>)> {
    let transaction = market.add_point_transaction(data)?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/points/transactions", post(add_point_transaction))
}
