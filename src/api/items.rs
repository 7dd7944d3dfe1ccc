use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::state::AppState;
use crate::error::Result;
use crate::models::{item::SIZES, Category, Condition, CreateItemData, Item, UpdateItemData};
use crate::services::catalog::{suggested_point_value, SearchFilters, SortOrder};
use crate::services::redemption::{self, RedemptionReceipt};
use crate::services::Marketplace;

const DEFAULT_RELATED_LIMIT: usize = 4;

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
    category: Option<Category>,
    size: Option<String>,
    condition: Option<Condition>,
    min_points: Option<i64>,
    max_points: Option<i64>,
    #[serde(default)]
    sort: SortOrder,
}

#[derive(Debug, Serialize)]
pub struct ItemPage {
    pub total: usize,
    pub items: Vec<Item>,
}

#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub categories: Vec<Category>,
    pub sizes: Vec<&'static str>,
    pub conditions: Vec<Condition>,
}

#[derive(Debug, Deserialize)]
struct RelatedParams {
    limit: Option<usize>,
}

#[derive(Debug, Deserialize, Serialize)]
struct SuggestionParams {
    category: Category,
    condition: Condition,
}

#[derive(Debug, Serialize)]
struct SuggestionResponse {
    #[serde(flatten)]
    params: SuggestionParams,
    point_value: i64,
}

#[derive(Debug, Deserialize)]
struct RedeemRequest {
    user_id: Uuid,
}

/// Browse available items
async fn search_items(
    State(market): State<Arc<Marketplace>>,
    ApiQuery(params): ApiQuery<SearchParams>,
) -> Result<Json<ItemPage>> {
    let filters = SearchFilters {
        category: params.category,
        size: params.size.filter(|s| !s.trim().is_empty()),
        condition: params.condition,
        min_points: params.min_points,
        max_points: params.max_points,
    };

    let search = market.search_items(&params.q, filters)?;
    let items = search.sorted(params.sort);

    Ok(Json(ItemPage {
        total: items.len(),
        items,
    }))
}

async fn create_item(
    State(market): State<Arc<Marketplace>>,
    ApiJson(data): ApiJson<CreateItemData>,
) -> Result<(StatusCode, Json<Item>)> {
    let item = market.create_item(data)?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn get_item(
    State(market): State<Arc<Marketplace>>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Item>> {
    Ok(Json(market.find_item(id)?))
}

async fn update_item(
    State(market): State<Arc<Marketplace>>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(data): ApiJson<UpdateItemData>,
) -> Result<Json<Item>> {
    Ok(Json(market.update_item(id, data)?))
}

async fn delete_item(
    State(market): State<Arc<Marketplace>>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode> {
    market.delete_item(id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn related_items(
    State(market): State<Arc<Marketplace>>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(params): ApiQuery<RelatedParams>,
) -> Result<Json<Vec<Item>>> {
    let limit = params.limit.unwrap_or(DEFAULT_RELATED_LIMIT);
    Ok(Json(market.related_items(id, limit)?))
}

async fn suggested_points(
    ApiQuery(params): ApiQuery<SuggestionParams>,
) -> Json<SuggestionResponse> {
    let point_value = suggested_point_value(params.category, params.condition);
    Json(SuggestionResponse {
        params,
        point_value,
    })
}

async fn redeem_item(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<RedeemRequest>,
) -> Result<Json<RedemptionReceipt>> {
    let receipt = redemption::redeem(&state.market, state.users.as_ref(), id, body.user_id).await?;
    Ok(Json(receipt))
}

/// Reference lists for listing forms
async fn catalog() -> Json<CatalogResponse> {
    Json(CatalogResponse {
        categories: Category::ALL.to_vec(),
        sizes: SIZES.to_vec(),
        conditions: Condition::ALL.to_vec(),
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/catalog", get(catalog))
        .route("/items", get(search_items).post(create_item))
        .route("/items/suggested-points", get(suggested_points))
        .route(
            "/items/:id",
            get(get_item).patch(update_item).delete(delete_item),
        )
        .route("/items/:id/related", get(related_items))
        .route("/items/:id/redeem", post(redeem_item))
}
