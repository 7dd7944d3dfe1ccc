use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::api::extract::ApiJson;
use crate::api::state::AppState;
use crate::error::{AppError, Result};
use crate::models::User;
use crate::services::user_directory::UserDirectory;

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: User,
    pub access_token: String,
}

/// Relays a login to the user service; the ledger keeps no session of its own
async fn login(
    State(users): State<Arc<dyn UserDirectory>>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    if body.email.trim().is_empty() || body.password.is_empty() {
        return Err(AppError::Validation(
            "Email and password are required".to_string(),
        ));
    }

    let session = users.authenticate(body.email.trim(), &body.password).await?;

    tracing::info!(user_id = %session.user.id, "Login relayed");

    Ok(Json(LoginResponse {
        access_token: session.access_token.expose_secret().clone(),
        user: session.user,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/auth/login", post(login))
}
