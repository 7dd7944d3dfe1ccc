use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AuthSession, UserDirectory, UserDirectoryError};
use crate::models::{User, UserStatus, UserUpdate};

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    user: User,
    access_token: String,
}

#[derive(Debug, Serialize)]
struct PointsRequest<'a> {
    amount: i64,
    reason: &'a str,
}

#[derive(Debug, Serialize)]
struct StatusRequest {
    status: UserStatus,
}

/// User service reached over HTTP/JSON
#[derive(Debug, Clone)]
pub struct HttpUserDirectory {
    client: Client,
    base_url: String,
    service_token: Option<Secret<String>>,
}

impl HttpUserDirectory {
    pub fn new(
        base_url: &str,
        service_token: Option<Secret<String>>,
        timeout: Duration,
    ) -> Result<Self, UserDirectoryError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_token,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let request = self.client.request(method, url);

        match &self.service_token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }

    async fn read_user(
        response: Response,
        user_id: Uuid,
    ) -> Result<User, UserDirectoryError> {
        let response = Self::check_status(response, Some(user_id)).await?;
        response.json::<User>().await.map_err(|e| {
            UserDirectoryError::ApiError {
                status: StatusCode::BAD_GATEWAY,
                message: format!("Failed to parse user: {}", e),
            }
        })
    }

    async fn check_status(
        response: Response,
        user_id: Option<Uuid>,
    ) -> Result<Response, UserDirectoryError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if let (StatusCode::NOT_FOUND, Some(id)) = (status, user_id) {
            return Err(UserDirectoryError::UserNotFound(id));
        }

        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        tracing::error!(status = %status, error = %message, "User service request failed");

        Err(UserDirectoryError::ApiError { status, message })
    }
}

#[async_trait]
impl UserDirectory for HttpUserDirectory {
    #[tracing::instrument(skip(self, password))]
    async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, UserDirectoryError> {
        let response = self
            .client
            .post(format!("{}/auth/login", self.base_url))
            .json(&LoginRequest { email, password })
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            tracing::warn!("Login rejected by user service");
            return Err(UserDirectoryError::InvalidCredentials);
        }

        let login: LoginResponse = Self::check_status(response, None)
            .await?
            .json()
            .await
            .map_err(|e| UserDirectoryError::ApiError {
                status: StatusCode::BAD_GATEWAY,
                message: format!("Failed to parse login response: {}", e),
            })?;

        tracing::info!(user_id = %login.user.id, "User authenticated");

        Ok(AuthSession {
            user: login.user,
            access_token: Secret::new(login.access_token),
        })
    }

    async fn get_user(&self, user_id: Uuid) -> Result<User, UserDirectoryError> {
        let response = self
            .request(Method::GET, &format!("/users/{}", user_id))
            .send()
            .await?;

        Self::read_user(response, user_id).await
    }

    async fn list_users(&self) -> Result<Vec<User>, UserDirectoryError> {
        let response = self.request(Method::GET, "/admin/users").send().await?;

        Self::check_status(response, None)
            .await?
            .json()
            .await
            .map_err(|e| UserDirectoryError::ApiError {
                status: StatusCode::BAD_GATEWAY,
                message: format!("Failed to parse user list: {}", e),
            })
    }

    #[tracing::instrument(skip(self, update))]
    async fn update_user(
        &self,
        user_id: Uuid,
        update: UserUpdate,
    ) -> Result<User, UserDirectoryError> {
        let response = self
            .request(Method::PUT, &format!("/users/{}", user_id))
            .json(&update)
            .send()
            .await?;

        Self::read_user(response, user_id).await
    }

    #[tracing::instrument(skip(self))]
    async fn add_points(
        &self,
        user_id: Uuid,
        amount: i64,
        reason: &str,
    ) -> Result<User, UserDirectoryError> {
        let response = self
            .request(Method::POST, &format!("/users/{}/add_points", user_id))
            .json(&PointsRequest { amount, reason })
            .send()
            .await?;

        Self::read_user(response, user_id).await
    }

    #[tracing::instrument(skip(self))]
    async fn adjust_points(
        &self,
        user_id: Uuid,
        amount: i64,
        reason: &str,
    ) -> Result<User, UserDirectoryError> {
        let response = self
            .request(Method::POST, &format!("/admin/users/{}/adjust_points", user_id))
            .json(&PointsRequest { amount, reason })
            .send()
            .await?;

        Self::read_user(response, user_id).await
    }

    #[tracing::instrument(skip(self))]
    async fn set_status(
        &self,
        user_id: Uuid,
        status: UserStatus,
    ) -> Result<User, UserDirectoryError> {
        let response = self
            .request(Method::PUT, &format!("/admin/users/{}/status", user_id))
            .json(&StatusRequest { status })
            .send()
            .await?;

        Self::read_user(response, user_id).await
    }

    async fn check_health(&self) -> Result<(), UserDirectoryError> {
        let response = self.request(Method::HEAD, "/health").send().await?;

        if response.status().is_server_error() {
            return Err(UserDirectoryError::Unavailable(format!(
                "User service unhealthy: HTTP {}",
                response.status()
            )));
        }

        Ok(())
    }
}
