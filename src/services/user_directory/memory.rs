use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::StatusCode;
use secrecy::Secret;
use uuid::Uuid;

use super::{AuthSession, UserDirectory, UserDirectoryError};
use crate::models::{User, UserStatus, UserUpdate};

pub const DEMO_PASSWORD: &str = "rewear-demo";
pub const DEMO_STARTING_POINTS: i64 = 100;

/// Process-local user directory used when no user service is configured,
/// and as a stand-in for the real service in tests.
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<Uuid, User>>,
    passwords: RwLock<HashMap<String, String>>,
    offline: AtomicBool,
    reject_point_changes: AtomicBool,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory holding the demo accounts that own the seed items
    pub fn demo() -> Self {
        let directory = Self::new();
        for (n, username, is_admin) in [
            (1, "alice_green", false),
            (2, "bob_swap", false),
            (3, "rewear_admin", true),
        ] {
            let user = User {
                id: Uuid::from_u128(n),
                username: username.to_string(),
                email: format!("{}@rewear.example", username),
                points: DEMO_STARTING_POINTS,
                location: None,
                avatar: None,
                is_admin,
                status: UserStatus::Active,
                created_at: Utc::now(),
            };
            directory.insert_with_password(user, DEMO_PASSWORD);
        }
        directory
    }

    pub fn insert(&self, user: User) {
        if let Ok(mut users) = self.users.write() {
            users.insert(user.id, user);
        }
    }

    pub fn insert_with_password(&self, user: User, password: &str) {
        if let Ok(mut passwords) = self.passwords.write() {
            passwords.insert(user.email.clone(), password.to_string());
        }
        self.insert(user);
    }

    /// Simulates a network outage: every call fails
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Simulates the service refusing balance changes while reads still work
    pub fn set_reject_point_changes(&self, reject: bool) {
        self.reject_point_changes.store(reject, Ordering::SeqCst);
    }

    fn ensure_online(&self) -> Result<(), UserDirectoryError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(UserDirectoryError::Unavailable(
                "user service offline".to_string(),
            ));
        }
        Ok(())
    }

    fn modify<F>(&self, user_id: Uuid, change: F) -> Result<User, UserDirectoryError>
    where
        F: FnOnce(&mut User) -> Result<(), UserDirectoryError>,
    {
        self.ensure_online()?;
        let mut users = self
            .users
            .write()
            .map_err(|_| UserDirectoryError::Unavailable("directory lock poisoned".to_string()))?;
        let user = users
            .get_mut(&user_id)
            .ok_or(UserDirectoryError::UserNotFound(user_id))?;
        change(user)?;
        Ok(user.clone())
    }

    fn change_points(&self, user_id: Uuid, amount: i64) -> Result<User, UserDirectoryError> {
        if self.reject_point_changes.load(Ordering::SeqCst) {
            self.ensure_online()?;
            return Err(UserDirectoryError::Unavailable(
                "points endpoint unavailable".to_string(),
            ));
        }

        self.modify(user_id, |user| {
            let Some(next) = user.points.checked_add(amount) else {
                return Err(UserDirectoryError::ApiError {
                    status: StatusCode::BAD_REQUEST,
                    message: format!("Point change for user {} is out of range", user.id),
                });
            };
            if next < 0 {
                return Err(UserDirectoryError::ApiError {
                    status: StatusCode::BAD_REQUEST,
                    message: format!("User {} cannot go below zero points", user.id),
                });
            }
            user.points = next;
            Ok(())
        })
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, UserDirectoryError> {
        self.ensure_online()?;

        let matches = self
            .passwords
            .read()
            .map(|passwords| passwords.get(email).map(String::as_str) == Some(password))
            .unwrap_or(false);
        if !matches {
            return Err(UserDirectoryError::InvalidCredentials);
        }

        let user = self
            .users
            .read()
            .ok()
            .and_then(|users| users.values().find(|u| u.email == email).cloned())
            .ok_or(UserDirectoryError::InvalidCredentials)?;

        Ok(AuthSession {
            user,
            access_token: Secret::new(Uuid::new_v4().simple().to_string()),
        })
    }

    async fn get_user(&self, user_id: Uuid) -> Result<User, UserDirectoryError> {
        self.modify(user_id, |_| Ok(()))
    }

    async fn list_users(&self) -> Result<Vec<User>, UserDirectoryError> {
        self.ensure_online()?;
        let users = self
            .users
            .read()
            .map_err(|_| UserDirectoryError::Unavailable("directory lock poisoned".to_string()))?;
        let mut listed: Vec<User> = users.values().cloned().collect();
        listed.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(listed)
    }

    async fn update_user(
        &self,
        user_id: Uuid,
        update: UserUpdate,
    ) -> Result<User, UserDirectoryError> {
        self.modify(user_id, |user| {
            if let Some(username) = update.username {
                user.username = username;
            }
            if let Some(email) = update.email {
                if let Ok(mut passwords) = self.passwords.write() {
                    if let Some(password) = passwords.remove(&user.email) {
                        passwords.insert(email.clone(), password);
                    }
                }
                user.email = email;
            }
            if let Some(location) = update.location {
                user.location = Some(location);
            }
            if let Some(avatar) = update.avatar {
                user.avatar = Some(avatar);
            }
            Ok(())
        })
    }

    async fn add_points(
        &self,
        user_id: Uuid,
        amount: i64,
        _reason: &str,
    ) -> Result<User, UserDirectoryError> {
        self.change_points(user_id, amount)
    }

    async fn adjust_points(
        &self,
        user_id: Uuid,
        amount: i64,
        _reason: &str,
    ) -> Result<User, UserDirectoryError> {
        self.change_points(user_id, amount)
    }

    async fn set_status(
        &self,
        user_id: Uuid,
        status: UserStatus,
    ) -> Result<User, UserDirectoryError> {
        self.modify(user_id, |user| {
            user.status = status;
            Ok(())
        })
    }

    async fn check_health(&self) -> Result<(), UserDirectoryError> {
        self.ensure_online()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_demo_accounts_can_log_in() {
        let directory = InMemoryUserDirectory::demo();

        let session = directory
            .authenticate("alice_green@rewear.example", DEMO_PASSWORD)
            .await
            .unwrap();
        assert_eq!(session.user.id, Uuid::from_u128(1));

        assert!(matches!(
            directory
                .authenticate("alice_green@rewear.example", "nope")
                .await,
            Err(UserDirectoryError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_points_cannot_go_negative() {
        let directory = InMemoryUserDirectory::demo();
        let alice = Uuid::from_u128(1);

        let user = directory.add_points(alice, -60, "Redeemed").await.unwrap();
        assert_eq!(user.points, 40);

        assert!(matches!(
            directory.add_points(alice, -60, "Redeemed").await,
            Err(UserDirectoryError::ApiError { .. })
        ));
    }

    #[tokio::test]
    async fn test_point_change_out_of_range_is_refused() {
        let directory = InMemoryUserDirectory::demo();
        let alice = Uuid::from_u128(1);

        assert!(matches!(
            directory.adjust_points(alice, i64::MAX, "Overflow").await,
            Err(UserDirectoryError::ApiError { status, .. }) if status == StatusCode::BAD_REQUEST
        ));
        assert_eq!(
            directory.get_user(alice).await.unwrap().points,
            DEMO_STARTING_POINTS
        );
    }

    #[tokio::test]
    async fn test_update_user_merges_profile_fields() {
        let directory = InMemoryUserDirectory::demo();
        let bob = Uuid::from_u128(2);

        let updated = directory
            .update_user(
                bob,
                UserUpdate {
                    email: Some("bob@closet.example".to_string()),
                    location: Some("Portland, OR".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.username, "bob_swap");
        assert_eq!(updated.location.as_deref(), Some("Portland, OR"));
        assert_eq!(updated.points, DEMO_STARTING_POINTS);

        let session = directory
            .authenticate("bob@closet.example", DEMO_PASSWORD)
            .await
            .unwrap();
        assert_eq!(session.user.id, bob);

        assert!(matches!(
            directory.update_user(Uuid::new_v4(), UserUpdate::default()).await,
            Err(UserDirectoryError::UserNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_offline_directory_fails_every_call() {
        let directory = InMemoryUserDirectory::demo();
        directory.set_offline(true);

        assert!(matches!(
            directory.get_user(Uuid::from_u128(1)).await,
            Err(UserDirectoryError::Unavailable(_))
        ));
        assert!(directory.check_health().await.is_err());
    }
}
