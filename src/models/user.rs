use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    #[default]
    Active,
    Suspended,
    Banned,
}

/// User record owned by the user service. The ledger never stores these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub points: i64,
    pub location: Option<String>,
    pub avatar: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_deserializes_camel_case_payload() {
        let json = r#"{
            "id": "00000000-0000-0000-0000-000000000001",
            "username": "alice_green",
            "email": "alice@example.com",
            "points": 100,
            "location": null,
            "avatar": null,
            "isAdmin": true,
            "createdAt": "2024-01-15T10:00:00Z"
        }"#;

        let user: User = serde_json::from_str(json).unwrap();
        assert!(user.is_admin);
        assert_eq!(user.status, UserStatus::Active);
        assert_eq!(user.points, 100);
    }
}
