//! User model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::role::Role;

/// Timestamp layout used in user read-views
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// User entity
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub profile_completed: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

/// New user registration payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
}

/// User login credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
}

/// Listing filters for the admin user index
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserQuery {
    /// Page number (1-based)
    pub page: Option<u32>,
    /// Number of users per page
    pub per_page: Option<u32>,
    pub role: Option<String>,
    pub profile_completed: Option<bool>,
}

impl UserQuery {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> u32 {
        self.per_page.unwrap_or(10).clamp(1, 100)
    }

    pub fn offset(&self) -> i64 {
        (self.page() as i64 - 1) * self.per_page() as i64
    }
}

/// Public view of a user; never carries the credential
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserView {
    pub id: i64,
    pub username: String,
    pub role: Role,
    pub profile_completed: bool,
    pub created_at: String,
    pub last_login: Option<String>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
            profile_completed: user.profile_completed,
            created_at: user.created_at.format(TIMESTAMP_FORMAT).to_string(),
            last_login: user
                .last_login
                .map(|ts| ts.format(TIMESTAMP_FORMAT).to_string()),
        }
    }
}

/// One page of the user index
#[derive(Debug, Clone, Serialize)]
pub struct UserPage {
    pub items: Vec<UserView>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn view_hides_credential_and_formats_timestamps() {
        let user = User {
            id: 7,
            username: "jane".into(),
            password_hash: "$argon2id$secret".into(),
            role: Role::Venue,
            profile_completed: true,
            created_at: Utc.with_ymd_and_hms(2025, 3, 1, 20, 5, 9).unwrap(),
            last_login: None,
        };

        let view = UserView::from(&user);
        assert_eq!(view.created_at, "2025-03-01 20:05:09");
        assert_eq!(view.last_login, None);

        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "venue");
    }

    #[test]
    fn query_clamps_paging() {
        let query = UserQuery {
            page: Some(0),
            per_page: Some(500),
            ..Default::default()
        };
        assert_eq!(query.page(), 1);
        assert_eq!(query.per_page(), 100);
        assert_eq!(query.offset(), 0);

        let query = UserQuery {
            page: Some(3),
            per_page: Some(20),
            ..Default::default()
        };
        assert_eq!(query.offset(), 40);
    }
}
