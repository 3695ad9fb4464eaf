//! Authenticated session data.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,

    #[serde(default)]
    pub email: Option<String>,
}

/// A bearer session issued by the auth service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub user: AuthUser,
}

impl Session {
    /// Whether the access token expires within `skew` from now.
    pub fn is_expired(&self, skew: Duration) -> bool {
        self.expires_at <= Utc::now() + skew
    }

    pub fn user_id(&self) -> &str {
        &self.user.id
    }
}
