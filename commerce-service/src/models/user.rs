//! Profile and notification settings rows, one per user, created lazily on
//! first access. Account records themselves live in the identity provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserProfile {
    pub profile_id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: String,
    pub location: String,
    pub phone: String,
    pub website: String,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserSettings {
    pub settings_id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub email_notifications: bool,
    pub sms_notifications: bool,
    pub browser_notifications: bool,
    pub updated_utc: DateTime<Utc>,
}

/// Input for a partial profile update.
#[derive(Debug, Clone, Default)]
pub struct UpdateUserProfile {
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
}

/// Input for a partial settings update.
#[derive(Debug, Clone, Default)]
pub struct UpdateUserSettings {
    pub email_notifications: Option<bool>,
    pub sms_notifications: Option<bool>,
    pub browser_notifications: Option<bool>,
}
