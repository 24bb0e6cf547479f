//! Author profile model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuthorProfile {
    pub profile_id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub bio: String,
    pub avatar_url: Option<String>,
    pub website: String,
    pub twitter: String,
    pub github: String,
    pub linkedin: String,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

/// Input for a partial profile update.
#[derive(Debug, Clone, Default)]
pub struct UpdateAuthorProfile {
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub website: Option<String>,
    pub twitter: Option<String>,
    pub github: Option<String>,
    pub linkedin: Option<String>,
}
