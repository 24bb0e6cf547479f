use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{UserProfile, UserSettings};

#[derive(Debug, Deserialize, Default)]
pub struct UpdateProfileRequest {
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateSettingsRequest {
    pub email_notifications: Option<bool>,
    pub sms_notifications: Option<bool>,
    pub browser_notifications: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: String,
    pub location: String,
    pub phone: String,
    pub website: String,
}

impl From<UserProfile> for ProfileResponse {
    fn from(profile: UserProfile) -> Self {
        Self {
            id: profile.profile_id,
            username: profile.username,
            email: profile.email,
            avatar_url: profile.avatar_url,
            bio: profile.bio,
            location: profile.location,
            phone: profile.phone,
            website: profile.website,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub id: Uuid,
    pub username: String,
    pub email_notifications: bool,
    pub sms_notifications: bool,
    pub browser_notifications: bool,
}

impl From<UserSettings> for SettingsResponse {
    fn from(settings: UserSettings) -> Self {
        Self {
            id: settings.settings_id,
            username: settings.username,
            email_notifications: settings.email_notifications,
            sms_notifications: settings.sms_notifications,
            browser_notifications: settings.browser_notifications,
        }
    }
}
