use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dtos::posts::{AuthorRef, PostResponse};
use crate::models::AuthorProfile;

#[derive(Debug, Deserialize, Default)]
pub struct UpdateProfileRequest {
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub website: Option<String>,
    pub twitter: Option<String>,
    pub github: Option<String>,
    pub linkedin: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub user: AuthorRef,
    pub bio: String,
    pub avatar_url: Option<String>,
    pub website: String,
    pub twitter: String,
    pub github: String,
    pub linkedin: String,
}

impl From<AuthorProfile> for ProfileResponse {
    fn from(profile: AuthorProfile) -> Self {
        Self {
            id: profile.profile_id,
            user: AuthorRef {
                id: profile.user_id,
                username: profile.username,
            },
            bio: profile.bio,
            avatar_url: profile.avatar_url,
            website: profile.website,
            twitter: profile.twitter,
            github: profile.github,
            linkedin: profile.linkedin,
        }
    }
}

/// The public author page: profile plus every post by the author.
#[derive(Debug, Serialize)]
pub struct AuthorPageResponse {
    pub profile: ProfileResponse,
    pub posts: Vec<PostResponse>,
}
