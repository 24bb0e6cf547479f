//! Caller identity extraction.
//!
//! Authentication lives in the upstream gateway; by the time a request
//! reaches these services the gateway has already verified the session and
//! stamped the caller onto `x-user-*` headers. Handlers take the caller as
//! an explicit [`Identity`] argument extracted from those headers.

use crate::error::AppError;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

/// Role granted by the gateway. Anything unrecognised degrades to `User`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn from_string(s: &str) -> Self {
        match s {
            "admin" => Role::Admin,
            _ => Role::User,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

/// The authenticated caller, as asserted by the gateway.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: Uuid,
    pub username: String,
    pub email: Option<String>,
    pub role: Role,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::AuthError(anyhow::anyhow!(
                    "Missing x-user-id header (required from gateway)"
                ))
            })?;
        let user_id = Uuid::parse_str(user_id).map_err(|_| {
            AppError::AuthError(anyhow::anyhow!("Invalid x-user-id header: not a UUID"))
        })?;

        let username = parts
            .headers
            .get("x-username")
            .and_then(|v| v.to_str().ok())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                AppError::AuthError(anyhow::anyhow!(
                    "Missing x-username header (required from gateway)"
                ))
            })?
            .to_string();

        let email = parts
            .headers
            .get("x-user-email")
            .and_then(|v| v.to_str().ok())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string());

        let role = parts
            .headers
            .get("x-user-role")
            .and_then(|v| v.to_str().ok())
            .map(Role::from_string)
            .unwrap_or(Role::User);

        // Surface the caller on the request span for log correlation
        let span = tracing::Span::current();
        span.record("user_id", user_id.to_string().as_str());

        Ok(Identity {
            user_id,
            username,
            email,
            role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_admin() {
        assert_eq!(Role::from_string("admin"), Role::Admin);
    }

    #[test]
    fn role_defaults_to_user() {
        assert_eq!(Role::from_string("user"), Role::User);
        assert_eq!(Role::from_string("superuser"), Role::User);
        assert_eq!(Role::from_string(""), Role::User);
    }

    #[test]
    fn admin_check() {
        let identity = Identity {
            user_id: Uuid::new_v4(),
            username: "ops".to_string(),
            email: None,
            role: Role::Admin,
        };
        assert!(identity.is_admin());
    }
}
