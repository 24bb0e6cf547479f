//! Dashboard handlers: aggregate stats and the activity timeline.

use axum::{Json, extract::State};
use platform_core::error::AppError;
use platform_core::middleware::identity::Identity;

use crate::{
    AppState,
    dtos::dashboard::{ActivityItemResponse, ActivityResponse, DashboardResponse},
};

/// Aggregate counts and recent rows. Admins get the platform-wide shape,
/// everyone else their own.
pub async fn dashboard_stats(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<DashboardResponse>, AppError> {
    let response = if identity.is_admin() {
        DashboardResponse::Admin(state.db.admin_dashboard(identity.user_id).await?.into())
    } else {
        DashboardResponse::User(state.db.user_dashboard(identity.user_id).await?.into())
    };

    Ok(Json(response))
}

/// The caller's ten most recent task and order events, newest first.
pub async fn activity_timeline(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<ActivityResponse>, AppError> {
    let timeline = state.db.activity_timeline(identity.user_id).await?;

    Ok(Json(ActivityResponse {
        timeline: timeline
            .into_iter()
            .map(ActivityItemResponse::from)
            .collect(),
    }))
}
