//! Task board handlers. Tasks are private to their creator; nobody else's
//! ids resolve, admins included.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use platform_core::error::AppError;
use platform_core::middleware::identity::Identity;
use uuid::Uuid;
use validator::Validate;

use crate::{
    AppState,
    dtos::tasks::{CreateTaskRequest, TaskResponse, UpdateTaskRequest},
    models::{CreateTask, TaskStatus, UpdateTask},
};

fn parse_status(status: &str) -> Result<TaskStatus, AppError> {
    TaskStatus::parse(status).ok_or_else(|| {
        AppError::BadRequest(anyhow::anyhow!(
            "Invalid status. Valid values are: {}",
            TaskStatus::valid_values()
        ))
    })
}

pub async fn list_tasks(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Vec<TaskResponse>>, AppError> {
    let tasks = state.db.list_tasks(identity.user_id).await?;
    Ok(Json(tasks.into_iter().map(TaskResponse::from).collect()))
}

pub async fn get_task(
    State(state): State<AppState>,
    identity: Identity,
    Path(task_id): Path<Uuid>,
) -> Result<Json<TaskResponse>, AppError> {
    let task = state
        .db
        .get_task(task_id, identity.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Task not found")))?;

    Ok(Json(TaskResponse::from(task)))
}

pub async fn create_task(
    State(state): State<AppState>,
    identity: Identity,
    Json(payload): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<TaskResponse>), AppError> {
    payload.validate()?;

    let status = match payload.status.as_deref() {
        Some(status) => parse_status(status)?,
        None => TaskStatus::Pending,
    };

    let input = CreateTask {
        user_id: identity.user_id,
        username: identity.username,
        title: payload.title,
        description: payload.description,
        status,
        due_date: payload.due_date,
    };

    let task = state.db.create_task(&input).await?;
    Ok((StatusCode::CREATED, Json(TaskResponse::from(task))))
}

pub async fn update_task(
    State(state): State<AppState>,
    identity: Identity,
    Path(task_id): Path<Uuid>,
    Json(payload): Json<UpdateTaskRequest>,
) -> Result<Json<TaskResponse>, AppError> {
    let status = match payload.status.as_deref() {
        Some(status) => Some(parse_status(status)?),
        None => None,
    };

    let input = UpdateTask {
        title: payload.title,
        description: payload.description,
        status,
        due_date: payload.due_date,
    };

    let task = state
        .db
        .update_task(task_id, identity.user_id, &input)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Task not found")))?;

    Ok(Json(TaskResponse::from(task)))
}

pub async fn delete_task(
    State(state): State<AppState>,
    identity: Identity,
    Path(task_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let deleted = state.db.delete_task(task_id, identity.user_id).await?;
    if !deleted {
        return Err(AppError::NotFound(anyhow::anyhow!("Task not found")));
    }

    Ok(StatusCode::NO_CONTENT)
}
