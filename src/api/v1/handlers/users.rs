/*
 * Responsibility
 * - /users 系 handler
 * - DTO validation → facade (services::users) 呼び出しのみ。分岐は facade 側
 * - 認証済みルートは AuthCtx extractor で guard の結果だけを受け取る
 */
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    api::v1::dto::users::{CreateUserRequest, UpdateUserRequest, UserResponse},
    api::v1::extractors::{AuthCtx, SearchCriteria},
    error::AppError,
    services::users,
    state::AppState,
};

pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    req.validate()
        .map_err(|msg| AppError::bad_request("INVALID_USER", msg))?;

    let user = users::create_user(&state, &req).await?;

    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn get_own_user(
    State(state): State<AppState>,
    ctx: AuthCtx,
) -> Result<Json<UserResponse>, AppError> {
    let user = users::get_self(&state, &ctx).await?;

    Ok(Json(user))
}

pub async fn update_user(
    State(state): State<AppState>,
    ctx: AuthCtx,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    req.validate()
        .map_err(|msg| AppError::bad_request("INVALID_USER", msg))?;

    let user = users::update_user(&state, &ctx, &req).await?;

    Ok(Json(user))
}

// Serves both DELETE /users and the legacy POST /users/delete alias.
// TODO: drop the alias route once no client still calls it.
pub async fn delete_own_user(
    State(state): State<AppState>,
    ctx: AuthCtx,
) -> Result<StatusCode, AppError> {
    users::delete_self(&state, &ctx).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn admin_delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserResponse>, AppError> {
    let user = users::delete_by_id(&state, user_id).await?;

    Ok(Json(user))
}

pub async fn delete_cypress_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let users = users::delete_cypress_test_users(&state).await?;

    Ok(Json(users))
}

pub async fn list_users(
    State(state): State<AppState>,
    criteria: SearchCriteria,
) -> Result<Json<Vec<Value>>, AppError> {
    let users = users::list_users(&state, &criteria).await?;

    Ok(Json(users))
}
