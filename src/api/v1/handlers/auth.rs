/*
 * Responsibility
 * - /auth/login handler
 * - provider への sign-in は facade 経由（ここに分岐は置かない）
 */
use axum::{Json, extract::State};

use crate::{
    api::v1::dto::auth::{LoginRequest, LoginResponse},
    error::AppError,
    services::users,
    state::AppState,
};

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    req.validate()
        .map_err(|msg| AppError::bad_request("INVALID_LOGIN", msg))?;

    let session = users::login(&state, &req.email, &req.password).await?;

    Ok(Json(LoginResponse {
        access_token: session.id_token,
        refresh_token: session.refresh_token,
        token_type: "Bearer",
        expires_in: session.expires_in,
    }))
}
