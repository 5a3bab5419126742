/*
 * Responsibility
 * - request extensions から AuthCtx を取り出す FromRequestParts 実装
 * - guard が通っていないルートで使われた場合は設定ミスとして 500
 */
use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::error;

use crate::api::v1::extractors::auth_ctx::types::AuthCtx;
use crate::error::AppError;

impl<S> FromRequestParts<S> for AuthCtx
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<AuthCtx>().cloned().ok_or_else(|| {
            // Only reachable when a route uses AuthCtx without an auth guard.
            error!("AuthCtx requested on a route without an auth guard");
            AppError::Internal
        })
    }
}
