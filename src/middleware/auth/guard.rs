//! Request-admission guards: header extraction → provider verification →
//! (optionally) role check, then `AuthCtx` into request extensions.
//!
//! Admission is strictly linear and per request:
//! no header / wrong scheme → 401, verification failure → 401,
//! missing super-admin marker → 403. Any failure is terminal; the handler
//! never runs on a rejected request.
use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::Next,
    response::Response,
};

use crate::api::v1::extractors::AuthCtx;
use crate::error::AppError;
use crate::services::auth::AuthError;
use crate::state::AppState;

/// Identity guard: any verified caller may pass.
///
/// Apply with `route_layer`:
/// ```ignore
/// router.route_layer(middleware::from_fn_with_state(state, require_user))
/// ```
pub async fn require_user(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let ctx = authenticate(&state, req.headers()).await?;

    // middleware → extractor への受け渡し (request-scoped, never pooled)
    req.extensions_mut().insert(ctx);

    Ok(next.run(req).await)
}

/// Role guard: same pipeline as `require_user`, plus the super-admin check.
/// A valid token without the marker is forbidden, not unauthorized.
pub async fn require_super_admin(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let ctx = authenticate(&state, req.headers()).await?;

    if !ctx.is_super_admin() {
        tracing::warn!(
            uid = %ctx.uid(),
            email = ?ctx.email(),
            "super admin route rejected a non-admin caller"
        );
        return Err(AppError::forbidden("super admin access required"));
    }

    req.extensions_mut().insert(ctx);

    Ok(next.run(req).await)
}

async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<AuthCtx, AppError> {
    // A missing header is the same format violation as a wrong scheme.
    let Some(header) = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
    else {
        tracing::warn!("authorization header missing or unreadable");
        return Err(AuthError::MalformedHeader.into());
    };

    let claims = match state.auth.parse_auth(header).await {
        Ok(claims) => claims,
        Err(err) => {
            tracing::warn!(error = %err, "request admission rejected");
            return Err(err.into());
        }
    };

    Ok(AuthCtx::new(claims))
}
