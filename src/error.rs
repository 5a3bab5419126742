/*
 * Responsibility
 * - アプリ共通の AppError 定義
 * - IntoResponse 実装 (HTTP status / JSON error body)
 * - repo / auth / search-criteria エラーを統一的に変換
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::api::v1::extractors::search_criteria::SearchCriteriaError;
use crate::repos::error::RepoError;
use crate::services::auth::AuthError;
use crate::services::identity::IdentityError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{code}: {message}")]
    BadRequest { code: &'static str, message: String },
    #[error("{code}: {message}")]
    Unauthorized { code: &'static str, message: String },
    #[error("forbidden: {message}")]
    Forbidden { message: String },
    #[error("not found: {resource}")]
    NotFound { resource: &'static str },
    #[error("{code}: {message}")]
    Conflict { code: &'static str, message: String },
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }

    pub fn unauthorized(code: &'static str, message: impl Into<String>) -> Self {
        Self::Unauthorized {
            code,
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    pub fn not_found(resource: &'static str) -> Self {
        Self::NotFound { resource }
    }

    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        Self::Conflict {
            code,
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::BadRequest { code, message } => (StatusCode::BAD_REQUEST, code, message),
            AppError::Unauthorized { code, message } => (StatusCode::UNAUTHORIZED, code, message),
            AppError::Forbidden { message } => (StatusCode::FORBIDDEN, "FORBIDDEN", message),
            AppError::NotFound { resource } => (
                StatusCode::NOT_FOUND,
                "not_found",
                format!("{resource} not found."),
            ),
            AppError::Conflict { code, message } => (StatusCode::CONFLICT, code, message),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_SERVER_ERROR",
                "internal server error".into(),
            ),
        };

        let body = ErrorResponse {
            error: ErrorBody { code, message },
        };

        (status, Json(body)).into_response()
    }
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::Conflict => AppError::conflict("CONFLICT", "conflict"),
            RepoError::UnknownFilterField(_) | RepoError::InvalidFilterValue(_) => {
                AppError::bad_request("INVALID_SEARCH_CRITERIA", e.to_string())
            }
            RepoError::Db(_) => AppError::Internal,
        }
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            // Format violation, not an identity problem. Same status as a bad
            // token, but a distinct code so the two stay distinguishable.
            AuthError::MalformedHeader => {
                AppError::unauthorized("AUTH_HEADER_FORMAT", e.to_string())
            }
            AuthError::Verification(IdentityError::TokenExpired) => {
                AppError::unauthorized("TOKEN_EXPIRED", "token expired")
            }
            AuthError::Verification(IdentityError::TokenInvalid(message)) => {
                AppError::unauthorized("TOKEN_INVALID", message)
            }
            AuthError::Verification(IdentityError::Rejected { code: _, message }) => {
                AppError::unauthorized("TOKEN_REJECTED", message)
            }
            // Admission cannot be decided while the provider is down; surface
            // it as an authentication failure, not an internal error.
            AuthError::Verification(IdentityError::Upstream(message)) => {
                AppError::unauthorized("IDENTITY_UNAVAILABLE", message)
            }
        }
    }
}

impl From<SearchCriteriaError> for AppError {
    fn from(e: SearchCriteriaError) -> Self {
        AppError::bad_request("INVALID_SEARCH_CRITERIA", e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use super::AppError;
    use crate::api::v1::extractors::search_criteria::SearchCriteriaError;
    use crate::repos::error::RepoError;
    use crate::services::auth::AuthError;
    use crate::services::identity::IdentityError;

    #[test]
    fn status_mapping_follows_the_error_kind() {
        let cases: Vec<(AppError, StatusCode)> = vec![
            (AuthError::MalformedHeader.into(), StatusCode::UNAUTHORIZED),
            (
                AuthError::Verification(IdentityError::TokenExpired).into(),
                StatusCode::UNAUTHORIZED,
            ),
            (
                AuthError::Verification(IdentityError::Upstream("down".into())).into(),
                StatusCode::UNAUTHORIZED,
            ),
            (
                AppError::forbidden("super admin access required"),
                StatusCode::FORBIDDEN,
            ),
            (
                SearchCriteriaError::Undecodable("oops".into()).into(),
                StatusCode::BAD_REQUEST,
            ),
            (
                RepoError::UnknownFilterField("nope".into()).into(),
                StatusCode::BAD_REQUEST,
            ),
            (RepoError::Conflict.into(), StatusCode::CONFLICT),
            (AppError::Internal, StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn format_violation_keeps_a_code_distinct_from_verification_failures() {
        let format: AppError = AuthError::MalformedHeader.into();
        let invalid: AppError =
            AuthError::Verification(IdentityError::TokenInvalid("bad".into())).into();

        match (format, invalid) {
            (
                AppError::Unauthorized { code: a, .. },
                AppError::Unauthorized { code: b, .. },
            ) => assert_ne!(a, b),
            _ => panic!("both must map to Unauthorized"),
        }
    }
}
