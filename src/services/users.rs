//! User access facade.
//!
//! The only place that talks to both persistence and the identity provider.
//! Handlers pass in validated DTOs and the guard-produced `AuthCtx`; nothing
//! here re-verifies credentials.
use std::collections::HashMap;

use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::v1::dto::users::{
    CreateUserRequest, RESPONSE_FIELDS, SessionResponse, UpdateUserRequest, UserResponse,
};
use crate::api::v1::extractors::{AuthCtx, SearchCriteria};
use crate::error::AppError;
use crate::repos::{session_repo, user_repo};
use crate::services::identity::{IdentityError, ProviderSession};
use crate::state::AppState;

/// Relations the list endpoint may eagerly attach.
const INCLUDABLE_RELATIONS: &[&str] = &["sessions"];

pub async fn create_user(
    state: &AppState,
    req: &CreateUserRequest,
) -> Result<UserResponse, AppError> {
    let record = match state.identity.create_user(&req.email, &req.password).await {
        Ok(record) => record,
        // Account already exists with the provider (e.g. re-signup after a
        // failed DB write): reuse it instead of failing the whole request.
        Err(IdentityError::Rejected { ref code, .. }) if code == "EMAIL_EXISTS" => state
            .identity
            .get_user_by_email(&req.email)
            .await
            .map_err(provider_error)?,
        Err(err) => return Err(provider_error(err)),
    };

    // Store the provider's canonical form of the email, not the raw input.
    let row = user_repo::create(&state.db, &record.uid, &record.email, &req.name).await?;
    info!(user_id = %row.id, "user created");

    Ok(row.into())
}

pub async fn get_self(state: &AppState, ctx: &AuthCtx) -> Result<UserResponse, AppError> {
    let row = user_repo::get_by_firebase_uid(&state.db, ctx.uid())
        .await?
        .ok_or(AppError::not_found("user"))?;

    Ok(row.into())
}

pub async fn update_user(
    state: &AppState,
    ctx: &AuthCtx,
    req: &UpdateUserRequest,
) -> Result<UserResponse, AppError> {
    let row = user_repo::get_by_firebase_uid(&state.db, ctx.uid())
        .await?
        .ok_or(AppError::not_found("user"))?;

    let row = user_repo::update(&state.db, row.id, req.name.as_deref(), req.status.as_deref())
        .await?
        .ok_or(AppError::not_found("user"))?;

    Ok(row.into())
}

pub async fn delete_self(state: &AppState, ctx: &AuthCtx) -> Result<(), AppError> {
    let row = user_repo::get_by_firebase_uid(&state.db, ctx.uid())
        .await?
        .ok_or(AppError::not_found("user"))?;

    user_repo::delete_by_id(&state.db, row.id).await?;
    state
        .identity
        .delete_user(&row.firebase_uid)
        .await
        .map_err(account_deletion_error)?;

    info!(user_id = %row.id, "user deleted own account");
    Ok(())
}

/// Admin-only deletion by row id; the caller already passed the role guard.
pub async fn delete_by_id(state: &AppState, user_id: Uuid) -> Result<UserResponse, AppError> {
    let row = user_repo::delete_by_id(&state.db, user_id)
        .await?
        .ok_or(AppError::not_found("user"))?;

    state
        .identity
        .delete_user(&row.firebase_uid)
        .await
        .map_err(account_deletion_error)?;

    info!(user_id = %row.id, "user deleted by admin");
    Ok(row.into())
}

/// Admin-only listing with caller-specified projection.
pub async fn list_users(
    state: &AppState,
    criteria: &SearchCriteria,
) -> Result<Vec<Value>, AppError> {
    validate_projection(criteria)?;

    let rows = user_repo::find(&state.db, &criteria.filter, criteria.limit).await?;

    let include_sessions = criteria.include.iter().any(|r| r == "sessions");
    let mut sessions_by_user: HashMap<Uuid, Vec<SessionResponse>> = HashMap::new();
    if include_sessions {
        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        for session in session_repo::list_for_users(&state.db, &ids).await? {
            sessions_by_user
                .entry(session.user_id)
                .or_default()
                .push(session.into());
        }
    }

    let mut results = Vec::with_capacity(rows.len());
    for row in rows {
        let user_id = row.id;
        let mut value = to_object(UserResponse::from(row))?;

        if !criteria.fields.is_empty() {
            value.retain(|key, _| criteria.fields.iter().any(|field| field == key));
        }
        if include_sessions {
            let sessions = sessions_by_user.remove(&user_id).unwrap_or_default();
            value.insert(
                "sessions".to_string(),
                serde_json::to_value(sessions).map_err(|_| AppError::Internal)?,
            );
        }

        results.push(Value::Object(value));
    }

    Ok(results)
}

/// Admin-only cleanup of cypress test users.
///
/// DB rows go first (one round trip); provider-side accounts are removed best
/// effort afterwards — a stuck provider must not leave the cleanup half done.
pub async fn delete_cypress_test_users(state: &AppState) -> Result<Vec<UserResponse>, AppError> {
    let rows = user_repo::delete_cypress_test_users(&state.db).await?;
    info!(count = rows.len(), "deleted cypress test users");

    for row in &rows {
        if let Err(err) = state.identity.delete_user(&row.firebase_uid).await {
            warn!(user_id = %row.id, error = %err, "provider cleanup failed for cypress user");
        }
    }

    Ok(rows.into_iter().map(UserResponse::from).collect())
}

pub async fn login(
    state: &AppState,
    email: &str,
    password: &str,
) -> Result<ProviderSession, AppError> {
    let session = state
        .identity
        .sign_in_with_email_and_password(email, password)
        .await
        .map_err(|err| match err {
            IdentityError::Rejected { message, .. } => {
                AppError::unauthorized("INVALID_CREDENTIALS", message)
            }
            other => {
                warn!(error = %other, "sign-in failed upstream");
                AppError::Internal
            }
        })?;

    // Known users get a session row; a provider-only account is still allowed
    // to sign in (profile creation may not have happened yet).
    if let Some(row) = user_repo::get_by_firebase_uid(&state.db, &session.uid).await? {
        session_repo::record_login(&state.db, row.id).await?;
    }

    Ok(session)
}

fn validate_projection(criteria: &SearchCriteria) -> Result<(), AppError> {
    for relation in &criteria.include {
        if !INCLUDABLE_RELATIONS.contains(&relation.as_str()) {
            return Err(AppError::bad_request(
                "UNKNOWN_RELATION",
                format!("unknown relation: {relation}"),
            ));
        }
    }
    for field in &criteria.fields {
        if !RESPONSE_FIELDS.contains(&field.as_str()) {
            return Err(AppError::bad_request(
                "UNKNOWN_FIELD",
                format!("unknown field: {field}"),
            ));
        }
    }
    Ok(())
}

fn to_object(user: UserResponse) -> Result<serde_json::Map<String, Value>, AppError> {
    match serde_json::to_value(user) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(AppError::Internal),
    }
}

/// Provider failures outside deletion: 4xx-style rejections are the caller's
/// problem, everything else is ours.
fn provider_error(err: IdentityError) -> AppError {
    match err {
        IdentityError::Rejected { code, message } => {
            warn!(code = %code, "identity provider rejected the request");
            AppError::bad_request("IDENTITY_REJECTED", message)
        }
        other => {
            warn!(error = %other, "identity provider call failed");
            AppError::Internal
        }
    }
}

/// Account-deletion failures keep the historical bad-request shape with the
/// provider's message surfaced verbatim (external compatibility), but the
/// code still records whether the cause was the caller or the provider.
fn account_deletion_error(err: IdentityError) -> AppError {
    match err {
        IdentityError::Rejected { message, .. } => {
            AppError::bad_request("IDENTITY_REJECTED", message)
        }
        other => AppError::bad_request("IDENTITY_UNAVAILABLE", other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::validate_projection;
    use crate::api::v1::extractors::SearchCriteria;

    #[test]
    fn known_relations_and_fields_pass() {
        let criteria = SearchCriteria {
            include: vec!["sessions".to_string()],
            fields: vec!["email".to_string(), "name".to_string()],
            ..SearchCriteria::default()
        };
        assert!(validate_projection(&criteria).is_ok());
    }

    #[test]
    fn unknown_relation_is_a_bad_request() {
        let criteria = SearchCriteria {
            include: vec!["passwords".to_string()],
            ..SearchCriteria::default()
        };
        assert!(validate_projection(&criteria).is_err());
    }

    #[test]
    fn unknown_field_is_a_bad_request() {
        let mut criteria = SearchCriteria::default();
        criteria.fields = vec!["secret".to_string()];
        criteria.filter.insert("status".to_string(), json!("active"));
        assert!(validate_projection(&criteria).is_err());
    }
}
