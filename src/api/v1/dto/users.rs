/*
 * Responsibility
 * - Users の request/response DTO
 * - validation (形式チェック) 用の validate() を持たせる
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::repos::session_repo::SessionRow;
use crate::repos::user_repo::UserRow;

/// Response field names the list endpoint's `fields` selection may name.
pub const RESPONSE_FIELDS: &[&str] = &[
    "id",
    "firebase_uid",
    "email",
    "name",
    "status",
    "is_super_admin",
    "created_at",
    "updated_at",
];

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl CreateUserRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.name.trim().is_empty() {
            return Err("name is required");
        }
        if !self.email.contains('@') {
            return Err("email must be a valid address");
        }
        if self.password.len() < 8 {
            return Err("password must be at least 8 chars");
        }

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    // None: field missing (do not update)
    pub name: Option<String>,
    pub status: Option<String>,
}

impl UpdateUserRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if let Some(name) = &self.name
            && name.trim().is_empty()
        {
            return Err("name cannot be empty");
        }
        if let Some(status) = &self.status
            && status.trim().is_empty()
        {
            return Err("status cannot be empty");
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub firebase_uid: String,
    pub email: String,
    pub name: String,
    pub status: String,
    pub is_super_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRow> for UserResponse {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            firebase_uid: row.firebase_uid,
            email: row.email,
            name: row.name,
            status: row.status,
            is_super_admin: row.is_super_admin,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
}

impl From<SessionRow> for SessionResponse {
    fn from(row: SessionRow) -> Self {
        Self {
            id: row.id,
            started_at: row.started_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CreateUserRequest, UpdateUserRequest};

    #[test]
    fn create_request_validation() {
        let ok = CreateUserRequest {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password: "longenough".to_string(),
        };
        assert!(ok.validate().is_ok());

        let bad_email = CreateUserRequest {
            email: "not-an-address".to_string(),
            ..ok_clone(&ok)
        };
        assert!(bad_email.validate().is_err());

        let short_password = CreateUserRequest {
            password: "short".to_string(),
            ..ok_clone(&ok)
        };
        assert!(short_password.validate().is_err());
    }

    #[test]
    fn update_request_rejects_blank_values() {
        let nothing = UpdateUserRequest {
            name: None,
            status: None,
        };
        assert!(nothing.validate().is_ok());

        let blank = UpdateUserRequest {
            name: Some("   ".to_string()),
            status: None,
        };
        assert!(blank.validate().is_err());
    }

    fn ok_clone(req: &CreateUserRequest) -> CreateUserRequest {
        CreateUserRequest {
            name: req.name.clone(),
            email: req.email.clone(),
            password: req.password.clone(),
        }
    }
}
