//! Identity provider interface used by the auth service and the user facade.
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Result type for identity provider operations.
pub type IdentityResult<T> = Result<T, IdentityError>;

/// Identity-layer errors.
///
/// The split between `Rejected` and `Upstream` matters: `Rejected` means the
/// provider looked at the request and said no (caller-caused), `Upstream` means
/// the provider could not be asked at all (outage, transport, 5xx). Callers
/// decide the HTTP shape; nothing is swallowed here.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("token expired")]
    TokenExpired,
    #[error("invalid token: {0}")]
    TokenInvalid(String),
    #[error("{message}")]
    Rejected { code: String, message: String },
    #[error("identity provider error: {0}")]
    Upstream(String),
}

/// The verified claim set for an authenticated caller.
///
/// Verification must return this unchanged from what the provider decoded:
/// well-known claims land in the named fields, everything else (custom claims
/// such as `superAdmin`) is preserved verbatim in `custom`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodedClaims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub iat: i64,
    #[serde(default)]
    pub exp: i64,
    #[serde(flatten)]
    pub custom: serde_json::Map<String, Value>,
}

impl DecodedClaims {
    pub fn is_super_admin(&self) -> bool {
        self.custom
            .get("superAdmin")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// Account record as the provider reports it.
#[derive(Debug, Clone)]
pub struct ProviderUser {
    pub uid: String,
    pub email: String,
}

/// Result of an email/password sign-in.
#[derive(Debug, Clone)]
pub struct ProviderSession {
    pub uid: String,
    pub id_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

/// Remote identity provider (Firebase Auth in production).
///
/// Intentionally small: only the calls this service actually consumes.
/// Every method is a single remote round trip; no caching, no retries —
/// a failure is terminal for the current request.
#[async_trait]
pub trait IdentityProvider: Send + Sync + 'static {
    /// Provider name (for logging).
    fn provider_name(&self) -> &'static str;

    /// Verify a bearer credential and return the decoded claim set unchanged.
    async fn verify_id_token(&self, token: &str) -> IdentityResult<DecodedClaims>;

    /// Create a new account.
    async fn create_user(&self, email: &str, password: &str) -> IdentityResult<ProviderUser>;

    /// Look up an existing account by email.
    async fn get_user_by_email(&self, email: &str) -> IdentityResult<ProviderUser>;

    /// Delete an account by provider uid.
    async fn delete_user(&self, uid: &str) -> IdentityResult<()>;

    /// Email/password sign-in.
    async fn sign_in_with_email_and_password(
        &self,
        email: &str,
        password: &str,
    ) -> IdentityResult<ProviderSession>;
}

#[cfg(test)]
mod tests {
    use super::DecodedClaims;
    use serde_json::{Value, json};

    fn claims_with(custom: serde_json::Map<String, Value>) -> DecodedClaims {
        DecodedClaims {
            sub: "uid-1".to_string(),
            email: Some("a@example.com".to_string()),
            iat: 1_700_000_000,
            exp: 1_700_003_600,
            custom,
        }
    }

    #[test]
    fn super_admin_marker_read_from_custom_claims() {
        let mut custom = serde_json::Map::new();
        custom.insert("superAdmin".to_string(), Value::Bool(true));
        assert!(claims_with(custom).is_super_admin());

        assert!(!claims_with(serde_json::Map::new()).is_super_admin());

        // Wrong type never counts as the marker.
        let mut custom = serde_json::Map::new();
        custom.insert("superAdmin".to_string(), json!("true"));
        assert!(!claims_with(custom).is_super_admin());
    }

    #[test]
    fn unknown_claims_survive_a_decode() {
        let raw = json!({
            "sub": "uid-2",
            "email": "b@example.com",
            "iat": 1,
            "exp": 2,
            "aud": "my-project",
            "superAdmin": true,
            "partnerAccess": ["alpha"]
        });

        let claims: DecodedClaims = serde_json::from_value(raw).unwrap();
        assert_eq!(claims.sub, "uid-2");
        assert_eq!(claims.custom.get("aud"), Some(&json!("my-project")));
        assert_eq!(claims.custom.get("partnerAccess"), Some(&json!(["alpha"])));
        assert!(claims.is_super_admin());
    }
}
