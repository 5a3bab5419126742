//! Bearer credential handling: header parsing and token verification.
use std::sync::Arc;

use thiserror::Error;

use crate::services::identity::{DecodedClaims, IdentityError, IdentityProvider};

const BEARER_PREFIX: &str = "Bearer ";

/// Auth-layer errors.
///
/// `MalformedHeader` is a format violation, not an identity problem: both end
/// up as 401 externally, but logs and tests must be able to tell them apart.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("auth header not in the required format - should be \"Bearer {{token}}\"")]
    MalformedHeader,
    #[error(transparent)]
    Verification(#[from] IdentityError),
}

/// Parses the authorization header and verifies the credential with the
/// identity provider. Holds no per-request state.
pub struct AuthService {
    provider: Arc<dyn IdentityProvider>,
}

impl AuthService {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self { provider }
    }

    /// Full admission pipeline for a raw `Authorization` header value:
    /// extract the bearer credential, then verify it.
    ///
    /// The prefix is stripped exactly once — a token that itself contains
    /// `"Bearer "` is passed to the provider verbatim.
    pub async fn parse_auth(&self, header: &str) -> Result<DecodedClaims, AuthError> {
        let Some(token) = header.strip_prefix(BEARER_PREFIX) else {
            return Err(AuthError::MalformedHeader);
        };

        self.verify_token(token).await
    }

    /// Passthrough verification seam.
    ///
    /// Provider failures keep their kind; if a kind ever needs remapping
    /// (e.g. treating revocation specially), this is the one place to do it.
    async fn verify_token(&self, token: &str) -> Result<DecodedClaims, AuthError> {
        self.provider
            .verify_id_token(token)
            .await
            .map_err(AuthError::Verification)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::{AuthError, AuthService};
    use crate::services::identity::{
        DecodedClaims, IdentityError, IdentityProvider, ProviderSession, ProviderUser,
    };

    /// Provider stub that records verification calls and replays a canned result.
    struct StubProvider {
        verify_calls: AtomicUsize,
        seen_token: Mutex<Option<String>>,
        result: Box<dyn Fn() -> Result<DecodedClaims, IdentityError> + Send + Sync>,
    }

    impl StubProvider {
        fn ok(claims: DecodedClaims) -> Self {
            Self {
                verify_calls: AtomicUsize::new(0),
                seen_token: Mutex::new(None),
                result: Box::new(move || Ok(claims.clone())),
            }
        }

        fn failing(err: fn() -> IdentityError) -> Self {
            Self {
                verify_calls: AtomicUsize::new(0),
                seen_token: Mutex::new(None),
                result: Box::new(move || Err(err())),
            }
        }
    }

    #[async_trait]
    impl IdentityProvider for StubProvider {
        fn provider_name(&self) -> &'static str {
            "stub"
        }

        async fn verify_id_token(&self, token: &str) -> Result<DecodedClaims, IdentityError> {
            self.verify_calls.fetch_add(1, Ordering::SeqCst);
            *self.seen_token.lock().unwrap() = Some(token.to_string());
            (self.result)()
        }

        async fn create_user(&self, _: &str, _: &str) -> Result<ProviderUser, IdentityError> {
            unimplemented!("not used by these tests")
        }

        async fn get_user_by_email(&self, _: &str) -> Result<ProviderUser, IdentityError> {
            unimplemented!("not used by these tests")
        }

        async fn delete_user(&self, _: &str) -> Result<(), IdentityError> {
            unimplemented!("not used by these tests")
        }

        async fn sign_in_with_email_and_password(
            &self,
            _: &str,
            _: &str,
        ) -> Result<ProviderSession, IdentityError> {
            unimplemented!("not used by these tests")
        }
    }

    fn sample_claims() -> DecodedClaims {
        let mut custom = serde_json::Map::new();
        custom.insert("superAdmin".to_string(), serde_json::Value::Bool(true));
        custom.insert("plan".to_string(), serde_json::json!("premium"));
        DecodedClaims {
            sub: "firebase-uid-1".to_string(),
            email: Some("a@example.com".to_string()),
            iat: 1_700_000_000,
            exp: 1_700_003_600,
            custom,
        }
    }

    #[tokio::test]
    async fn non_bearer_header_never_reaches_the_provider() {
        let provider = Arc::new(StubProvider::ok(sample_claims()));
        let auth = AuthService::new(provider.clone());

        for header in ["Basic xyz", "bearer abc", "Bearer", "", "Token abc"] {
            let err = auth.parse_auth(header).await.unwrap_err();
            assert!(matches!(err, AuthError::MalformedHeader), "header: {header:?}");
        }

        assert_eq!(provider.verify_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn malformed_header_message_names_the_required_format() {
        let provider = Arc::new(StubProvider::ok(sample_claims()));
        let auth = AuthService::new(provider);

        let err = auth.parse_auth("Basic xyz").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "auth header not in the required format - should be \"Bearer {token}\""
        );
    }

    #[tokio::test]
    async fn credential_is_passed_verbatim() {
        let provider = Arc::new(StubProvider::ok(sample_claims()));
        let auth = AuthService::new(provider.clone());

        auth.parse_auth("Bearer abc.def.ghi").await.unwrap();
        assert_eq!(
            provider.seen_token.lock().unwrap().as_deref(),
            Some("abc.def.ghi")
        );

        // Prefix is stripped exactly once, even when the token itself
        // contains it.
        auth.parse_auth("Bearer Bearer nested").await.unwrap();
        assert_eq!(
            provider.seen_token.lock().unwrap().as_deref(),
            Some("Bearer nested")
        );
    }

    #[tokio::test]
    async fn claims_come_back_unchanged() {
        let provider = Arc::new(StubProvider::ok(sample_claims()));
        let auth = AuthService::new(provider);

        let claims = auth.parse_auth("Bearer token").await.unwrap();
        assert_eq!(claims.sub, "firebase-uid-1");
        assert_eq!(claims.email.as_deref(), Some("a@example.com"));
        assert_eq!(claims.custom.get("plan"), Some(&serde_json::json!("premium")));
        assert!(claims.is_super_admin());
    }

    #[tokio::test]
    async fn provider_failure_kinds_survive_the_passthrough() {
        let expired = AuthService::new(Arc::new(StubProvider::failing(|| {
            IdentityError::TokenExpired
        })));
        let err = expired.parse_auth("Bearer t").await.unwrap_err();
        assert!(matches!(
            err,
            AuthError::Verification(IdentityError::TokenExpired)
        ));

        let outage = AuthService::new(Arc::new(StubProvider::failing(|| {
            IdentityError::Upstream("connect timeout".to_string())
        })));
        let err = outage.parse_auth("Bearer t").await.unwrap_err();
        assert!(matches!(
            err,
            AuthError::Verification(IdentityError::Upstream(_))
        ));
    }
}
