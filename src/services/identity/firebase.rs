use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, jwk::JwkSet};
use serde::Deserialize;
use serde_json::{Value, json};
use url::Url;

use crate::services::identity::client::{
    DecodedClaims, IdentityError, IdentityProvider, IdentityResult, ProviderSession, ProviderUser,
};

const DEFAULT_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1/";
const DEFAULT_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

/// Firebase Auth backed identity provider.
///
/// Account management goes through the identitytoolkit REST API; id tokens are
/// verified locally against Google's published signing keys (RS256, issuer and
/// audience pinned to the project). The signing keys rotate, so they are
/// fetched per verification — there is no validation cache here by design.
pub struct FirebaseAuth {
    http: reqwest::Client,
    project_id: String,
    api_key: String,
    base_url: Url,
    jwks_url: Url,
}

impl FirebaseAuth {
    pub fn new(
        project_id: &str,
        api_key: &str,
        base_url: Option<&str>,
        jwks_url: Option<&str>,
        timeout: Duration,
    ) -> IdentityResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| IdentityError::Upstream(e.to_string()))?;

        let base_url = Url::parse(base_url.unwrap_or(DEFAULT_BASE_URL))
            .map_err(|e| IdentityError::Upstream(format!("bad identity base url: {e}")))?;
        let jwks_url = Url::parse(jwks_url.unwrap_or(DEFAULT_JWKS_URL))
            .map_err(|e| IdentityError::Upstream(format!("bad jwks url: {e}")))?;

        Ok(Self {
            http,
            project_id: project_id.to_string(),
            api_key: api_key.to_string(),
            base_url,
            jwks_url,
        })
    }

    /// POST `accounts:{op}` and return the response payload.
    ///
    /// Google reports failures as `{"error":{"message":"EMAIL_EXISTS",...}}`;
    /// a 4xx becomes `Rejected` (caller-caused), everything else `Upstream`.
    async fn post_accounts(&self, op: &str, body: Value) -> IdentityResult<Value> {
        let mut url = self
            .base_url
            .join(&format!("accounts:{op}"))
            .map_err(|e| IdentityError::Upstream(e.to_string()))?;
        url.query_pairs_mut().append_pair("key", &self.api_key);

        let resp = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| IdentityError::Upstream(e.to_string()))?;

        let status = resp.status();
        let payload: Value = resp
            .json()
            .await
            .map_err(|e| IdentityError::Upstream(e.to_string()))?;

        if status.is_success() {
            return Ok(payload);
        }

        let code = payload
            .pointer("/error/message")
            .and_then(Value::as_str)
            .unwrap_or("UNKNOWN")
            .to_string();

        if status.is_client_error() {
            Err(IdentityError::Rejected {
                message: code.clone(),
                code,
            })
        } else {
            Err(IdentityError::Upstream(format!("{status}: {code}")))
        }
    }

    async fn fetch_signing_keys(&self) -> IdentityResult<JwkSet> {
        let resp = self
            .http
            .get(self.jwks_url.clone())
            .send()
            .await
            .map_err(|e| IdentityError::Upstream(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(IdentityError::Upstream(format!(
                "jwks fetch failed: {}",
                resp.status()
            )));
        }

        resp.json::<JwkSet>()
            .await
            .map_err(|e| IdentityError::Upstream(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignUpResponse {
    local_id: String,
    email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
    email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    id_token: String,
    refresh_token: String,
    expires_in: String,
}

#[async_trait]
impl IdentityProvider for FirebaseAuth {
    fn provider_name(&self) -> &'static str {
        "firebase"
    }

    async fn verify_id_token(&self, token: &str) -> IdentityResult<DecodedClaims> {
        let header = jsonwebtoken::decode_header(token)
            .map_err(|e| IdentityError::TokenInvalid(e.to_string()))?;
        let kid = header
            .kid
            .ok_or_else(|| IdentityError::TokenInvalid("token has no key id".to_string()))?;

        let keys = self.fetch_signing_keys().await?;
        let jwk = keys
            .find(&kid)
            .ok_or_else(|| IdentityError::TokenInvalid(format!("unknown signing key: {kid}")))?;
        let key = DecodingKey::from_jwk(jwk)
            .map_err(|e| IdentityError::Upstream(format!("bad signing key: {e}")))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.project_id]);
        validation.set_issuer(&[format!(
            "https://securetoken.google.com/{}",
            self.project_id
        )]);

        jsonwebtoken::decode::<DecodedClaims>(token, &key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => IdentityError::TokenExpired,
                _ => IdentityError::TokenInvalid(e.to_string()),
            })
    }

    async fn create_user(&self, email: &str, password: &str) -> IdentityResult<ProviderUser> {
        let payload = self
            .post_accounts(
                "signUp",
                json!({
                    "email": email,
                    "password": password,
                    "returnSecureToken": false,
                }),
            )
            .await?;

        let resp: SignUpResponse = serde_json::from_value(payload)
            .map_err(|e| IdentityError::Upstream(format!("unexpected signUp response: {e}")))?;

        Ok(ProviderUser {
            uid: resp.local_id,
            email: resp.email,
        })
    }

    async fn get_user_by_email(&self, email: &str) -> IdentityResult<ProviderUser> {
        let payload = self
            .post_accounts("lookup", json!({ "email": [email] }))
            .await?;

        let users = payload
            .get("users")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let user = users.into_iter().next().ok_or(IdentityError::Rejected {
            code: "EMAIL_NOT_FOUND".to_string(),
            message: "EMAIL_NOT_FOUND".to_string(),
        })?;

        let user: LookupUser = serde_json::from_value(user)
            .map_err(|e| IdentityError::Upstream(format!("unexpected lookup response: {e}")))?;

        Ok(ProviderUser {
            uid: user.local_id,
            email: user.email,
        })
    }

    async fn delete_user(&self, uid: &str) -> IdentityResult<()> {
        self.post_accounts("delete", json!({ "localId": uid }))
            .await?;
        Ok(())
    }

    async fn sign_in_with_email_and_password(
        &self,
        email: &str,
        password: &str,
    ) -> IdentityResult<ProviderSession> {
        let payload = self
            .post_accounts(
                "signInWithPassword",
                json!({
                    "email": email,
                    "password": password,
                    "returnSecureToken": true,
                }),
            )
            .await?;

        let resp: SignInResponse = serde_json::from_value(payload)
            .map_err(|e| IdentityError::Upstream(format!("unexpected signIn response: {e}")))?;

        let expires_in = resp
            .expires_in
            .parse::<i64>()
            .map_err(|_| IdentityError::Upstream("unexpected expiresIn value".to_string()))?;

        Ok(ProviderSession {
            uid: resp.local_id,
            id_token: resp.id_token,
            refresh_token: resp.refresh_token,
            expires_in,
        })
    }
}
