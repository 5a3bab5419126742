/// Factory: build the identity provider and `AuthService` from application `Config`.
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::config::Config;
use crate::error::AppError;
use crate::services::auth::AuthService;
use crate::services::identity::{FirebaseAuth, IdentityProvider};

pub fn build_identity_provider(config: &Config) -> Result<Arc<dyn IdentityProvider>, AppError> {
    let firebase = FirebaseAuth::new(
        &config.firebase_project_id,
        &config.firebase_api_key,
        config.identity_base_url.as_deref(),
        config.identity_jwks_url.as_deref(),
        Duration::from_secs(config.identity_timeout_seconds),
    )
    .map_err(|e| {
        warn!(error = %e, "failed to build identity provider");
        AppError::Internal
    })?;

    info!(provider = firebase.provider_name(), "identity provider ready");
    Ok(Arc::new(firebase))
}

pub fn build_auth_service(provider: Arc<dyn IdentityProvider>) -> Arc<AuthService> {
    Arc::new(AuthService::new(provider))
}
