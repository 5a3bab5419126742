/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 * - Clone 前提で持つ (内部は PgPool/Arc で clone cheap)
 */
use std::sync::Arc;

use sqlx::PgPool;

use crate::services::auth::AuthService;
use crate::services::identity::IdentityProvider;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub identity: Arc<dyn IdentityProvider>,
    pub auth: Arc<AuthService>,
}

impl AppState {
    pub fn new(db: PgPool, identity: Arc<dyn IdentityProvider>, auth: Arc<AuthService>) -> Self {
        Self { db, identity, auth }
    }
}
