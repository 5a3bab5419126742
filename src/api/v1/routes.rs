/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - guard が必要な範囲を route_layer で適用する
 *   - 認証のみ: /users/me, PUT/DELETE /users, /users/delete
 *   - super admin: GET /users, /users/cypress, DELETE /users/{user_id}
 */
use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
};

use crate::middleware::auth::{require_super_admin, require_user};
use crate::state::AppState;

use crate::api::v1::handlers::{
    auth::login,
    health::health,
    users::{
        admin_delete_user, create_user, delete_cypress_users, delete_own_user, get_own_user,
        list_users, update_user,
    },
};

pub fn routes(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/health", get(health))
        .route("/auth/login", post(login))
        .route("/users", post(create_user));

    let authenticated = Router::new()
        .route("/users/me", post(get_own_user))
        .route("/users", put(update_user).delete(delete_own_user))
        .route("/users/delete", post(delete_own_user))
        .route_layer(from_fn_with_state(state.clone(), require_user));

    // NOTE: /users/cypress must be registered alongside /users/{user_id};
    // axum routes the literal segment first, so cypress never matches as an id.
    let admin = Router::new()
        .route("/users", get(list_users))
        .route("/users/cypress", delete(delete_cypress_users))
        .route("/users/{user_id}", delete(admin_delete_user))
        .route_layer(from_fn_with_state(state, require_super_admin));

    public.merge(authenticated).merge(admin)
}
