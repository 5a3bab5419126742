/*
 * Responsibility
 * - Config読み込み → 依存生成 → Router 組み立て
 * - Middleware の適用 (CORS / trace / request-id / timeout / body limit)
 * - axum::serve() で起動
 */
use std::time::Duration;
use std::{panic, process};

use anyhow::Result;
use axum::{Router, error_handling::HandleErrorLayer, http::HeaderValue, http::StatusCode, Json};
use sqlx::postgres::PgPoolOptions;
use tower::{BoxError, ServiceBuilder};
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::{ErrorBody, ErrorResponse};
use crate::services::auth::{build_auth_service, build_identity_provider};
use crate::{api, config::Config, state::AppState};

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,account_api=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    // Keep the default hook as a fallback (prints to stderr with location/payload).
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // Always surface panics via tracing so they don't get "lost"
        // (stderr can be hidden depending on how the process is launched.)
        tracing::error!(?info, "panic");

        // In development, fail fast: crash the whole process so we notice immediately.
        // In production, prefer the default behavior (stderr) and let the server keep running.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;
    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting API in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config).await?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn build_state(config: &Config) -> Result<AppState> {
    let db = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await?;

    sqlx::migrate!().run(&db).await?;

    let identity = build_identity_provider(config)?;
    let auth = build_auth_service(identity.clone());

    Ok(AppState::new(db, identity, auth))
}

fn build_router(state: AppState, config: &Config) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        // The identity provider call has no timeout of its own beyond the
        // HTTP client's; this bounds the whole request either way.
        .layer(HandleErrorLayer::new(handle_middleware_error))
        .timeout(Duration::from_secs(config.request_timeout_seconds))
        .layer(RequestBodyLimitLayer::new(config.request_body_limit_bytes))
        .layer(cors_layer(config));

    Router::new()
        .nest("/api/v1", api::v1::routes(state.clone()))
        .with_state(state)
        .layer(middleware)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    if origins.is_empty() {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

async fn handle_middleware_error(err: BoxError) -> (StatusCode, Json<ErrorResponse>) {
    if err.is::<tower::timeout::error::Elapsed>() {
        tracing::warn!("request timed out");
        return (
            StatusCode::GATEWAY_TIMEOUT,
            Json(ErrorResponse {
                error: ErrorBody {
                    code: "TIMEOUT",
                    message: "request timed out".to_string(),
                },
            }),
        );
    }

    tracing::error!(error = %err, "middleware failure");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: ErrorBody {
                code: "INTERNAL_SERVER_ERROR",
                message: "internal server error".to_string(),
            },
        }),
    )
}
