//! Portfolio CMS - bilingual content API, library for app logic and testing

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod mailer;
pub mod media;
pub mod rate_limit;
pub mod revalidate;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderName, HeaderValue, Method},
    middleware,
    routing::{get, patch, post},
    Router,
};
use chrono::Utc;
use std::{net::SocketAddr, sync::Arc};
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer,
    services::ServeDir, trace::TraceLayer,
};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::db::models::User;
use crate::state::AppState;
use crate::store::{MemoryStore, PgStore, Store};

/// Uploads are capped at 5 MB; leave room for the multipart framing
const MAX_BODY_BYTES: usize = 6 * 1024 * 1024;

/// Configure CORS from environment variables.
/// Uses ALLOWED_ORIGINS (comma-separated) or FRONTEND_ORIGIN, else the local
/// frontend dev server.
pub fn configure_cors() -> CorsLayer {
    let allowed_origins = std::env::var("ALLOWED_ORIGINS")
        .ok()
        .and_then(|s| {
            let origins: Vec<HeaderValue> = s
                .split(',')
                .filter_map(|origin| origin.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                None
            } else {
                Some(origins)
            }
        })
        .or_else(|| {
            std::env::var("FRONTEND_ORIGIN")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(|origin| vec![origin])
        })
        .unwrap_or_else(|| {
            vec![
                HeaderValue::from_static("http://localhost:3000"),
                HeaderValue::from_static("http://127.0.0.1:3000"),
            ]
        });

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
            HeaderName::from_static(routes::auth::API_SECRET_HEADER),
        ])
        .expose_headers([
            HeaderName::from_static("x-ratelimit-remaining"),
            HeaderName::from_static("x-ratelimit-reset"),
        ])
        .allow_credentials(true)
}

/// Create and configure the application router.
pub fn create_app(state: AppState) -> Router {
    let cors = configure_cors();
    let uploads = ServeDir::new(&state.config.upload_dir);

    Router::new()
        .route("/api/auth/login", post(routes::auth::login))
        .route("/api/auth/verify", get(routes::auth::verify_token))
        // content
        .route(
            "/api/content/{locale}",
            get(routes::content::get_public_content).put(routes::content::put_content_with_secret),
        )
        .route(
            "/api/admin/content/{locale}",
            get(routes::content::get_admin_content).put(routes::content::put_admin_content),
        )
        .route(
            "/api/admin/project-translations/{locale}",
            get(routes::content::get_project_translation)
                .put(routes::content::put_project_translation),
        )
        // projects
        .route("/api/projects/{locale}", get(routes::projects::list_published))
        .route("/api/projects/{locale}/{id}", get(routes::projects::get_published))
        .route("/api/admin/projects/order", post(routes::projects::reorder_projects))
        .route("/api/admin/projects/slug-check", get(routes::projects::slug_check))
        .route("/api/admin/projects/unsynced", get(routes::projects::list_unsynced))
        .route(
            "/api/admin/projects/{locale}",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route(
            "/api/admin/projects/{locale}/by-original-id/{original_id}",
            get(routes::projects::get_project).put(routes::projects::update_project),
        )
        .route(
            "/api/admin/projects/{locale}/by-original-id/{original_id}/reconcile",
            post(routes::projects::reconcile_project),
        )
        .route(
            "/api/admin/projects/{locale}/{id}",
            axum::routing::delete(routes::projects::delete_project),
        )
        // contact
        .route("/api/contact", post(routes::contact::submit))
        .route("/api/admin/contact", get(routes::contact::list))
        .route(
            "/api/admin/contact/{id}",
            patch(routes::contact::mark_read).delete(routes::contact::delete),
        )
        // site config
        .route(
            "/api/site-config",
            get(routes::site_config::get_site_config).put(routes::site_config::put_site_config),
        )
        .route("/api/site-settings", get(routes::site_config::get_site_settings))
        // media
        .route(
            "/api/admin/upload",
            post(routes::upload::upload_image).layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
        .route("/api/admin/deleteImage", post(routes::upload::delete_image))
        .nest_service("/uploads", uploads)
        // health
        .route("/health", get(routes::health::health_ping))
        .route("/health/detailed", get(routes::health::health_detailed))
        .route("/health/ready", get(routes::health::health_ready))
        .with_state(state)
        .layer(logging::middleware::propagate_request_id_layer())
        .layer(middleware::from_fn(logging::middleware::log_request))
        .layer(logging::middleware::request_id_layer())
        .layer(TraceLayer::new_for_http())
        // Compress responses with gzip/br/zstd automatically
        .layer(CompressionLayer::new())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(cors)
}

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Without a database the service keeps everything in memory; the admin
/// account then comes from ADMIN_USERNAME / ADMIN_PASSWORD.
async fn seed_memory_admin(store: &MemoryStore, config: &AppConfig) -> Result<(), BoxError> {
    let (Some(username), Some(password)) = (&config.admin_username, &config.admin_password) else {
        tracing::warn!("ADMIN_USERNAME / ADMIN_PASSWORD not set. No admin can log in.");
        return Ok(());
    };

    let password = password.clone();
    let password_hash =
        tokio::task::spawn_blocking(move || bcrypt::hash(password, bcrypt::DEFAULT_COST)).await??;

    store
        .insert_user(User {
            id: Uuid::new_v4(),
            username: username.clone(),
            password_hash,
            is_admin: true,
            created_at: Utc::now(),
        })
        .await?;
    tracing::info!(username = %username, "seeded in-memory admin account");
    Ok(())
}

async fn open_store(config: &AppConfig) -> Result<Arc<dyn Store>, BoxError> {
    match &config.database_url {
        Some(url) => {
            let pool = db::init_pool(db::DbConfig {
                url: url.clone(),
                ..db::DbConfig::default()
            })
            .await?;
            db::run_migrations(&pool).await?;
            Ok(Arc::new(PgStore::new(pool)))
        }
        None => {
            tracing::warn!("DATABASE_URL not set. Using the in-memory store; data is lost on restart.");
            let store = MemoryStore::new();
            seed_memory_admin(&store, config).await?;
            Ok(Arc::new(store))
        }
    }
}

/// Run the server (used by main).
pub async fn run() -> Result<(), BoxError> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env();

    // Guards MUST be held for the programme's lifetime; dropping them early
    // shuts down background log-writer threads and loses buffered log lines.
    let _log_guards = logging::init(&config);

    routes::health::init_start_time();

    if config.jwt_secret.is_none() {
        tracing::error!("JWT_SECRET is not set. Every admin route will answer 500 until it is.");
    }
    if config.content_api_secret.is_none() {
        tracing::warn!("CONTENT_API_SECRET is not set. PUT /api/content/{{locale}} is disabled.");
    }

    let store = open_store(&config).await?;
    tracing::info!(backend = store.name(), "store ready");
    services::content::seed_defaults(store.as_ref()).await?;

    tokio::fs::create_dir_all(&config.upload_dir).await?;

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let state = AppState::from_config(config, store);
    let app = create_app(state);

    tracing::info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::testing::send_json;
    use crate::state::testing::TestContext;
    use axum::http::StatusCode;
    use serde_json::Value;

    #[test]
    fn test_create_app_returns_router() {
        let ctx = TestContext::new();
        let _app = create_app(ctx.state.clone());
    }

    #[tokio::test]
    async fn test_uploads_are_served() {
        let ctx = TestContext::new();
        let dir = ctx.upload_dir.path().join("logos");
        tokio::fs::create_dir_all(&dir).await.unwrap();
        tokio::fs::write(dir.join("logo.svg"), b"<svg></svg>").await.unwrap();

        let (status, _) =
            send_json(&ctx, Method::GET, "/uploads/logos/logo.svg", None, Value::Null).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let ctx = TestContext::new();
        let (status, _) = send_json(&ctx, Method::GET, "/api/blog", None, Value::Null).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_memory_admin_is_seeded_from_config() {
        let store = MemoryStore::new();
        let config = AppConfig {
            admin_username: Some("owner".to_string()),
            admin_password: Some("pw".to_string()),
            ..AppConfig::default()
        };
        seed_memory_admin(&store, &config).await.unwrap();
        let user = store.find_user_by_username("owner").await.unwrap().unwrap();
        assert!(user.is_admin);
        assert!(bcrypt::verify("pw", &user.password_hash).unwrap());
    }
}
