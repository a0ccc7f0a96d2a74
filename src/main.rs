//! Student Attendance Tracker Backend
//!
//! A REST backend that keeps per-account student rosters with attended hours,
//! backed by SQLite, with spreadsheet export.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod export;
mod models;
mod notify;
mod roster;
mod session;
mod sync;
mod view;

use std::sync::Arc;

use axum::{
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::SqlitePool;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::{Config, LogFormat};
use db::Repository;
use notify::Notifier;
use roster::Roster;
use session::SessionHub;
use view::ViewState;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub session: SessionHub<Repository>,
    pub roster: Arc<Roster<Repository>>,
    pub view: Arc<RwLock<ViewState>>,
    pub notifier: Notifier,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: Config) -> Self {
        let repo = Arc::new(Repository::new(pool));

        Self {
            session: SessionHub::new(Arc::clone(&repo)),
            roster: Arc::new(Roster::new(repo)),
            view: Arc::new(RwLock::new(ViewState::default())),
            notifier: Notifier::new(),
            config: Arc::new(config),
        }
    }

    /// Start loading and clearing the roster as the session changes.
    pub fn start_session_sync(&self) -> JoinHandle<()> {
        sync::spawn_session_sync(&self.session, Arc::clone(&self.roster), self.notifier.clone())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    match config.log_format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }

    tracing::info!("Starting Student Attendance Tracker Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.cors_origin.is_none() {
        tracing::warn!("No CORS origin configured (ATTENDANCE_CORS_ORIGIN). Any origin is allowed!");
    }

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;

    // Create application state
    let state = AppState::new(pool, config.clone());
    let _sync = state.start_session_sync();

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    // Routes that need a logged-in user
    let student_routes = Router::new()
        // Students
        .route("/students", get(api::list_students))
        .route("/students", post(api::create_student))
        .route("/students/{id}/hours", post(api::add_hours))
        // Table view
        .route("/view/search", put(api::set_search))
        .route("/view/search", delete(api::clear_search))
        .route("/view/sort", post(api::sort_by))
        // Export
        .route("/export", get(api::download_export))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_session,
        ));

    // Session and banner routes (no session required)
    let session_routes = Router::new()
        .route("/auth/register", post(api::register))
        .route("/auth/login", post(api::login))
        .route("/auth/logout", post(api::logout))
        .route("/auth/session", get(api::get_session))
        .route("/notification", get(api::get_notification));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", student_routes.merge(session_routes))
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    match config.cors_origin.as_deref() {
        Some(origin) => match HeaderValue::from_str(origin) {
            Ok(origin) => cors.allow_origin(origin),
            Err(_) => {
                tracing::warn!("Invalid CORS origin {:?}; allowing any origin", origin);
                cors.allow_origin(Any)
            }
        },
        None => cors.allow_origin(Any),
    }
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests;
