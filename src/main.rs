//! My Super Library Backend
//!
//! A REST backend for a library catalogue, its users and their loans, with
//! SQLite persistence and Tantivy full-text search.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod models;
mod search;
mod services;

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::{Config, LogFormat};
use db::Repository;
use search::SearchIndex;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub search: Arc<SearchIndex>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    tracing::info!("Starting My Super Library Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Index path: {:?}", config.index_path);
    tracing::info!("Bind address: {}", config.bind_addr);
    tracing::info!("Default loan period: {} days", config.loan_days);

    if config.api_key.is_none() {
        tracing::warn!("No API key configured (LIBRARY_API_KEY). Authentication is disabled!");
    }

    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    let search = Arc::new(SearchIndex::open(&config.index_path)?);

    // Build the search index from the database
    tracing::info!("Building search index...");
    let books = repo.all_books().await?;
    search.rebuild(&books).await?;

    let state = AppState {
        repo,
        search,
        config: Arc::new(config.clone()),
    };

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_key = state.config.api_key.clone();

    let api_routes = Router::new()
        // Books
        .route("/books", get(api::list_books).post(api::create_book))
        .route("/books/search", get(api::search_books))
        .route(
            "/books/{id}",
            get(api::get_book)
                .patch(api::update_book)
                .delete(api::delete_book),
        )
        // Users
        .route("/users", get(api::list_users).post(api::create_user))
        .route("/users/by-email/{email}", get(api::get_user_by_email))
        .route(
            "/users/{id}",
            get(api::get_user)
                .patch(api::update_user)
                .delete(api::delete_user),
        )
        .route("/users/{id}/loans", get(api::list_user_loans))
        // Loans
        .route("/loans", get(api::list_loans).post(api::create_loan))
        .route(
            "/loans/{id}",
            get(api::get_loan)
                .patch(api::update_loan)
                .delete(api::delete_loan),
        )
        .route("/loans/{id}/return", post(api::return_loan))
        .layer(middleware::from_fn(move |req, next| {
            auth::api_key_layer(api_key.clone(), req, next)
        }));

    // Root and health check (no auth required)
    let public_routes = Router::new()
        .route("/", get(root))
        .route("/health", get(health_check));

    Router::new()
        .merge(api_routes)
        .merge(public_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Welcome message.
async fn root() -> Json<Value> {
    Json(json!({ "ok": true, "msg": "Welcome to My Super Library API :)!!" }))
}

/// Health check endpoint; fails when the database does not answer.
async fn health_check(State(state): State<AppState>) -> (StatusCode, &'static str) {
    match state.repo.ping().await {
        Ok(()) => (StatusCode::OK, "OK"),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE")
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
