// Expense Tracker - Web Server
// REST API with Axum over the SQLite-backed expense store

use anyhow::{Context, Result};
use axum::{response::IntoResponse, routing::get, Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use expense_tracker::api::{self, AppState};
use expense_tracker::config::init_logging;
use expense_tracker::{AppConfig, ExpenseStore, SqliteStore, CURRENCY_OPTIONS, EXPENSE_CATEGORIES, VERSION};

/// GET / - service banner with the static lookup tables
async fn index() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": "expense-tracker",
        "version": VERSION,
        "categories": EXPENSE_CATEGORIES,
        "currencies": CURRENCY_OPTIONS,
    }))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let config = AppConfig::from_env();

    let backend = SqliteStore::open(&config.db_path)
        .with_context(|| format!("Failed to open database at {}", config.db_path.display()))?;
    tracing::info!(path = %config.db_path.display(), "database opened");

    let state = AppState::new(ExpenseStore::new(backend));

    let app = Router::new()
        .route("/", get(index))
        .nest("/api", api::router(state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&config.server_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.server_addr))?;

    tracing::info!(addr = %config.server_addr, "server running");

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
