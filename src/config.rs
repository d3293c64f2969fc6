// ⚙️ Runtime configuration shared by the CLI and the server

use std::env;
use std::path::PathBuf;

pub const DEFAULT_DB_PATH: &str = "expense-tracker.db";
pub const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// SQLite file holding the key-value table
    pub db_path: PathBuf,

    /// Bind address for the HTTP server
    pub server_addr: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            server_addr: DEFAULT_SERVER_ADDR.to_string(),
        }
    }
}

impl AppConfig {
    /// Read `.env` (if present) and the process environment
    pub fn from_env() -> Self {
        if let Err(e) = dotenvy::dotenv() {
            tracing::debug!(error = %e, "no .env file loaded");
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup (environment, test maps)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = AppConfig::default();

        let db_path = lookup("EXPENSE_TRACKER_DB")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);

        let server_addr = lookup("EXPENSE_TRACKER_ADDR")
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.server_addr);

        AppConfig {
            db_path,
            server_addr,
        }
    }
}

/// Install the global tracing subscriber, honoring `RUST_LOG` (default `info`)
pub fn init_logging() {
    let filter = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter.as_str())
        .with_writer(std::io::stderr)
        .try_init();
}
