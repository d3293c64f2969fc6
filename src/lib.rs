// Expense Tracker - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod config;
pub mod entities;
pub mod error;
pub mod expense;
pub mod export;
pub mod format;
pub mod reports;
pub mod storage;
pub mod store;
pub mod temporal;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use config::AppConfig;
pub use entities::{
    category_display_name, currency_symbol, CategoryInfo, CurrencyInfo, Theme, CURRENCY_OPTIONS,
    DEFAULT_CURRENCY, EXPENSE_CATEGORIES,
};
pub use error::{Result, StoreError};
pub use expense::{Expense, ExpenseEdit, NewExpense};
pub use export::{json_export_filename, to_csv, DEFAULT_CSV_FILENAME};
pub use format::{format_currency, format_date};
pub use reports::{
    daily_series, group_by_category, pie_chart_series, search, total, CategoryGroup, DailyPoint,
    PieSlice, Statistics, Summary,
};
pub use storage::{KeyValueStore, MemoryStore, SqliteStore};
pub use store::ExpenseStore;
pub use temporal::{filter_by_period, Period};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
