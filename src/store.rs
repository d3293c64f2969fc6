// 💾 Expense Store - CRUD, queries, preferences, and export over a KV store
//
// Every operation reads the whole collection, transforms it in memory, and
// writes the whole collection back. There is no locking: callers that share
// a store across threads wrap it in a Mutex.

use crate::entities::{Theme, DEFAULT_CURRENCY};
use crate::error::{Result, StoreError};
use crate::expense::{generate_id, Expense, NewExpense};
use crate::export;
use crate::reports::{self, DailyPoint, PieSlice, Statistics, Summary};
use crate::storage::KeyValueStore;
use crate::temporal::{filter_by_period, Period};
use chrono::{DateTime, Local, TimeZone, Utc};
use serde_json::Value;

pub const EXPENSE_STORAGE_KEY: &str = "expense-tracker-data";
pub const CURRENCY_STORAGE_KEY: &str = "expense-tracker-currency";
pub const THEME_STORAGE_KEY: &str = "expense-tracker-theme";

pub struct ExpenseStore<S: KeyValueStore> {
    backend: S,
}

impl<S: KeyValueStore> ExpenseStore<S> {
    pub fn new(backend: S) -> Self {
        ExpenseStore { backend }
    }

    /// Underlying key-value store
    pub fn backend(&self) -> &S {
        &self.backend
    }

    // ========================================================================
    // PERSISTENCE PRIMITIVES
    // ========================================================================

    /// Full collection, newest first. Missing or unparseable data reads as
    /// empty; a parse failure is logged so corruption does not go unnoticed.
    pub fn load(&self) -> Result<Vec<Expense>> {
        let Some(raw) = self.backend.get(EXPENSE_STORAGE_KEY)? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str::<Vec<Expense>>(&raw) {
            Ok(expenses) => Ok(expenses),
            Err(e) => {
                tracing::warn!(error = %e, "stored expense data is corrupt, treating as empty");
                Ok(Vec::new())
            }
        }
    }

    /// Overwrite the full collection
    pub fn save(&self, expenses: &[Expense]) -> Result<()> {
        let json = serde_json::to_string(expenses)?;
        self.backend.set(EXPENSE_STORAGE_KEY, &json)?;
        tracing::debug!(count = expenses.len(), "saved expense collection");
        Ok(())
    }

    // ========================================================================
    // CRUD
    // ========================================================================

    /// Prepend a new record with a fresh id (and today's date if none given)
    pub fn add(&self, new_expense: NewExpense) -> Result<Expense> {
        self.add_at(new_expense, Utc::now())
    }

    pub fn add_at(&self, new_expense: NewExpense, now: DateTime<Utc>) -> Result<Expense> {
        let mut expenses = self.load()?;
        let expense = new_expense.into_expense(now);

        expenses.insert(0, expense.clone());
        self.save(&expenses)?;

        tracing::debug!(id = %expense.id, category = %expense.category, "added expense");
        Ok(expense)
    }

    /// Replace the record with the same id; unknown ids leave the
    /// collection unchanged.
    pub fn update(&self, updated: Expense) -> Result<Vec<Expense>> {
        let expenses: Vec<Expense> = self
            .load()?
            .into_iter()
            .map(|e| if e.id == updated.id { updated.clone() } else { e })
            .collect();

        self.save(&expenses)?;
        Ok(expenses)
    }

    /// Drop the record with this id (no-op if absent)
    pub fn remove(&self, id: &str) -> Result<Vec<Expense>> {
        let mut expenses = self.load()?;
        expenses.retain(|e| e.id != id);

        self.save(&expenses)?;
        Ok(expenses)
    }

    pub fn get(&self, id: &str) -> Result<Option<Expense>> {
        Ok(self.load()?.into_iter().find(|e| e.id == id))
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    /// Expenses in `period` relative to the local clock
    pub fn by_period(&self, period: Period) -> Result<Vec<Expense>> {
        self.by_period_at(period, &Local::now())
    }

    pub fn by_period_at<Tz: TimeZone>(&self, period: Period, now: &DateTime<Tz>) -> Result<Vec<Expense>> {
        Ok(filter_by_period(&self.load()?, period, now))
    }

    pub fn summary_at<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Result<Summary> {
        Ok(Summary::compute(&self.load()?, now))
    }

    pub fn statistics_at<Tz: TimeZone>(&self, period: Period, now: &DateTime<Tz>) -> Result<Statistics> {
        Ok(Statistics::compute(&self.by_period_at(period, now)?))
    }

    pub fn pie_chart_at<Tz: TimeZone>(&self, period: Period, now: &DateTime<Tz>) -> Result<Vec<PieSlice>> {
        Ok(reports::pie_chart_series(&self.by_period_at(period, now)?))
    }

    /// Daily chart for a period, sized by `Period::chart_window`
    pub fn daily_chart_at<Tz: TimeZone>(&self, period: Period, now: &DateTime<Tz>) -> Result<Vec<DailyPoint>> {
        let expenses = self.by_period_at(period, now)?;
        Ok(reports::daily_series(&expenses, period.chart_window(), now))
    }

    // ========================================================================
    // PREFERENCES
    // ========================================================================

    pub fn currency(&self) -> Result<String> {
        Ok(self
            .backend
            .get(CURRENCY_STORAGE_KEY)?
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()))
    }

    pub fn set_currency(&self, code: &str) -> Result<String> {
        self.backend.set(CURRENCY_STORAGE_KEY, code)?;
        Ok(code.to_string())
    }

    pub fn theme(&self) -> Result<Theme> {
        Ok(self
            .backend
            .get(THEME_STORAGE_KEY)?
            .and_then(|t| t.parse().ok())
            .unwrap_or_default())
    }

    pub fn set_theme(&self, theme: Theme) -> Result<Theme> {
        self.backend.set(THEME_STORAGE_KEY, theme.as_str())?;
        Ok(theme)
    }

    /// Flip between light and dark, returning the new theme
    pub fn toggle_theme(&self) -> Result<Theme> {
        let theme = self.theme()?.toggled();
        self.set_theme(theme)
    }

    // ========================================================================
    // EXPORT / IMPORT
    // ========================================================================

    /// CSV of `expenses` using the stored currency preference
    pub fn export_csv(&self, expenses: &[Expense]) -> Result<Option<String>> {
        export::to_csv(expenses, &self.currency()?)
    }

    pub fn export_json(&self) -> Result<String> {
        export::to_json_pretty(&self.load()?)
    }

    /// Replace the whole collection with an imported JSON array.
    /// Anything else is rejected and storage is left untouched.
    pub fn import_json(&self, text: &str) -> Result<usize> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| StoreError::invalid_import(format!("malformed JSON: {e}")))?;

        if !value.is_array() {
            return Err(StoreError::invalid_import("expected a JSON array of expenses"));
        }

        let mut expenses: Vec<Expense> = serde_json::from_value(value)
            .map_err(|e| StoreError::invalid_import(e.to_string()))?;

        for expense in expenses.iter_mut().filter(|e| e.id.is_empty()) {
            expense.id = generate_id();
        }

        self.save(&expenses)?;
        tracing::info!(count = expenses.len(), "imported expense data");
        Ok(expenses.len())
    }

    /// Delete every expense (preferences are kept)
    pub fn clear(&self) -> Result<()> {
        self.save(&[])?;
        tracing::info!("cleared expense data");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn store() -> ExpenseStore<MemoryStore> {
        ExpenseStore::new(MemoryStore::new())
    }

    fn record(id: &str, amount: f64) -> Expense {
        Expense {
            id: id.to_string(),
            amount,
            category: "food".to_string(),
            description: None,
            date: "2024-01-05".to_string(),
        }
    }

    #[test]
    fn test_load_empty_store() {
        assert!(store().load().unwrap().is_empty());
    }

    #[test]
    fn test_save_load_round_trip() {
        let store = store();
        let mut described = record("b", 2.25);
        described.description = Some("coffee".to_string());
        let expenses = vec![record("a", 1.0), described, record("c", 3.0)];

        store.save(&expenses).unwrap();
        assert_eq!(store.load().unwrap(), expenses);
    }

    #[test]
    fn test_corrupt_data_loads_as_empty() {
        let store = ExpenseStore::new(MemoryStore::with_entries([(EXPENSE_STORAGE_KEY, "{not json")]));
        assert!(store.load().unwrap().is_empty());

        let store = ExpenseStore::new(MemoryStore::with_entries([(EXPENSE_STORAGE_KEY, "{\"a\": 1}")]));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_add_prepends_with_unique_ids() {
        let store = store();
        store.save(&[record("existing", 5.0)]).unwrap();

        let first = store.add(NewExpense::new(10.0, "food")).unwrap();
        let second = store.add(NewExpense::new(20.0, "health")).unwrap();

        let expenses = store.load().unwrap();
        assert_eq!(expenses.len(), 3);
        assert_eq!(expenses[0], second);
        assert_eq!(expenses[1], first);
        assert_eq!(expenses[2].id, "existing");
        assert_ne!(first.id, second.id);
        assert_ne!(first.id, "existing");
    }

    #[test]
    fn test_update_replaces_only_matching_record() {
        let store = store();
        store.save(&[record("a", 1.0), record("b", 2.0)]).unwrap();

        let mut changed = record("b", 99.0);
        changed.category = "health".to_string();
        let result = store.update(changed.clone()).unwrap();

        assert_eq!(result, vec![record("a", 1.0), changed]);
        assert_eq!(store.load().unwrap(), result);
    }

    #[test]
    fn test_update_unknown_id_is_noop() {
        let store = store();
        let before = vec![record("a", 1.0)];
        store.save(&before).unwrap();

        let result = store.update(record("missing", 50.0)).unwrap();
        assert_eq!(result, before);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let store = store();
        store.save(&[record("a", 1.0), record("b", 2.0)]).unwrap();

        let once = store.remove("a").unwrap();
        let twice = store.remove("a").unwrap();

        assert_eq!(once, vec![record("b", 2.0)]);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_get_by_id() {
        let store = store();
        store.save(&[record("a", 1.0)]).unwrap();
        assert_eq!(store.get("a").unwrap(), Some(record("a", 1.0)));
        assert_eq!(store.get("z").unwrap(), None);
    }

    #[test]
    fn test_preferences_default_and_persist() {
        let store = store();
        assert_eq!(store.currency().unwrap(), "INR");
        assert_eq!(store.theme().unwrap(), Theme::Light);

        assert_eq!(store.set_currency("USD").unwrap(), "USD");
        assert_eq!(store.set_theme(Theme::Dark).unwrap(), Theme::Dark);

        assert_eq!(store.currency().unwrap(), "USD");
        assert_eq!(store.theme().unwrap(), Theme::Dark);
        // Preferences live under their own keys
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_unknown_theme_value_reads_as_light() {
        let store = ExpenseStore::new(MemoryStore::with_entries([(THEME_STORAGE_KEY, "sepia")]));
        assert_eq!(store.theme().unwrap(), Theme::Light);
    }

    #[test]
    fn test_import_replaces_collection() {
        let store = store();
        store.save(&[record("old", 1.0)]).unwrap();

        let count = store
            .import_json(r#"[{"id": "x", "amount": 5, "category": "food", "date": "2024-02-01"},
                              {"amount": 7, "category": "other", "date": "2024-02-02"}]"#)
            .unwrap();

        let expenses = store.load().unwrap();
        assert_eq!(count, 2);
        assert_eq!(expenses[0].id, "x");
        assert!(!expenses[1].id.is_empty());
        assert!(expenses.iter().all(|e| e.id != "old"));
    }

    #[test]
    fn test_toggle_theme_flips_and_persists() {
        let store = store();
        assert_eq!(store.toggle_theme().unwrap(), Theme::Dark);
        assert_eq!(store.theme().unwrap(), Theme::Dark);
        assert_eq!(store.toggle_theme().unwrap(), Theme::Light);
        assert_eq!(store.backend().get(THEME_STORAGE_KEY).unwrap().as_deref(), Some("light"));
    }

    #[test]
    fn test_import_accepts_numeric_ids_and_null_fields() {
        let store = store();
        let count = store
            .import_json(r#"[{"id": 1704412800000, "amount": 5, "category": "food", "date": "2024-01-05"},
                              {"id": "b", "amount": 6, "category": "food", "date": null}]"#)
            .unwrap();

        let expenses = store.load().unwrap();
        assert_eq!(count, 2);
        assert_eq!(expenses[0].id, "1704412800000");
        assert_eq!(expenses[1].date, "");
    }

    #[test]
    fn test_mixed_type_records_survive_next_write() {
        let seeded = r#"[{"id": "a", "amount": 1, "category": "food", "date": "2024-01-05"},
                         {"id": 2, "amount": "2.5", "category": "health", "date": "2024-01-06"}]"#;
        let store = ExpenseStore::new(MemoryStore::with_entries([(EXPENSE_STORAGE_KEY, seeded)]));

        assert_eq!(store.load().unwrap().len(), 2);
        store.add(NewExpense::new(3.0, "other")).unwrap();

        let expenses = store.load().unwrap();
        assert_eq!(expenses.len(), 3);
        assert_eq!(expenses[2].id, "2");
        assert_eq!(expenses[2].amount, 2.5);

        // Stringified ids are addressable afterwards
        assert_eq!(store.remove("2").unwrap().len(), 2);
    }

    #[test]
    fn test_import_rejects_non_array_and_keeps_data() {
        let store = store();
        store.save(&[record("keep", 1.0)]).unwrap();

        let err = store.import_json(r#"{"id": "x"}"#).unwrap_err();
        assert!(matches!(err, StoreError::InvalidImport(_)));

        let err = store.import_json("not json").unwrap_err();
        assert!(matches!(err, StoreError::InvalidImport(_)));

        assert_eq!(store.load().unwrap(), vec![record("keep", 1.0)]);
    }

    #[test]
    fn test_clear_keeps_preferences() {
        let store = store();
        store.set_currency("EUR").unwrap();
        store.save(&[record("a", 1.0)]).unwrap();

        store.clear().unwrap();

        assert!(store.load().unwrap().is_empty());
        assert_eq!(store.currency().unwrap(), "EUR");
    }

    #[test]
    fn test_export_csv_uses_stored_currency() {
        let store = store();
        store.set_currency("USD").unwrap();
        assert_eq!(store.export_csv(&[]).unwrap(), None);

        let csv = store.export_csv(&[record("a", 1234.5)]).unwrap().unwrap();
        assert!(csv.contains("\"1,234.50\""));
        assert!(!csv.contains('$'));
    }

    #[test]
    fn test_export_json_matches_collection() {
        let store = store();
        store.save(&[record("a", 1.0), record("b", 2.0)]).unwrap();

        let json = store.export_json().unwrap();
        let parsed: Vec<Expense> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, store.load().unwrap());
    }
}
