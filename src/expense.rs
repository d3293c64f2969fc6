// 💸 Expense record - the single persisted entity
//
// Stored as a JSON object inside the expense collection key. Reads are
// tolerant: amounts may be numbers, numeric strings, or null; text fields
// accept numbers (stringified) and null; missing fields fall back to empty
// values. One off-type field never fails the whole collection.

use crate::entities::is_known_category;
use crate::error::{Result, StoreError};
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// Stable identity, unique within the collection
    #[serde(default, deserialize_with = "deserialize_text")]
    pub id: String,

    /// NaN when the stored value was not numeric
    #[serde(default = "missing_amount", deserialize_with = "deserialize_amount")]
    pub amount: f64,

    #[serde(default, deserialize_with = "deserialize_text")]
    pub category: String,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_text"
    )]
    pub description: Option<String>,

    /// ISO-8601 date or date-time
    #[serde(default, deserialize_with = "deserialize_text")]
    pub date: String,
}

impl Expense {
    /// Parsed date in the given timezone, if the stored string is valid
    pub fn date_in<Tz: TimeZone>(&self, tz: &Tz) -> Option<DateTime<Tz>> {
        crate::temporal::parse_expense_date(&self.date, tz)
    }

    /// Description with empty strings treated as absent
    pub fn description_text(&self) -> Option<&str> {
        self.description.as_deref().filter(|d| !d.is_empty())
    }
}

/// Partial change to an existing record; `None` keeps the current value
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExpenseEdit {
    pub amount: Option<f64>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub clear_description: bool,
    pub date: Option<String>,
}

impl ExpenseEdit {
    /// Validate only the fields being changed and merge them in, so legacy
    /// records with empty or unknown fields stay editable.
    pub fn apply(self, mut expense: Expense) -> Result<Expense> {
        if let Some(amount) = self.amount {
            validate_amount(amount)?;
            expense.amount = amount;
        }
        if let Some(category) = self.category {
            validate_category(&category)?;
            expense.category = category;
        }
        if let Some(date) = self.date {
            validate_date(&date)?;
            expense.date = date;
        }
        if self.clear_description {
            expense.description = None;
        } else if let Some(description) = self.description {
            expense.description = Some(description);
        }
        Ok(expense)
    }
}

/// Input for `ExpenseStore::add` - everything but the id
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NewExpense {
    #[serde(default = "missing_amount", deserialize_with = "deserialize_amount")]
    pub amount: f64,

    #[serde(default, deserialize_with = "deserialize_text")]
    pub category: String,

    #[serde(default, deserialize_with = "deserialize_optional_text")]
    pub description: Option<String>,

    /// Defaults to the creation instant when absent
    #[serde(default, deserialize_with = "deserialize_optional_text")]
    pub date: Option<String>,
}

impl NewExpense {
    pub fn new(amount: f64, category: impl Into<String>) -> Self {
        NewExpense {
            amount,
            category: category.into(),
            description: None,
            date: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    /// Entry-form checks; the store itself never calls this
    pub fn validate(&self) -> Result<()> {
        validate_amount(self.amount)?;
        validate_category(&self.category)?;
        if let Some(date) = &self.date {
            validate_date(date)?;
        }
        Ok(())
    }

    /// Build the persisted record with a fresh id
    pub fn into_expense(self, now: DateTime<Utc>) -> Expense {
        Expense {
            id: generate_id(),
            amount: self.amount,
            category: self.category,
            description: self.description,
            date: self.date.unwrap_or_else(|| iso_timestamp(now)),
        }
    }
}

pub fn validate_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(StoreError::validation("Please enter a valid amount"));
    }
    Ok(())
}

/// Must be one of the selectable category ids
pub fn validate_category(category: &str) -> Result<()> {
    if !is_known_category(category) {
        return Err(StoreError::validation("Please select a category"));
    }
    Ok(())
}

pub fn validate_date(date: &str) -> Result<()> {
    if date.trim().is_empty() {
        return Err(StoreError::validation("Please select a date"));
    }
    Ok(())
}

/// Random v4 UUID; safe under rapid successive adds
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// `2024-01-05T10:30:00.000Z` style timestamp
pub fn iso_timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ============================================================================
// LENIENT FIELD PARSING
// ============================================================================

/// Scalar as text: strings as-is, numbers and booleans stringified,
/// `None` for null and nested values
fn value_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn deserialize_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_text(Value::deserialize(deserializer)?).unwrap_or_default())
}

fn deserialize_optional_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_text(Value::deserialize(deserializer)?))
}

fn missing_amount() -> f64 {
    f64::NAN
}

fn deserialize_amount<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => parse_float(&s),
        _ => f64::NAN,
    })
}

/// Lenient float parse: longest numeric prefix after leading whitespace,
/// NaN when there is none ("12.5abc" -> 12.5, "abc" -> NaN).
pub fn parse_float(input: &str) -> f64 {
    let s = input.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    if s[end..].starts_with("Infinity") {
        return if s.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }

    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut mantissa_digits = end - digits_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        mantissa_digits += frac_end - frac_start;
        if mantissa_digits > 0 {
            end = frac_end;
        }
    }
    if mantissa_digits == 0 {
        return f64::NAN;
    }

    // Exponent only counts when followed by at least one digit
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().unwrap_or(f64::NAN)
}
