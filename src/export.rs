// 📤 Export - CSV and JSON renderings of the expense collection

use crate::entities::category_label;
use crate::error::{Result, StoreError};
use crate::expense::Expense;
use crate::format::{format_amount, format_date_in};
use chrono::{Local, NaiveDate, TimeZone};
use csv::QuoteStyle;

pub const CSV_HEADERS: [&str; 4] = ["Date", "Category", "Amount", "Description"];

pub const DEFAULT_CSV_FILENAME: &str = "expense-data.csv";

/// `expense-tracker-data-2024-01-05.json`
pub fn json_export_filename(day: NaiveDate) -> String {
    format!("expense-tracker-data-{}.json", day.format("%Y-%m-%d"))
}

/// CSV with local-time dates; `None` when there is nothing to export
pub fn to_csv(expenses: &[Expense], currency: &str) -> Result<Option<String>> {
    to_csv_in(expenses, currency, &Local)
}

/// One row per expense in input order. Date, category, and amount are
/// quoted only when they contain a comma, quote, or newline, so
/// "Jan 5, 2024" and "1,234.50" stay single columns. A non-empty
/// description is always quoted with embedded quotes doubled; an empty one
/// is written bare.
pub fn to_csv_in<Tz: TimeZone>(expenses: &[Expense], currency: &str, tz: &Tz) -> Result<Option<String>> {
    if expenses.is_empty() {
        return Ok(None);
    }

    let mut content = encode_row(CSV_HEADERS, QuoteStyle::Necessary)?;
    content.push('\n');

    for expense in expenses {
        let leading = encode_row(
            [
                format_date_in(&expense.date, tz),
                category_label(&expense.category).to_string(),
                format_amount(expense.amount, currency),
            ],
            QuoteStyle::Necessary,
        )?;
        let description = match expense.description_text() {
            Some(text) => encode_row([text], QuoteStyle::Always)?,
            None => String::new(),
        };

        content.push_str(&leading);
        content.push(',');
        content.push_str(&description);
        content.push('\n');
    }

    Ok(Some(content))
}

/// Single CSV line without its terminator
fn encode_row<I, T>(fields: I, style: QuoteStyle) -> Result<String>
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    let mut wtr = csv::WriterBuilder::new()
        .quote_style(style)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    wtr.write_record(fields)?;

    let bytes = wtr
        .into_inner()
        .map_err(|e| StoreError::Csv(e.into_error().into()))?;
    let mut line = String::from_utf8(bytes).map_err(|e| StoreError::Backend(e.to_string()))?;
    line.pop();
    Ok(line)
}

/// Pretty-printed JSON array (the settings page "Export Data" file)
pub fn to_json_pretty(expenses: &[Expense]) -> Result<String> {
    Ok(serde_json::to_string_pretty(expenses)?)
}
