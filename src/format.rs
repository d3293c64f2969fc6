// 🔤 Display formatting - currency amounts and dates
//
// INR uses South-Asian digit grouping (12,34,567.50); every other code
// follows en-US currency conventions (1,234,567.50). Negative amounts keep
// their sign in front of the symbol in both paths.

use chrono::{Local, NaiveDate, TimeZone};

/// Symbol as rendered in front of a formatted amount
pub fn display_symbol(code: &str) -> String {
    match code {
        "INR" => "₹".to_string(),
        "USD" => "$".to_string(),
        "EUR" => "€".to_string(),
        "GBP" => "£".to_string(),
        "JPY" => "¥".to_string(),
        "CNY" => "CN¥".to_string(),
        other => format!("{other}\u{a0}"),
    }
}

/// `formatCurrency`-style output: sign, symbol, grouped digits, two decimals
pub fn format_currency(amount: f64, code: &str) -> String {
    format!(
        "{}{}{}",
        sign_prefix(amount),
        display_symbol(code),
        format_magnitude(amount.abs(), code)
    )
}

/// Same as `format_currency` without the symbol (CSV amount column)
pub fn format_amount(amount: f64, code: &str) -> String {
    format!("{}{}", sign_prefix(amount), format_magnitude(amount.abs(), code))
}

fn sign_prefix(amount: f64) -> &'static str {
    if amount < 0.0 {
        "-"
    } else {
        ""
    }
}

fn format_magnitude(abs: f64, code: &str) -> String {
    if abs.is_nan() {
        return "NaN".to_string();
    }
    if abs.is_infinite() {
        return "∞".to_string();
    }

    let fixed = format_two_decimals(abs);
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let grouped = if code == "INR" {
        group_indian(int_part)
    } else {
        group_thousands(int_part)
    };

    format!("{grouped}.{frac_part}")
}

/// Two decimals, exact ties rounded away from zero (1.125 -> 1.13).
///
/// `{:.2}` rounds the exact binary value with ties to even. A value sits
/// exactly on a third-decimal tie only when its fraction is an odd multiple
/// of 1/8, so those are nudged to the next float up before formatting.
fn format_two_decimals(abs: f64) -> String {
    let eighths = abs * 8.0;
    let is_tie = eighths.fract() == 0.0 && eighths % 2.0 == 1.0;
    let value = if is_tie { f64::from_bits(abs.to_bits() + 1) } else { abs };
    format!("{value:.2}")
}

/// 1234567 -> 1,234,567
fn group_thousands(digits: &str) -> String {
    group_from_right(digits, 3)
}

/// 1234567 -> 12,34,567
fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let (head, last_three) = digits.split_at(digits.len() - 3);
    format!("{},{}", group_from_right(head, 2), last_three)
}

fn group_from_right(digits: &str, size: usize) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / size);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % size == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

// ============================================================================
// DATES
// ============================================================================

/// "Jan 5, 2024" in local time; unparseable input is returned unchanged
pub fn format_date(raw: &str) -> String {
    format_date_in(raw, &Local)
}

pub fn format_date_in<Tz: TimeZone>(raw: &str, tz: &Tz) -> String {
    match crate::temporal::parse_expense_date(raw, tz) {
        Some(dt) => format_calendar_date(dt.date_naive()),
        None => raw.to_string(),
    }
}

pub fn format_calendar_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}
