// 📊 Reports - aggregation and chart series over expense lists
//
// Pure functions: callers pass in the (already period-filtered) expenses.
// Totals are plain f64 sums, so a single NaN amount makes the total NaN.

use crate::entities::{category_display_name, category_label};
use crate::expense::Expense;
use crate::temporal::{filter_by_period, is_on_day, trailing_days, Period};
use chrono::{DateTime, TimeZone};
use serde::Serialize;
use std::collections::BTreeMap;

/// Sum of amounts
pub fn total(expenses: &[Expense]) -> f64 {
    expenses.iter().map(|e| e.amount).sum()
}

// ============================================================================
// CATEGORY GROUPING
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CategoryGroup {
    pub total: f64,
    pub expenses: Vec<Expense>,
}

/// Partition by raw category string; members keep input order.
/// Keys are ordered by category id.
pub fn group_by_category(expenses: &[Expense]) -> BTreeMap<String, CategoryGroup> {
    let mut groups: BTreeMap<String, CategoryGroup> = BTreeMap::new();
    for expense in expenses {
        let group = groups.entry(expense.category.clone()).or_default();
        group.total += expense.amount;
        group.expenses.push(expense.clone());
    }
    groups
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSlice {
    pub name: String,
    pub value: f64,
}

/// One slice per category present, labelled from the category table
pub fn pie_chart_series(expenses: &[Expense]) -> Vec<PieSlice> {
    group_by_category(expenses)
        .into_iter()
        .map(|(category, group)| PieSlice {
            name: category_display_name(&category).to_string(),
            value: group.total,
        })
        .collect()
}

// ============================================================================
// DAILY SERIES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPoint {
    /// YYYY-MM-DD
    pub date: String,

    /// Axis label, e.g. "Fri 5"
    pub label: String,

    /// Tooltip label, e.g. "Fri, Jan 5"
    pub full_date: String,

    pub amount: f64,
}

/// Spending per calendar day for the `days` days ending today (oldest
/// first), zero-filled.
pub fn daily_series<Tz: TimeZone>(expenses: &[Expense], days: u32, now: &DateTime<Tz>) -> Vec<DailyPoint> {
    let tz = now.timezone();
    trailing_days(days, now)
        .into_iter()
        .map(|day| {
            let amount: f64 = expenses
                .iter()
                .filter(|e| is_on_day(e, day, &tz))
                .map(|e| e.amount)
                .sum();
            DailyPoint {
                date: day.format("%Y-%m-%d").to_string(),
                label: day.format("%a %-d").to_string(),
                full_date: day.format("%a, %b %-d").to_string(),
                amount,
            }
        })
        .collect()
}

// ============================================================================
// SEARCH
// ============================================================================

/// Case-insensitive match on description or category display name, plus an
/// optional exact category filter. Order preserved.
pub fn search(expenses: &[Expense], term: &str, category: Option<&str>) -> Vec<Expense> {
    let needle = term.trim().to_lowercase();
    expenses
        .iter()
        .filter(|e| {
            let matches_term = needle.is_empty()
                || e.description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&needle))
                || category_label(&e.category).to_lowercase().contains(&needle);
            let matches_category = category.map_or(true, |c| c.is_empty() || e.category == c);
            matches_term && matches_category
        })
        .cloned()
        .collect()
}

// ============================================================================
// DASHBOARD SUMMARY & STATISTICS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodTotal {
    pub total: f64,
    pub count: usize,
}

impl PeriodTotal {
    fn of(expenses: &[Expense]) -> Self {
        PeriodTotal {
            total: total(expenses),
            count: expenses.len(),
        }
    }
}

/// Dashboard cards: today / this week / this month / daily average
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub today: PeriodTotal,
    pub week: PeriodTotal,
    pub month: PeriodTotal,
    pub daily_average: f64,
}

impl Summary {
    pub fn compute<Tz: TimeZone>(expenses: &[Expense], now: &DateTime<Tz>) -> Self {
        let today = PeriodTotal::of(&filter_by_period(expenses, Period::Day, now));
        let week = PeriodTotal::of(&filter_by_period(expenses, Period::Week, now));
        let month = PeriodTotal::of(&filter_by_period(expenses, Period::Month, now));

        let daily_average = if week.count > 0 { week.total / 7.0 } else { 0.0 };

        Summary {
            today,
            week,
            month,
            daily_average,
        }
    }
}

/// Statistics page figures for one period's expenses
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub count: usize,
    pub total: f64,
    pub average: f64,
    pub largest: f64,
    pub most_common_category: String,
}

impl Statistics {
    pub fn compute(expenses: &[Expense]) -> Self {
        let count = expenses.len();
        let total = total(expenses);
        let average = if count > 0 { total / count as f64 } else { 0.0 };
        let largest = expenses
            .iter()
            .map(|e| e.amount)
            .fold(None, |max: Option<f64>, amount| {
                Some(match max {
                    Some(m) if m >= amount => m,
                    _ => amount,
                })
            })
            .unwrap_or(0.0);

        Statistics {
            count,
            total,
            average,
            largest,
            most_common_category: most_common_category(expenses),
        }
    }
}

/// Most frequent category id with its first letter upper-cased, "None" for
/// an empty list. Ties go to the category seen first.
pub fn most_common_category(expenses: &[Expense]) -> String {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for expense in expenses {
        match counts.iter_mut().find(|(c, _)| *c == expense.category) {
            Some((_, n)) => *n += 1,
            None => counts.push((expense.category.as_str(), 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (category, n) in counts {
        if best.map_or(true, |(_, max)| n > max) {
            best = Some((category, n));
        }
    }

    match best {
        Some((category, _)) => capitalize(category),
        None => "None".to_string(),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn expense(id: &str, amount: f64, category: &str, date: &str) -> Expense {
        Expense {
            id: id.to_string(),
            amount,
            category: category.to_string(),
            description: None,
            date: date.to_string(),
        }
    }

    #[test]
    fn test_total_is_additive() {
        let a = vec![expense("1", 10.5, "food", "2024-01-01"), expense("2", 4.5, "health", "2024-01-02")];
        let b = vec![expense("3", 20.0, "food", "2024-01-03")];
        let mut joined = a.clone();
        joined.extend(b.clone());

        assert_eq!(total(&joined), total(&a) + total(&b));
        assert_eq!(total(&[]), 0.0);
    }

    #[test]
    fn test_total_propagates_nan() {
        let expenses = vec![expense("1", 10.0, "food", "2024-01-01"), expense("2", f64::NAN, "food", "2024-01-01")];
        assert!(total(&expenses).is_nan());
    }

    #[test]
    fn test_group_by_category_keeps_raw_keys() {
        let expenses = vec![
            expense("1", 10.0, "food", "2024-01-01"),
            expense("2", 5.0, "pets", "2024-01-01"),
            expense("3", 2.5, "food", "2024-01-02"),
        ];
        let groups = group_by_category(&expenses);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups["food"].total, 12.5);
        assert_eq!(groups["food"].expenses.iter().map(|e| e.id.as_str()).collect::<Vec<_>>(), vec!["1", "3"]);
        assert_eq!(groups["pets"].total, 5.0);
    }

    #[test]
    fn test_pie_chart_uses_display_names() {
        let expenses = vec![expense("1", 10.0, "food", "2024-01-01"), expense("2", 5.0, "pets", "2024-01-01")];
        let series = pie_chart_series(&expenses);

        assert_eq!(
            series,
            vec![
                PieSlice { name: "Food & Dining".to_string(), value: 10.0 },
                PieSlice { name: "Unknown".to_string(), value: 5.0 },
            ]
        );
    }

    #[test]
    fn test_daily_series_zero_fills() {
        let now = Utc.with_ymd_and_hms(2024, 1, 5, 18, 0, 0).unwrap();
        let expenses = vec![
            expense("1", 10.0, "food", "2024-01-05T09:00:00Z"),
            expense("2", 15.0, "food", "2024-01-05"),
            expense("3", 7.0, "food", "2024-01-03"),
            expense("4", 99.0, "food", "2023-12-01"),
        ];
        let series = daily_series(&expenses, 3, &now);

        assert_eq!(series.len(), 3);
        assert_eq!(series[0].date, "2024-01-03");
        assert_eq!(series[0].amount, 7.0);
        assert_eq!(series[1].amount, 0.0);
        assert_eq!(series[2].date, "2024-01-05");
        assert_eq!(series[2].label, "Fri 5");
        assert_eq!(series[2].full_date, "Fri, Jan 5");
        assert_eq!(series[2].amount, 25.0);
    }

    #[test]
    fn test_search_by_description_and_category_name() {
        let mut lunch = expense("1", 10.0, "food", "2024-01-01");
        lunch.description = Some("Team Lunch".to_string());
        let bus = expense("2", 2.0, "transportation", "2024-01-01");
        let expenses = vec![lunch, bus];

        assert_eq!(search(&expenses, "lunch", None).len(), 1);
        assert_eq!(search(&expenses, "TRANSPORT", None)[0].id, "2");
        assert_eq!(search(&expenses, "", Some("food"))[0].id, "1");
        assert_eq!(search(&expenses, "", None).len(), 2);
        assert!(search(&expenses, "lunch", Some("transportation")).is_empty());
    }

    #[test]
    fn test_summary_daily_average() {
        let now = Utc.with_ymd_and_hms(2024, 1, 20, 12, 0, 0).unwrap();
        let expenses = vec![
            expense("1", 14.0, "food", "2024-01-20T08:00:00Z"),
            expense("2", 7.0, "food", "2024-01-18"),
            expense("3", 100.0, "food", "2024-01-02"),
        ];
        let summary = Summary::compute(&expenses, &now);

        assert_eq!(summary.today, PeriodTotal { total: 14.0, count: 1 });
        assert_eq!(summary.week, PeriodTotal { total: 21.0, count: 2 });
        assert_eq!(summary.month, PeriodTotal { total: 121.0, count: 3 });
        assert_eq!(summary.daily_average, 3.0);
    }

    #[test]
    fn test_statistics() {
        let expenses = vec![
            expense("1", 10.0, "food", "2024-01-01"),
            expense("2", 30.0, "health", "2024-01-01"),
            expense("3", 20.0, "health", "2024-01-01"),
        ];
        let stats = Statistics::compute(&expenses);

        assert_eq!(stats.count, 3);
        assert_eq!(stats.total, 60.0);
        assert_eq!(stats.average, 20.0);
        assert_eq!(stats.largest, 30.0);
        assert_eq!(stats.most_common_category, "Health");

        let empty = Statistics::compute(&[]);
        assert_eq!(empty.average, 0.0);
        assert_eq!(empty.largest, 0.0);
        assert_eq!(empty.most_common_category, "None");
    }

    #[test]
    fn test_most_common_category_tie_goes_to_first_seen() {
        let expenses = vec![
            expense("1", 1.0, "shopping", "2024-01-01"),
            expense("2", 1.0, "food", "2024-01-01"),
        ];
        assert_eq!(most_common_category(&expenses), "Shopping");
    }
}
