// Aggregation
// Pure folds over a ledger snapshot; no state, recomputed on every call

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::Serialize;

use crate::expense::{Category, Expense};

/// Default width of the monthly trend window.
pub const DEFAULT_TREND_MONTHS: u32 = 6;

/// How many trailing days the "recent spend" figure covers.
pub const RECENT_WINDOW_DAYS: u64 = 30;

// ============================================================================
// SUMS
// ============================================================================

/// Sum of `amount` over all expenses.
pub fn total(expenses: &[Expense]) -> f64 {
    expenses.iter().map(|e| e.amount).sum()
}

/// Sum of `amount` for expenses dated on or after `cutoff`.
pub fn sum_since(expenses: &[Expense], cutoff: NaiveDate) -> f64 {
    expenses
        .iter()
        .filter(|e| e.date >= cutoff)
        .map(|e| e.amount)
        .sum()
}

/// Sum of `amount` for expenses dated within `[start, end]`, both inclusive.
pub fn sum_in_range(expenses: &[Expense], start: NaiveDate, end: NaiveDate) -> f64 {
    expenses
        .iter()
        .filter(|e| e.date >= start && e.date <= end)
        .map(|e| e.amount)
        .sum()
}

// ============================================================================
// CATEGORY BREAKDOWN
// ============================================================================

/// One slice of the category breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    /// Raw category key as stored on the expenses.
    pub category: String,
    /// Display label resolved through the fixed category set.
    pub label: String,
    pub total: f64,
}

/// Sum of `amount` grouped by raw category key, in first-seen order.
pub fn by_category(expenses: &[Expense]) -> Vec<CategoryTotal> {
    let mut totals: Vec<CategoryTotal> = Vec::new();

    for expense in expenses {
        match totals.iter_mut().find(|t| t.category == expense.category) {
            Some(entry) => entry.total += expense.amount,
            None => totals.push(CategoryTotal {
                category: expense.category.clone(),
                label: Category::label_for(&expense.category).to_string(),
                total: expense.amount,
            }),
        }
    }

    totals
}

// ============================================================================
// MONTHLY TREND
// ============================================================================

/// One bucket of the monthly trend, keyed by explicit year + month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthTotal {
    pub year: i32,
    pub month: u32,
    /// Short month name for display, e.g. "Jan".
    pub label: String,
    pub total: f64,
}

/// Totals per calendar month over a trailing window ending at `today`'s
/// month, in chronological order. One bucket per month, present even when
/// its total is zero.
///
/// Buckets are keyed by year + month, so an expense only lands in the
/// bucket of its own calendar month; a record from the same month name in
/// a different year stays out of the window.
pub fn monthly_totals(expenses: &[Expense], months: u32, today: NaiveDate) -> Vec<MonthTotal> {
    let current_month_start = today.with_day(1).unwrap_or(today);

    let mut buckets: Vec<MonthTotal> = (0..months)
        .rev()
        .filter_map(|back| current_month_start.checked_sub_months(Months::new(back)))
        .map(|month_start| MonthTotal {
            year: month_start.year(),
            month: month_start.month(),
            label: month_start.format("%b").to_string(),
            total: 0.0,
        })
        .collect();

    for expense in expenses {
        if let Some(bucket) = buckets
            .iter_mut()
            .find(|b| b.year == expense.date.year() && b.month == expense.date.month())
        {
            bucket.total += expense.amount;
        }
    }

    buckets
}

// ============================================================================
// DASHBOARD SUMMARY
// ============================================================================

/// The full set of dashboard figures derived from one ledger snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    /// All-time spend.
    pub total: f64,
    /// Spend over the trailing [`RECENT_WINDOW_DAYS`] days.
    pub last_30_days: f64,
    /// Spend within the current calendar month.
    pub current_month: f64,
    pub by_category: Vec<CategoryTotal>,
    pub monthly: Vec<MonthTotal>,
}

/// Compute every dashboard figure from one snapshot, relative to `today`.
pub fn summarize(expenses: &[Expense], today: NaiveDate) -> Summary {
    let cutoff = today
        .checked_sub_days(Days::new(RECENT_WINDOW_DAYS))
        .unwrap_or(today);

    let month_start = today.with_day(1).unwrap_or(today);
    let month_end = month_start
        .checked_add_months(Months::new(1))
        .and_then(|d| d.checked_sub_days(Days::new(1)))
        .unwrap_or(today);

    Summary {
        total: total(expenses),
        last_30_days: sum_since(expenses, cutoff),
        current_month: sum_in_range(expenses, month_start, month_end),
        by_category: by_category(expenses),
        monthly: monthly_totals(expenses, DEFAULT_TREND_MONTHS, today),
    }
}

// ============================================================================
// TESTS
// ============================================================================
