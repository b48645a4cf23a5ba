//! Narrows a user's expenses down by month or by date range and totals the result.

use std::collections::BTreeMap;

use serde::Deserialize;
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    alert::Alert,
    expense::{Category, Expense},
};

pub const INVALID_START_DATE_MSG: &str = "Invalid start date format.";
pub const INVALID_END_DATE_MSG: &str = "Invalid end date format.";
pub const INVALID_MONTH_MSG: &str = "Invalid month.";

/// The date format used by HTML date inputs, e.g. "2024-01-31".
pub(crate) const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// Query parameters for the date range filter on the expense overview.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct DateRangeQuery {
    /// The earliest date to include, inclusive.
    pub start_date: Option<String>,
    /// The latest date to include, inclusive.
    pub end_date: Option<String>,
}

/// Form data for the month filter on the expense overview.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct MonthForm {
    /// The month number, 1 to 12.
    pub month: Option<String>,
}

/// The single filter applied to a request for the expense overview.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpenseFilter {
    /// Show everything.
    All,
    /// Keep expenses whose month (1-12) matches, in any year.
    Month(u8),
    /// Keep expenses within the inclusive bounds. Missing bounds are open.
    DateRange {
        /// The inclusive lower bound.
        start: Option<Date>,
        /// The inclusive upper bound.
        end: Option<Date>,
    },
}

impl ExpenseFilter {
    /// Choose and parse the filter for a request.
    ///
    /// A non-empty `month` always takes precedence over the date range. Inputs
    /// that cannot be parsed are dropped and reported in the returned alerts
    /// rather than failing the request.
    pub fn parse(
        month: Option<&str>,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> (ExpenseFilter, Vec<Alert>) {
        if let Some(month) = non_empty(month) {
            return match month.parse::<u8>() {
                Ok(month) if (1..=12).contains(&month) => (ExpenseFilter::Month(month), Vec::new()),
                _ => {
                    tracing::debug!("Ignoring invalid month filter {month:?}");
                    (ExpenseFilter::All, vec![Alert::error(INVALID_MONTH_MSG)])
                }
            };
        }

        let mut alerts = Vec::new();
        let start = parse_bound(start_date, INVALID_START_DATE_MSG, &mut alerts);
        let end = parse_bound(end_date, INVALID_END_DATE_MSG, &mut alerts);

        let filter = if start.is_none() && end.is_none() {
            ExpenseFilter::All
        } else {
            ExpenseFilter::DateRange { start, end }
        };

        (filter, alerts)
    }

    /// Whether `expense` passes the filter.
    pub fn matches(&self, expense: &Expense) -> bool {
        match *self {
            ExpenseFilter::All => true,
            ExpenseFilter::Month(month) => u8::from(expense.date.month()) == month,
            ExpenseFilter::DateRange { start, end } => {
                start.is_none_or(|start| expense.date >= start)
                    && end.is_none_or(|end| expense.date <= end)
            }
        }
    }

    /// Keep the expenses that pass the filter, preserving their order.
    pub fn apply(&self, expenses: Vec<Expense>) -> Vec<Expense> {
        expenses
            .into_iter()
            .filter(|expense| self.matches(expense))
            .collect()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn parse_bound(raw: Option<&str>, error_message: &str, alerts: &mut Vec<Alert>) -> Option<Date> {
    let raw = non_empty(raw)?;

    match Date::parse(raw, DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(error) => {
            tracing::debug!("Ignoring invalid date filter {raw:?}: {error}");
            alerts.push(Alert::error(error_message));
            None
        }
    }
}

/// The totals shown above the expense table.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseSummary {
    /// The sum of all amounts.
    pub total: f64,
    /// The sum of amounts per category. Every category has an entry.
    pub chart_data: BTreeMap<Category, f64>,
}

/// Total `expenses` overall and per category.
///
/// Expenses with a label outside [Category::ALL] count towards the total only.
pub fn summarize(expenses: &[Expense]) -> ExpenseSummary {
    let mut chart_data: BTreeMap<Category, f64> =
        Category::ALL.into_iter().map(|category| (category, 0.0)).collect();
    let mut total = 0.0;

    for expense in expenses {
        total += expense.amount;

        if let Some(category) = Category::from_label(&expense.category) {
            *chart_data.entry(category).or_insert(0.0) += expense.amount;
        }
    }

    ExpenseSummary { total, chart_data }
}

#[cfg(test)]
mod tests {
    use time::{Date, macros::date};

    use crate::{
        alert::Alert,
        auth::UserID,
        expense::{Category, Expense},
    };

    use super::{
        ExpenseFilter, INVALID_END_DATE_MSG, INVALID_MONTH_MSG, INVALID_START_DATE_MSG, summarize,
    };

    fn expense(id: i64, date: Date, category: &str, amount: f64) -> Expense {
        Expense {
            id,
            date,
            category: category.to_owned(),
            amount,
            description: None,
            user_id: UserID::new(1),
        }
    }

    fn sample() -> Vec<Expense> {
        vec![
            expense(6, date!(2024 - 02 - 01), "Rent", 900.0),
            expense(5, date!(2024 - 01 - 31), "Food", 12.5),
            expense(4, date!(2024 - 01 - 15), "Travel", 30.0),
            expense(3, date!(2024 - 01 - 01), "Utilities", 80.25),
            expense(2, date!(2023 - 12 - 31), "Others", 5.0),
            expense(1, date!(2023 - 01 - 10), "Food", 7.0),
        ]
    }

    fn ids(expenses: &[Expense]) -> Vec<i64> {
        expenses.iter().map(|expense| expense.id).collect()
    }

    #[test]
    fn no_inputs_means_no_filter() {
        assert_eq!(ExpenseFilter::parse(None, None, None), (ExpenseFilter::All, vec![]));
        assert_eq!(
            ExpenseFilter::parse(Some(""), Some(""), Some("")),
            (ExpenseFilter::All, vec![])
        );
    }

    #[test]
    fn month_filter_matches_month_in_any_year() {
        let (filter, alerts) = ExpenseFilter::parse(Some("1"), None, None);
        assert!(alerts.is_empty());

        let filtered = filter.apply(sample());

        assert_eq!(ids(&filtered), vec![5, 4, 3, 1]);
        assert!(filtered.iter().all(|expense| u8::from(expense.date.month()) == 1));
        let summary = summarize(&filtered);
        assert_eq!(summary.total, 12.5 + 30.0 + 80.25 + 7.0);
    }

    #[test]
    fn month_takes_precedence_over_date_range() {
        let (filter, _) = ExpenseFilter::parse(Some("12"), Some("2024-01-01"), Some("2024-01-31"));

        assert_eq!(filter, ExpenseFilter::Month(12));
    }

    #[test]
    fn invalid_month_reports_and_applies_no_filter() {
        for month in ["0", "13", "January", "-1"] {
            let (filter, alerts) = ExpenseFilter::parse(Some(month), Some("2024-01-01"), None);

            assert_eq!(filter, ExpenseFilter::All, "month {month:?}");
            assert_eq!(alerts, vec![Alert::error(INVALID_MONTH_MSG)]);
        }
    }

    #[test]
    fn date_range_is_inclusive() {
        let (filter, alerts) = ExpenseFilter::parse(None, Some("2024-01-01"), Some("2024-01-31"));
        assert!(alerts.is_empty());

        let filtered = filter.apply(sample());

        assert_eq!(ids(&filtered), vec![5, 4, 3]);
    }

    #[test]
    fn date_range_bounds_are_independent() {
        let (from_only, _) = ExpenseFilter::parse(None, Some("2024-01-15"), None);
        let (until_only, _) = ExpenseFilter::parse(None, None, Some("2023-12-31"));

        assert_eq!(ids(&from_only.apply(sample())), vec![6, 5, 4]);
        assert_eq!(ids(&until_only.apply(sample())), vec![2, 1]);
    }

    #[test]
    fn malformed_bound_is_dropped_and_reported() {
        let (filter, alerts) = ExpenseFilter::parse(None, Some("01/01/2024"), Some("2024-01-31"));

        assert_eq!(
            filter,
            ExpenseFilter::DateRange {
                start: None,
                end: Some(date!(2024 - 01 - 31))
            }
        );
        assert_eq!(alerts, vec![Alert::error(INVALID_START_DATE_MSG)]);
    }

    #[test]
    fn both_malformed_bounds_are_reported() {
        let (filter, alerts) = ExpenseFilter::parse(None, Some("nope"), Some("2024-13-01"));

        assert_eq!(filter, ExpenseFilter::All);
        assert_eq!(
            alerts,
            vec![
                Alert::error(INVALID_START_DATE_MSG),
                Alert::error(INVALID_END_DATE_MSG)
            ]
        );
    }

    #[test]
    fn chart_data_has_every_category_and_sums_to_total() {
        let summary = summarize(&sample());

        assert_eq!(summary.chart_data.len(), Category::ALL.len());
        assert_eq!(summary.chart_data[&Category::Food], 19.5);
        let chart_total: f64 = summary.chart_data.values().sum();
        assert!((chart_total - summary.total).abs() < 1e-9);
    }

    #[test]
    fn empty_set_has_zero_totals() {
        let summary = summarize(&[]);

        assert_eq!(summary.total, 0.0);
        assert!(summary.chart_data.values().all(|amount| *amount == 0.0));
    }

    #[test]
    fn unknown_category_counts_towards_total_only() {
        let summary = summarize(&[expense(1, date!(2024 - 01 - 01), "Pets", 10.0)]);

        assert_eq!(summary.total, 10.0);
        assert_eq!(summary.chart_data.values().sum::<f64>(), 0.0);
    }
}
