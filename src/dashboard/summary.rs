//! The dashboard summary and the monthly total read-models.
//!
//! Sums are exact decimals. Amounts only become floats when the dashboard is
//! serialized.

use rust_decimal::Decimal;
use serde::Serialize;
use time::Date;

use crate::{
    dashboard::aggregation::{
        CategoryTotal, Categorised, Entry, MonthlyTotals, balance, current_month_total,
        expenses_by_category, format_full_month_label, total_in_range, trailing_monthly_totals,
    },
    goal::{GoalView, SavingsGoal},
    money::round_to_cents,
};

/// The total of one kind of record in the current month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTotal {
    /// The month, e.g. "October 2026".
    pub month: String,
    /// The sum of the records in the month.
    #[serde(with = "rust_decimal::serde::str")]
    pub total: Decimal,
}

impl MonthlyTotal {
    /// Sum the entries in the calendar month containing `today`.
    pub fn for_month<E: Entry>(entries: &[E], today: Date) -> Self {
        Self {
            month: format_full_month_label(today),
            total: round_to_cents(current_month_total(entries, today)),
        }
    }
}

/// A slice of the dashboard's spending chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySlice {
    /// The human-readable category name.
    pub name: String,
    /// The total spent in the category.
    #[serde(with = "rust_decimal::serde::float")]
    pub value: Decimal,
    /// The category code.
    pub category: String,
}

impl From<CategoryTotal> for CategorySlice {
    fn from(category_total: CategoryTotal) -> Self {
        Self {
            name: category_total.category.label().to_owned(),
            value: category_total.total,
            category: category_total.category.code().to_owned(),
        }
    }
}

/// One bar of the dashboard's monthly chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyDataPoint {
    /// The month, e.g. "Mar 2024".
    pub month: String,
    /// The income earned in the month.
    #[serde(with = "rust_decimal::serde::float")]
    pub income: Decimal,
    /// The money spent in the month.
    #[serde(with = "rust_decimal::serde::float")]
    pub expenses: Decimal,
}

impl From<MonthlyTotals> for MonthlyDataPoint {
    fn from(totals: MonthlyTotals) -> Self {
        Self {
            month: totals.label(),
            income: totals.income,
            expenses: totals.expenses,
        }
    }
}

/// Everything the dashboard shows for one user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    /// All-time income.
    #[serde(with = "rust_decimal::serde::float")]
    pub total_income: Decimal,
    /// All-time spending.
    #[serde(with = "rust_decimal::serde::float")]
    pub total_expenses: Decimal,
    /// All-time income minus all-time spending.
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
    /// Income in the current month.
    #[serde(with = "rust_decimal::serde::float")]
    pub month_income: Decimal,
    /// Spending in the current month.
    #[serde(with = "rust_decimal::serde::float")]
    pub month_expenses: Decimal,
    /// All-time spending per category, largest first.
    pub expenses_by_category: Vec<CategorySlice>,
    /// Income and spending for each of the last six months, oldest first.
    pub monthly_data: Vec<MonthlyDataPoint>,
    /// Every savings goal with its progress indicators.
    pub savings_summary: Vec<GoalView>,
}

impl DashboardSummary {
    /// Summarise a user's records as of `today`.
    ///
    /// Never fails: a user without any records gets zero totals, no category
    /// slices and six empty months.
    pub fn build<I: Entry, E: Categorised>(
        income: &[I],
        expenses: &[E],
        goals: Vec<SavingsGoal>,
        today: Date,
    ) -> Self {
        let total_income = total_in_range(income, None);
        let total_expenses = total_in_range(expenses, None);

        Self {
            total_income,
            total_expenses,
            balance: balance(total_income, total_expenses),
            month_income: current_month_total(income, today),
            month_expenses: current_month_total(expenses, today),
            expenses_by_category: expenses_by_category(expenses)
                .into_iter()
                .map(CategorySlice::from)
                .collect(),
            monthly_data: trailing_monthly_totals(income, expenses, today)
                .into_iter()
                .map(MonthlyDataPoint::from)
                .collect(),
            savings_summary: goals
                .into_iter()
                .map(|goal| GoalView::new(goal, today))
                .collect(),
        }
    }
}
