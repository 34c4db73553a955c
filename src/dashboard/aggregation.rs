//! Pure aggregation over a snapshot of a user's income and expenses.
//!
//! Provides totals over date ranges, calendar month ranges, the expense
//! breakdown by category and the trailing six month series used by the
//! dashboard. All sums are exact decimals.

use std::collections::HashMap;

use rust_decimal::Decimal;
use time::{Date, Duration, Month};

use crate::expense::Category;

/// The number of months in the dashboard's monthly series.
pub const TRAILING_MONTHS: usize = 6;

/// A record with an amount of money and the date it happened on.
pub trait Entry {
    /// The amount of money.
    fn amount(&self) -> Decimal;
    /// The day the money was earned or spent.
    fn date(&self) -> Date;
}

/// An [Entry] that belongs to an expense category.
pub trait Categorised: Entry {
    /// The category the money was spent on.
    fn category(&self) -> &Category;
}

/// An inclusive range of dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    /// The first day in the range.
    pub start: Date,
    /// The last day in the range.
    pub end: Date,
}

impl DateRange {
    /// Whether `date` falls within the range, including both ends.
    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }
}

/// The first day of the month `date` falls in.
pub fn month_start(date: Date) -> Date {
    date - Duration::days(i64::from(date.day()) - 1)
}

/// The calendar month containing `date`, from the first to the last day.
pub fn month_range(date: Date) -> DateRange {
    let start = month_start(date);
    let days_in_month = date.month().length(date.year());

    DateRange {
        start,
        end: start + Duration::days(i64::from(days_in_month) - 1),
    }
}

fn previous_month_start(month: Date) -> Date {
    month_start(month_start(month) - Duration::days(1))
}

/// Sum the amounts of `entries`, only counting those within `range` if one is given.
///
/// Returns zero for an empty collection.
pub fn total_in_range<E: Entry>(entries: &[E], range: Option<DateRange>) -> Decimal {
    entries
        .iter()
        .filter(|entry| range.is_none_or(|range| range.contains(entry.date())))
        .map(Entry::amount)
        .sum()
}

/// The total of the entries in the calendar month containing `today`.
pub fn current_month_total<E: Entry>(entries: &[E], today: Date) -> Decimal {
    total_in_range(entries, Some(month_range(today)))
}

/// All-time income minus all-time expenses.
pub fn balance(total_income: Decimal, total_expenses: Decimal) -> Decimal {
    total_income - total_expenses
}

/// The sum of the expenses in one category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    /// The category the expenses belong to.
    pub category: Category,
    /// The exact sum of the expenses.
    pub total: Decimal,
}

/// Group `expenses` by category and sum each group.
///
/// Categories without any expenses are left out. The result is sorted by
/// total, largest first, with ties ordered by category code.
pub fn expenses_by_category<E: Categorised>(expenses: &[E]) -> Vec<CategoryTotal> {
    let mut totals: HashMap<&Category, Decimal> = HashMap::new();

    for expense in expenses {
        *totals.entry(expense.category()).or_default() += expense.amount();
    }

    let mut totals: Vec<CategoryTotal> = totals
        .into_iter()
        .map(|(category, total)| CategoryTotal {
            category: category.clone(),
            total,
        })
        .collect();

    totals.sort_by(|left, right| {
        right
            .total
            .cmp(&left.total)
            .then_with(|| left.category.code().cmp(right.category.code()))
    });

    totals
}

/// The income and expenses of one calendar month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyTotals {
    /// The first day of the month.
    pub month: Date,
    /// The total income earned in the month.
    pub income: Decimal,
    /// The total money spent in the month.
    pub expenses: Decimal,
}

impl MonthlyTotals {
    /// The month as an abbreviated month name and year, e.g. "Mar 2024".
    pub fn label(&self) -> String {
        format_month_label(self.month)
    }
}

/// Totals for the [TRAILING_MONTHS] calendar months ending with the month containing `today`.
///
/// The series is ordered oldest to newest and always has [TRAILING_MONTHS]
/// entries, with zero totals for months without records.
pub fn trailing_monthly_totals<I: Entry, E: Entry>(
    income: &[I],
    expenses: &[E],
    today: Date,
) -> Vec<MonthlyTotals> {
    let mut months = Vec::with_capacity(TRAILING_MONTHS);
    let mut month = month_start(today);

    for _ in 0..TRAILING_MONTHS {
        months.push(month);
        month = previous_month_start(month);
    }

    months
        .into_iter()
        .rev()
        .map(|month| {
            let range = month_range(month);

            MonthlyTotals {
                month,
                income: total_in_range(income, Some(range)),
                expenses: total_in_range(expenses, Some(range)),
            }
        })
        .collect()
}

/// Formats a month as a three-letter abbreviation and the year, e.g. "Jan 2024".
pub fn format_month_label(date: Date) -> String {
    let month = match date.month() {
        Month::January => "Jan",
        Month::February => "Feb",
        Month::March => "Mar",
        Month::April => "Apr",
        Month::May => "May",
        Month::June => "Jun",
        Month::July => "Jul",
        Month::August => "Aug",
        Month::September => "Sep",
        Month::October => "Oct",
        Month::November => "Nov",
        Month::December => "Dec",
    };

    format!("{month} {}", date.year())
}

/// Formats a month as its full name and the year, e.g. "October 2026".
pub fn format_full_month_label(date: Date) -> String {
    format!("{} {}", date.month(), date.year())
}
