//! Dashboard module
//!
//! Aggregates a user's income, expenses and savings goals into the totals,
//! category breakdown and monthly series shown on the dashboard.

mod aggregation;
mod handlers;
mod summary;

pub use aggregation::{
    Categorised, CategoryTotal, Entry, expenses_by_category, format_full_month_label,
    month_range,
};
pub use handlers::get_dashboard;
pub use summary::{DashboardSummary, MonthlyTotal};
