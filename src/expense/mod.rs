//! Expenses: money a user has spent, grouped into a fixed set of categories.

mod category;
mod core;
mod endpoints;

pub use category::Category;
pub use core::{
    Expense, ExpenseFilter, ExpenseRequest, NewExpense, create_expense, create_expense_table,
    delete_expense, get_expense, list_expenses, update_expense,
};
pub use endpoints::{
    create_expense_endpoint, delete_expense_endpoint, expenses_by_category_endpoint,
    expenses_monthly_total_endpoint, get_expense_endpoint, list_expenses_endpoint,
    update_expense_endpoint,
};
