//! Income records: money a user has earned.
//!
//! This module contains everything related to income:
//! - The `Income` model and validation for new records
//! - Database functions for storing, querying, and managing income
//! - The JSON API handlers

mod core;
mod endpoints;

pub use core::{
    Income, IncomeFilter, IncomeRequest, NewIncome, create_income, create_income_table,
    delete_income, get_income, list_income, update_income,
};
pub use endpoints::{
    create_income_endpoint, delete_income_endpoint, get_income_endpoint,
    income_monthly_total_endpoint, list_income_endpoint, update_income_endpoint,
};
