//! Dashboard HTTP handlers.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    dashboard::summary::DashboardSummary,
    db::lock_connection,
    expense::{ExpenseFilter, list_expenses},
    goal::list_goals,
    income::{IncomeFilter, list_income},
    timezone::get_local_today,
};

/// The state needed for displaying the dashboard.
///
/// Contains the database connection and timezone information required
/// by dashboard handlers.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for reading the user's records.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Summarise the logged in user's income, expenses and savings goals.
pub async fn get_dashboard(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<DashboardSummary>, Error> {
    let today = get_local_today(&state.local_timezone)?;
    let connection = lock_connection(&state.db_connection)?;

    let income = list_income(user_id, &IncomeFilter::default(), &connection)
        .inspect_err(|error| tracing::error!("could not get income for dashboard: {error}"))?;
    let expenses = list_expenses(user_id, &ExpenseFilter::default(), &connection)
        .inspect_err(|error| tracing::error!("could not get expenses for dashboard: {error}"))?;
    let goals = list_goals(user_id, &connection)
        .inspect_err(|error| tracing::error!("could not get goals for dashboard: {error}"))?;

    Ok(Json(DashboardSummary::build(
        &income, &expenses, goals, today,
    )))
}
