//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/income/{income_id}', use [format_endpoint].

/// The route for registering a new user.
pub const REGISTER: &str = "/api/auth/register";
/// The route for logging in a user.
pub const LOG_IN: &str = "/api/auth/log_in";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/auth/log_out";
/// The route for the logged in user's profile.
pub const PROFILE: &str = "/api/auth/profile";

/// The route for the dashboard summary.
pub const DASHBOARD: &str = "/api/dashboard";

/// The route to list and create income.
pub const INCOME: &str = "/api/income";
/// The route to access a single income record.
pub const INCOME_ITEM: &str = "/api/income/{income_id}";
/// The route for the total income of the current month.
pub const INCOME_MONTHLY_TOTAL: &str = "/api/income/monthly_total";

/// The route to list and create expenses.
pub const EXPENSES: &str = "/api/expenses";
/// The route to access a single expense.
pub const EXPENSE_ITEM: &str = "/api/expenses/{expense_id}";
/// The route for the total expenses of the current month.
pub const EXPENSES_MONTHLY_TOTAL: &str = "/api/expenses/monthly_total";
/// The route for expense totals per category.
pub const EXPENSES_BY_CATEGORY: &str = "/api/expenses/by_category";

/// The route to list and create savings goals.
pub const SAVINGS_GOALS: &str = "/api/savings-goals";
/// The route to access a single savings goal.
pub const SAVINGS_GOAL_ITEM: &str = "/api/savings-goals/{goal_id}";
/// The route to contribute money to a savings goal.
pub const SAVINGS_GOAL_ADD_FUNDS: &str = "/api/savings-goals/{goal_id}/add_funds";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/users/{user_id}', '{user_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_string();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|offset| param_start + offset + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}

// These tests are here so that we know when we call `Uri::from_shared` it will not panic.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    use super::format_endpoint;

    #[track_caller]
    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok(), "{uri} is not a valid URI");
    }

    #[test]
    fn endpoints_are_valid_uris() {
        for endpoint in [
            endpoints::REGISTER,
            endpoints::LOG_IN,
            endpoints::LOG_OUT,
            endpoints::PROFILE,
            endpoints::DASHBOARD,
            endpoints::INCOME,
            endpoints::INCOME_ITEM,
            endpoints::INCOME_MONTHLY_TOTAL,
            endpoints::EXPENSES,
            endpoints::EXPENSE_ITEM,
            endpoints::EXPENSES_MONTHLY_TOTAL,
            endpoints::EXPENSES_BY_CATEGORY,
            endpoints::SAVINGS_GOALS,
            endpoints::SAVINGS_GOAL_ITEM,
            endpoints::SAVINGS_GOAL_ADD_FUNDS,
        ] {
            assert_endpoint_is_valid_uri(endpoint);
        }
    }

    #[test]
    fn produces_valid_uri() {
        let formatted_path = format_endpoint("/hello/{world_id}", 1);

        assert_eq!(formatted_path, "/hello/1");
        assert!(formatted_path.parse::<Uri>().is_ok());

        // Parameter with single word should also work.
        let formatted_path = format_endpoint("/hello/{world}", 1);

        assert_eq!(formatted_path, "/hello/1");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn returns_original_path_with_no_parameter() {
        let formatted_path = format_endpoint("/hello/world", 1);

        assert_eq!(formatted_path, "/hello/world");
    }

    #[test]
    fn parameter_in_middle() {
        let formatted_path = format_endpoint(endpoints::SAVINGS_GOAL_ADD_FUNDS, 12);

        assert_eq!(formatted_path, "/api/savings-goals/12/add_funds");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }
}
