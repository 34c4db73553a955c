//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router, middleware,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};

use crate::{
    AppState, Error,
    auth::{auth_guard, get_log_out, get_profile, post_log_in, register_user},
    dashboard::get_dashboard,
    endpoints,
    expense::{
        create_expense_endpoint, delete_expense_endpoint, expenses_by_category_endpoint,
        expenses_monthly_total_endpoint, get_expense_endpoint, list_expenses_endpoint,
        update_expense_endpoint,
    },
    goal::{
        add_funds_endpoint, create_goal_endpoint, delete_goal_endpoint, get_goal_endpoint,
        list_goals_endpoint, update_goal_endpoint,
    },
    income::{
        create_income_endpoint, delete_income_endpoint, get_income_endpoint,
        income_monthly_total_endpoint, list_income_endpoint, update_income_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::REGISTER, post(register_user))
        .route(endpoints::LOG_IN, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out));

    let protected_routes = Router::new()
        .route(endpoints::PROFILE, get(get_profile))
        .route(endpoints::DASHBOARD, get(get_dashboard))
        .route(
            endpoints::INCOME,
            get(list_income_endpoint).post(create_income_endpoint),
        )
        .route(
            endpoints::INCOME_MONTHLY_TOTAL,
            get(income_monthly_total_endpoint),
        )
        .route(
            endpoints::INCOME_ITEM,
            get(get_income_endpoint)
                .put(update_income_endpoint)
                .delete(delete_income_endpoint),
        )
        .route(
            endpoints::EXPENSES,
            get(list_expenses_endpoint).post(create_expense_endpoint),
        )
        .route(
            endpoints::EXPENSES_MONTHLY_TOTAL,
            get(expenses_monthly_total_endpoint),
        )
        .route(
            endpoints::EXPENSES_BY_CATEGORY,
            get(expenses_by_category_endpoint),
        )
        .route(
            endpoints::EXPENSE_ITEM,
            get(get_expense_endpoint)
                .put(update_expense_endpoint)
                .delete(delete_expense_endpoint),
        )
        .route(
            endpoints::SAVINGS_GOALS,
            get(list_goals_endpoint).post(create_goal_endpoint),
        )
        .route(
            endpoints::SAVINGS_GOAL_ITEM,
            get(get_goal_endpoint)
                .put(update_goal_endpoint)
                .delete(delete_goal_endpoint),
        )
        .route(endpoints::SAVINGS_GOAL_ADD_FUNDS, patch(add_funds_endpoint))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The response for any path that does not match a route.
async fn get_404_not_found() -> Response {
    Error::NotFound.into_response()
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_extra::extract::cookie::Cookie;
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::{Value, json};
    use time::OffsetDateTime;

    use crate::{AppState, auth::COOKIE_TOKEN, build_router, endpoints, endpoints::format_endpoint};

    const PASSWORD: &str = "averysafeandsecurepassword";

    fn get_test_server() -> TestServer {
        let connection = Connection::open_in_memory().unwrap();
        let state = AppState::new(connection, "42", "Etc/UTC").unwrap();

        TestServer::try_new(build_router(state)).expect("Could not create test server.")
    }

    /// Register and log in `username`, returning the auth cookie.
    async fn log_in(server: &TestServer, username: &str) -> Cookie<'static> {
        server
            .post(endpoints::REGISTER)
            .json(&json!({
                "username": username,
                "email": format!("{username}@example.com"),
                "password": PASSWORD,
                "password2": PASSWORD
            }))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({ "username": username, "password": PASSWORD }))
            .await;
        response.assert_status_ok();

        response.cookie(COOKIE_TOKEN)
    }

    fn today() -> String {
        OffsetDateTime::now_utc().date().to_string()
    }

    #[tokio::test]
    async fn protected_routes_need_auth_cookie() {
        let server = get_test_server();

        for path in [
            endpoints::DASHBOARD,
            endpoints::INCOME,
            endpoints::EXPENSES,
            endpoints::SAVINGS_GOALS,
            endpoints::PROFILE,
        ] {
            let response = server.get(path).await;

            response.assert_status(StatusCode::UNAUTHORIZED);
            response.assert_json(&json!({
                "error": "Authentication credentials were not provided."
            }));
        }
    }

    #[tokio::test]
    async fn unknown_path_is_json_not_found() {
        let server = get_test_server();

        let response = server.get("/api/nope").await;

        response.assert_status(StatusCode::NOT_FOUND);
        response.assert_json(&json!({ "error": "Not found." }));
    }

    #[tokio::test]
    async fn profile_shows_logged_in_user() {
        let server = get_test_server();
        let cookie = log_in(&server, "alice").await;

        let response = server.get(endpoints::PROFILE).add_cookie(cookie).await;

        response.assert_status_ok();
        let profile: Value = response.json();
        assert_eq!(profile["username"], "alice");
        assert_eq!(profile["email"], "alice@example.com");
    }

    #[tokio::test]
    async fn records_flow_into_dashboard() {
        let server = get_test_server();
        let cookie = log_in(&server, "alice").await;

        server
            .post(endpoints::INCOME)
            .add_cookie(cookie.clone())
            .json(&json!({ "source": "Salary", "amount": "3000.00", "date": today() }))
            .await
            .assert_status(StatusCode::CREATED);
        server
            .post(endpoints::EXPENSES)
            .add_cookie(cookie.clone())
            .json(&json!({
                "title": "Groceries",
                "category": "food",
                "amount": "45.99",
                "date": today()
            }))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server.get(endpoints::DASHBOARD).add_cookie(cookie).await;

        response.assert_status_ok();
        let summary: Value = response.json();
        assert_eq!(summary["total_income"], 3000.0);
        assert_eq!(summary["total_expenses"], 45.99);
        assert_eq!(summary["balance"], 2954.01);
        assert_eq!(
            summary["expenses_by_category"],
            json!([{ "name": "Food & Dining", "value": 45.99, "category": "food" }])
        );
        assert_eq!(summary["monthly_data"].as_array().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn validation_errors_are_reported_per_field() {
        let server = get_test_server();
        let cookie = log_in(&server, "alice").await;

        let response = server
            .post(endpoints::EXPENSES)
            .add_cookie(cookie)
            .json(&json!({ "title": "", "amount": "10", "date": today() }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({ "title": ["This field may not be blank."] }));
    }

    #[tokio::test]
    async fn malformed_requests_get_json_errors() {
        let server = get_test_server();
        let cookie = log_in(&server, "alice").await;

        let bad_query = server
            .get(endpoints::INCOME)
            .add_query_param("month", "abc")
            .add_cookie(cookie.clone())
            .await;
        let bad_id = server
            .get("/api/expenses/abc")
            .add_cookie(cookie.clone())
            .await;
        let bad_body = server
            .post(endpoints::SAVINGS_GOALS)
            .add_cookie(cookie)
            .json(&json!("not an object"))
            .await;

        bad_query.assert_status(StatusCode::BAD_REQUEST);
        bad_id.assert_status(StatusCode::BAD_REQUEST);
        bad_body.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        for response in [bad_query, bad_id, bad_body] {
            let body: Value = response.json();
            assert!(body["error"].is_string(), "expected a JSON error, got {body}");
        }
    }

    #[tokio::test]
    async fn other_users_records_are_not_found() {
        let server = get_test_server();
        let alice = log_in(&server, "alice").await;
        let bob = log_in(&server, "bob").await;

        let response = server
            .post(endpoints::INCOME)
            .add_cookie(alice)
            .json(&json!({ "source": "Salary", "amount": "10", "date": today() }))
            .await;
        let income_id = response.json::<Value>()["id"].as_i64().unwrap();

        let response = server
            .get(&format_endpoint(endpoints::INCOME_ITEM, income_id))
            .add_cookie(bob)
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn add_funds_round_trip() {
        let server = get_test_server();
        let cookie = log_in(&server, "alice").await;
        let deadline = (OffsetDateTime::now_utc().date() + time::Duration::days(30)).to_string();

        let response = server
            .post(endpoints::SAVINGS_GOALS)
            .add_cookie(cookie.clone())
            .json(&json!({ "name": "Bike", "target_amount": "400", "deadline": deadline }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let goal_id = response.json::<Value>()["id"].as_i64().unwrap();
        let add_funds_path = format_endpoint(endpoints::SAVINGS_GOAL_ADD_FUNDS, goal_id);

        let response = server
            .patch(&add_funds_path)
            .add_cookie(cookie.clone())
            .json(&json!({ "amount": "100" }))
            .await;
        response.assert_status_ok();
        let goal: Value = response.json();
        assert_eq!(goal["current_amount"], "100.00");
        assert_eq!(goal["progress_percentage"], 25.0);
        assert_eq!(goal["days_remaining"], 30);

        let response = server
            .patch(&add_funds_path)
            .add_cookie(cookie)
            .json(&json!({ "amount": "abc" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({ "error": "Amount must be a positive number." }));
    }
}
