//! Handler for ending a session.

use axum::Json;
use axum_extra::extract::PrivateCookieJar;
use serde_json::{Value, json};

use crate::auth::invalidate_auth_cookie;

/// Invalidate the auth cookie, logging the user out.
pub async fn get_log_out(jar: PrivateCookieJar) -> (PrivateCookieJar, Json<Value>) {
    (
        invalidate_auth_cookie(jar),
        Json(json!({ "message": "Logged out." })),
    )
}

#[cfg(test)]
mod log_out_tests {
    use axum::{Router, routing::get};
    use axum_extra::extract::cookie::Key;
    use axum_test::TestServer;
    use time::{Duration, OffsetDateTime};

    use crate::{app_state::create_cookie_key, auth::COOKIE_TOKEN, endpoints};

    use super::get_log_out;

    #[tokio::test]
    async fn log_out_invalidates_auth_cookie() {
        let key: Key = create_cookie_key("foobar");
        let app = Router::new()
            .route(endpoints::LOG_OUT, get(get_log_out))
            .with_state(key);
        let server = TestServer::try_new(app).expect("Could not create test server.");

        let response = server.get(endpoints::LOG_OUT).await;

        response.assert_status_ok();
        let cookie = response.cookie(COOKIE_TOKEN);
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
        assert_eq!(cookie.expires_datetime(), Some(OffsetDateTime::UNIX_EPOCH));
    }
}
