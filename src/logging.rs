//! Middleware for logging requests and responses.

use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::{StatusCode, header::CONTENT_TYPE},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

/// The number of characters of a request or response body logged at the `info` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// JSON fields whose values are never written to the logs.
const REDACTED_FIELDS: [&str; 2] = ["password", "password2"];

const REDACTED_VALUE: &str = "********";

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] characters, it is
/// truncated and the full body is logged at the `debug` level. Passwords in
/// JSON request bodies are replaced with asterisks.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let Some(body_bytes) = read_body(body).await else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    let body_text = String::from_utf8_lossy(&body_bytes);
    let is_json = parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|content_type| content_type.to_str().ok())
        .is_some_and(|content_type| content_type.starts_with("application/json"));

    if is_json {
        log_request(&parts, &redact_passwords(&body_text));
    } else {
        log_request(&parts, &body_text);
    }

    let request = Request::from_parts(parts, Body::from(body_bytes));
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let Some(body_bytes) = read_body(body).await else {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };
    log_response(&parts, &String::from_utf8_lossy(&body_bytes));

    Response::from_parts(parts, Body::from(body_bytes))
}

async fn read_body(body: Body) -> Option<Bytes> {
    axum::body::to_bytes(body, usize::MAX)
        .await
        .inspect_err(|error| tracing::error!("Could not read body: {error}"))
        .ok()
}

/// Replace the values of the password fields in a JSON object with asterisks.
///
/// Text that is not a JSON object is returned as is.
fn redact_passwords(body_text: &str) -> String {
    let Ok(Value::Object(mut object)) = serde_json::from_str::<Value>(body_text) else {
        return body_text.to_owned();
    };

    let mut redacted = false;
    for field in REDACTED_FIELDS {
        if let Some(value) = object.get_mut(field) {
            *value = Value::String(REDACTED_VALUE.to_owned());
            redacted = true;
        }
    }

    if !redacted {
        return body_text.to_owned();
    }

    Value::Object(object).to_string()
}

fn truncate(body: &str) -> Option<String> {
    match body.char_indices().nth(LOG_BODY_LENGTH_LIMIT) {
        Some((end, _)) => Some(body[..end].to_owned()),
        None => None,
    }
}

fn log_request(parts: &axum::http::request::Parts, body: &str) {
    match truncate(body) {
        Some(truncated) => {
            tracing::info!("Received request: {parts:#?}\nbody: {truncated}...");
            tracing::debug!("Full request body: {body:?}");
        }
        None => tracing::info!("Received request: {parts:#?}\nbody: {body:?}"),
    }
}

fn log_response(parts: &axum::http::response::Parts, body: &str) {
    match truncate(body) {
        Some(truncated) => {
            tracing::info!("Sending response: {parts:#?}\nbody: {truncated}...");
            tracing::debug!("Full response body: {body:?}");
        }
        None => tracing::info!("Sending response: {parts:#?}\nbody: {body:?}"),
    }
}

#[cfg(test)]
mod tests {
    use axum::{Json, Router, middleware, routing::post};
    use axum_test::TestServer;
    use serde_json::{Value, json};

    use crate::logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware, redact_passwords, truncate};

    #[test]
    fn redacts_both_password_fields() {
        let body = r#"{"username":"alice","password":"hunter2","password2":"hunter2"}"#;

        let redacted: Value = serde_json::from_str(&redact_passwords(body)).unwrap();

        assert_eq!(
            redacted,
            json!({"username": "alice", "password": "********", "password2": "********"})
        );
    }

    #[test]
    fn leaves_other_bodies_alone() {
        assert_eq!(redact_passwords(r#"{"amount":"10"}"#), r#"{"amount":"10"}"#);
        assert_eq!(redact_passwords("password=hunter2"), "password=hunter2");
        assert_eq!(redact_passwords(""), "");
    }

    #[test]
    fn truncates_on_character_boundary() {
        let short = "a".repeat(LOG_BODY_LENGTH_LIMIT);
        let long = "é".repeat(LOG_BODY_LENGTH_LIMIT + 1);

        assert_eq!(truncate(&short), None);
        assert_eq!(
            truncate(&long),
            Some("é".repeat(LOG_BODY_LENGTH_LIMIT))
        );
    }

    #[tokio::test]
    async fn passes_request_and_response_through() {
        let app = Router::new()
            .route("/echo", post(|Json(body): Json<Value>| async { Json(body) }))
            .layer(middleware::from_fn(logging_middleware));
        let server = TestServer::try_new(app).expect("Could not create test server.");
        let body = json!({"username": "alice", "password": "hunter2"});

        let response = server.post("/echo").json(&body).await;

        response.assert_status_ok();
        response.assert_json(&body);
    }
}
