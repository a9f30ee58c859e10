//! Emulator of the legacy form-encoded endpoint for integration tests.
//!
//! Serves `/admin/api.php`, authenticates `api_key` from the query string and
//! dispatches on `api_action`. Actions answer in each of the shapes the real
//! service uses: `result_code` objects, `succeeded` objects, `success`
//! objects, bare strings, and 4xx/5xx statuses.

use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Form, Json, Router,
};
use serde_json::{json, Map, Value};
use tokio::net::TcpListener;

/// API key the emulator accepts.
pub const API_KEY: &str = "test-key";

/// How long `slow_action` stalls before answering.
pub const SLOW_DELAY: Duration = Duration::from_secs(3);

type Pairs = Vec<(String, String)>;

#[derive(Clone)]
struct AppState {
    api_key: String,
}

pub fn app() -> Router {
    app_with_key(API_KEY)
}

pub fn app_with_key(api_key: &str) -> Router {
    let state = AppState {
        api_key: api_key.to_string(),
    };
    Router::new()
        .route(
            "/admin/api.php",
            get(query_only).post(with_form).put(with_form).delete(with_form),
        )
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn query_only(State(state): State<AppState>, Query(query): Query<Pairs>) -> Response {
    respond(&state, Method::GET, query, Vec::new()).await
}

async fn with_form(
    State(state): State<AppState>,
    method: Method,
    Query(query): Query<Pairs>,
    Form(form): Form<Pairs>,
) -> Response {
    respond(&state, method, query, form).await
}

fn lookup<'a>(pairs: &'a Pairs, key: &str) -> Option<&'a str> {
    pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
}

fn to_object(pairs: &Pairs) -> Value {
    let map: Map<String, Value> = pairs
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();
    Value::Object(map)
}

async fn respond(state: &AppState, method: Method, query: Pairs, form: Pairs) -> Response {
    if lookup(&query, "api_key") != Some(state.api_key.as_str()) {
        return Json(json!({
            "result_code": 0,
            "result_message": "You are not authorized to access this file",
            "result_output": "json",
        }))
        .into_response();
    }

    let action = lookup(&query, "api_action").unwrap_or_default();
    tracing::debug!(%method, action, "api request");

    match action {
        "user_me" | "account_view" => Json(json!({
            "result_code": 1,
            "result_message": "Success: Something is returned",
            "id": "1",
            "username": "admin",
        }))
        .into_response(),
        "contact_add" => match lookup(&form, "email") {
            Some(email) if email.contains('@') => Json(json!({
                "result_code": 1,
                "result_message": "Contact added",
                "subscriber_id": 42,
                "received": to_object(&form),
            }))
            .into_response(),
            _ => Json(json!({
                "result_code": 0,
                "result_message": "Contact Email Address is not valid.",
            }))
            .into_response(),
        },
        "contact_view" => match lookup(&query, "id") {
            Some(id) => Json(json!({"result_code": 1, "id": id, "email": "ada@example.com"}))
                .into_response(),
            None => Json(json!({"result_code": 0, "result_message": "Failed: Nothing is returned"}))
                .into_response(),
        },
        "automation_contact_add" => match lookup(&form, "contact_email") {
            Some(_) => Json(json!({"succeeded": 1, "message": "Contact added to automation"}))
                .into_response(),
            None => Json(json!({"succeeded": 0, "message": "Contact does not exist"}))
                .into_response(),
        },
        "branding_view" => Json(json!({"success": 1, "site_name": "Acme"})).into_response(),
        "echo" => Json(json!({
            "result_code": 1,
            "method": method.as_str(),
            "query": to_object(&query),
            "form": to_object(&form),
        }))
        .into_response(),
        "tags_list" => r#"["newsletter","vip"]"#.into_response(),
        "form_html" => "<form id=\"f1\"></form>".into_response(),
        "not_found" => (
            StatusCode::NOT_FOUND,
            Json(json!({"result_code": 1, "result_message": "ignored"})),
        )
            .into_response(),
        "server_fault" => (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response(),
        "slow_action" => {
            tokio::time::sleep(SLOW_DELAY).await;
            Json(json!({"result_code": 1})).into_response()
        }
        _ => "Unknown api_action".into_response(),
    }
}
