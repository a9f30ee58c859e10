//! Normalized results and the response-shape reconciliation.
//!
//! # Design
//! The server reports success in one of three fields depending on the
//! endpoint generation: `result_code` (with `result_message`), `succeeded`
//! (with `message`), or `success`. `normalize` folds the first two into
//! `success` and copies the message into `error` on failure, always checking
//! `result_code` before `succeeded`. The parsed object is otherwise kept as
//! the server sent it.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::http::HttpResponse;

/// Actions whose responses are plain strings rather than result objects.
pub const STRING_RESPONSE_ACTIONS: &[&str] = &[
    "tags_list",
    "segment_list",
    "tracking_event_remove",
    "contact_list",
    "form_html",
    "tracking_site_status",
    "tracking_event_status",
    "tracking_whitelist",
    "tracking_log",
    "tracking_site_list",
    "tracking_event_list",
];

const SUCCESS_FIELDS: [&str; 3] = ["result_code", "succeeded", "success"];

/// What a successful round trip produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Object(ApiResponse),
    /// Verbatim body of an action that answers with a plain string.
    Text(String),
}

impl Response {
    pub fn as_object(&self) -> Option<&ApiResponse> {
        match self {
            Response::Object(obj) => Some(obj),
            Response::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Response::Text(text) => Some(text),
            Response::Object(_) => None,
        }
    }
}

/// A result object with `success`, `http_code` and, on failure, `error`
/// merged into the fields the server returned.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ApiResponse {
    fields: Map<String, Value>,
}

impl ApiResponse {
    pub fn success(&self) -> Option<&Value> {
        self.fields.get("success")
    }

    pub fn is_success(&self) -> bool {
        self.success().is_some_and(truthy)
    }

    pub fn error(&self) -> Option<&str> {
        self.fields.get("error").and_then(Value::as_str)
    }

    pub fn http_code(&self) -> &str {
        self.fields
            .get("http_code")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.fields
    }
}

/// Integer-cast truthiness used by the server for its status fields.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => match n.as_i64() {
            Some(i) => i != 0,
            None => n.as_f64().is_some_and(|f| f.trunc() != 0.0),
        },
        Value::String(s) => leading_integer(s) != 0,
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn leading_integer(s: &str) -> i64 {
    let s = s.trim_start();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end]
        .chars()
        .fold(0i64, |acc, c| {
            acc.saturating_mul(10)
                .saturating_add(i64::from(c.to_digit(10).unwrap_or(0)))
        })
        * sign
}

fn is_set(object: &Map<String, Value>, key: &str) -> bool {
    object.get(key).is_some_and(|v| !v.is_null())
}

fn message_text(value: Option<&Value>) -> Option<Value> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(Value::String(s.clone())),
        Some(other) => Some(Value::String(other.to_string())),
    }
}

/// Action name carried in a URL's `api_action` query parameter, falling
/// back to `hint` when the URL has none.
pub fn action_name(url: &str, hint: Option<&str>) -> Option<String> {
    let query = url.split_once('?').map(|(_, q)| q).unwrap_or("");
    query
        .split('&')
        .find_map(|pair| pair.strip_prefix("api_action="))
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .or_else(|| hint.map(str::to_string))
}

/// Parse and normalize a response body. The status line must already have
/// been checked.
pub fn normalize(action: Option<&str>, response: HttpResponse) -> Result<Response, ApiError> {
    let parsed = serde_json::from_str::<Value>(&response.body).ok();
    let mut object = match parsed {
        Some(Value::Object(map)) if SUCCESS_FIELDS.iter().any(|f| is_set(&map, f)) => map,
        _ => {
            if action.is_some_and(|a| STRING_RESPONSE_ACTIONS.contains(&a)) {
                return Ok(Response::Text(response.body));
            }
            return Err(ApiError::Request(response.body));
        }
    };

    if let Some(code) = object.get("result_code").filter(|v| !v.is_null()).cloned() {
        if !truthy(&code) {
            if let Some(message) = message_text(object.get("result_message")) {
                object.insert("error".to_string(), message);
            }
        }
        object.insert("success".to_string(), code);
    } else if let Some(flag) = object.get("succeeded").filter(|v| !v.is_null()).cloned() {
        if !truthy(&flag) {
            if let Some(message) = message_text(object.get("message")) {
                object.insert("error".to_string(), message);
            }
        }
        object.insert("success".to_string(), flag);
    }

    object.insert(
        "http_code".to_string(),
        Value::String(response.status.to_string()),
    );
    Ok(Response::Object(ApiResponse { fields: object }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ok(body: &str) -> HttpResponse {
        HttpResponse::new(200, body)
    }

    #[test]
    fn result_code_failure_sets_error() {
        let result = normalize(None, ok(r#"{"result_code":0,"result_message":"bad key"}"#)).unwrap();
        let obj = result.as_object().unwrap();
        assert!(!obj.is_success());
        assert_eq!(obj.success(), Some(&json!(0)));
        assert_eq!(obj.error(), Some("bad key"));
        assert_eq!(obj.http_code(), "200");
    }

    #[test]
    fn succeeded_success_has_no_error() {
        let result = normalize(None, ok(r#"{"succeeded":1}"#)).unwrap();
        let obj = result.as_object().unwrap();
        assert!(obj.is_success());
        assert!(obj.get("error").is_none());
    }

    #[test]
    fn succeeded_failure_uses_message() {
        let result = normalize(None, ok(r#"{"succeeded":0,"message":"no such contact"}"#)).unwrap();
        assert_eq!(result.as_object().unwrap().error(), Some("no such contact"));
    }

    #[test]
    fn result_code_wins_over_succeeded() {
        let body = r#"{"result_code":1,"succeeded":0,"message":"ignored"}"#;
        let obj = normalize(None, ok(body)).unwrap();
        let obj = obj.as_object().unwrap();
        assert!(obj.is_success());
        assert!(obj.error().is_none());
    }

    #[test]
    fn plain_success_field_is_left_alone() {
        let obj = normalize(None, ok(r#"{"success":false,"message":"x"}"#)).unwrap();
        let obj = obj.as_object().unwrap();
        assert_eq!(obj.success(), Some(&json!(false)));
        assert!(obj.error().is_none());
        assert_eq!(obj.http_code(), "200");
    }

    #[test]
    fn null_indicator_counts_as_absent() {
        let err = normalize(None, ok(r#"{"result_code":null}"#)).unwrap_err();
        assert!(matches!(err, ApiError::Request(_)));
    }

    #[test]
    fn string_actions_return_raw_body() {
        let result = normalize(Some("tags_list"), ok(r#"["vip","newsletter"]"#)).unwrap();
        assert_eq!(result.as_text(), Some(r#"["vip","newsletter"]"#));
        let result = normalize(Some("form_html"), ok("<form></form>")).unwrap();
        assert_eq!(result.as_text(), Some("<form></form>"));
    }

    #[test]
    fn unknown_shape_is_a_request_error() {
        let err = normalize(Some("contact_add"), ok("Unknown api_action")).unwrap_err();
        match err {
            ApiError::Request(msg) => assert_eq!(msg, "Unknown api_action"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn truthiness_follows_integer_cast() {
        assert!(truthy(&json!(1)));
        assert!(truthy(&json!("1")));
        assert!(truthy(&json!(" 2abc")));
        assert!(truthy(&json!(true)));
        assert!(!truthy(&json!(0)));
        assert!(!truthy(&json!(0.4)));
        assert!(!truthy(&json!("0")));
        assert!(!truthy(&json!("")));
        assert!(!truthy(&json!("abc")));
        assert!(!truthy(&json!(null)));
    }

    #[test]
    fn action_name_prefers_url() {
        assert_eq!(
            action_name("http://h/api.php?api_key=k&api_action=tags_list", Some("x")).as_deref(),
            Some("tags_list")
        );
        assert_eq!(action_name("http://h/api/3/contacts", Some("x")).as_deref(), Some("x"));
        assert_eq!(action_name("http://h/api.php?api_key=k", None), None);
    }

    #[test]
    fn serializes_as_merged_object() {
        let result = normalize(None, ok(r#"{"result_code":1,"id":"5"}"#)).unwrap();
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["success"], 1);
        assert_eq!(value["id"], "5");
        assert_eq!(value["http_code"], "200");
    }
}
