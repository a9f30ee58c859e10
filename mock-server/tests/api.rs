use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, API_KEY};
use serde_json::Value;
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn action_uri(action: &str) -> String {
    format!("/admin/api.php?api_key={API_KEY}&api_output=json&api_action={action}")
}

fn get_request(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

fn form_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(body.to_string())
        .unwrap()
}

// --- auth ---

#[tokio::test]
async fn wrong_key_is_rejected_in_body() {
    let resp = app()
        .oneshot(get_request("/admin/api.php?api_key=nope&api_action=user_me"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["result_code"], 0);
    assert_eq!(body["result_message"], "You are not authorized to access this file");
}

#[tokio::test]
async fn user_me_with_valid_key() {
    let resp = app().oneshot(get_request(&action_uri("user_me"))).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["result_code"], 1);
    assert_eq!(body["username"], "admin");
}

// --- contact_add ---

#[tokio::test]
async fn contact_add_echoes_form() {
    let resp = app()
        .oneshot(form_request(
            "POST",
            &action_uri("contact_add"),
            "email=ada%40example.com&p%5B1%5D=1",
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["result_code"], 1);
    assert_eq!(body["received"]["email"], "ada@example.com");
    assert_eq!(body["received"]["p[1]"], "1");
}

#[tokio::test]
async fn contact_add_rejects_bad_email() {
    let resp = app()
        .oneshot(form_request("POST", &action_uri("contact_add"), "email=nope"))
        .await
        .unwrap();

    let body = body_json(resp).await;
    assert_eq!(body["result_code"], 0);
    assert_eq!(body["result_message"], "Contact Email Address is not valid.");
}

// --- other shapes ---

#[tokio::test]
async fn automation_uses_succeeded_shape() {
    let resp = app()
        .oneshot(form_request(
            "POST",
            &action_uri("automation_contact_add"),
            "automation=1",
        ))
        .await
        .unwrap();

    let body = body_json(resp).await;
    assert_eq!(body["succeeded"], 0);
    assert_eq!(body["message"], "Contact does not exist");
}

#[tokio::test]
async fn tags_list_is_a_bare_string() {
    let resp = app().oneshot(get_request(&action_uri("tags_list"))).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_bytes(resp).await;
    assert_eq!(&body[..], br#"["newsletter","vip"]"#);
}

#[tokio::test]
async fn echo_reports_method_and_form() {
    let resp = app()
        .oneshot(form_request("DELETE", &action_uri("echo"), "id=9"))
        .await
        .unwrap();

    let body = body_json(resp).await;
    assert_eq!(body["method"], "DELETE");
    assert_eq!(body["form"]["id"], "9");
    assert_eq!(body["query"]["api_action"], "echo");
}

// --- failures ---

#[tokio::test]
async fn not_found_action_returns_404() {
    let resp = app().oneshot(get_request(&action_uri("not_found"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn server_fault_returns_500() {
    let resp = app().oneshot(get_request(&action_uri("server_fault"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn unknown_action_is_plain_text() {
    let resp = app().oneshot(get_request(&action_uri("frobnicate"))).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_bytes(resp).await;
    assert_eq!(&body[..], b"Unknown api_action");
}

#[tokio::test]
async fn unknown_path_returns_404() {
    let resp = app().oneshot(get_request("/api/3/contacts")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
