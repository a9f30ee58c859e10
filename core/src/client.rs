//! Blocking client for the legacy form-encoded API.
//!
//! # Design
//! `ApiClient` owns its `ClientConfig` and a `Transport`. Every call, whether
//! it comes through a named convenience method, `call`, or `api`, ends in
//! `request`: build the request, run it through the transport, classify the
//! outcome, normalize the body. One call is one round trip; nothing is
//! retried.

use std::time::Duration;

use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::dispatch::{path_to_call, ActionSpec, Dispatcher};
use crate::engine::{build_request, classify};
use crate::error::ApiError;
use crate::http::{HttpMethod, Transport, TransportOptions, UreqTransport};
use crate::params::ParamValue;
use crate::response::{action_name, normalize, Response};

/// Client for the legacy API, generic over the transport that performs I/O.
#[derive(Debug, Clone)]
pub struct ApiClient<T = UreqTransport> {
    config: ClientConfig,
    transport: T,
}

impl ApiClient<UreqTransport> {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_transport(config, UreqTransport)
    }

    /// Client configured from `FORMAPI_*` environment variables.
    pub fn from_env() -> Result<Self, ApiError> {
        ClientConfig::from_env().map(Self::new)
    }
}

impl<T: Transport> ApiClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Read timeout for a whole call.
    pub fn timeout(&self) -> Duration {
        self.config.read_timeout
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.config.read_timeout = timeout;
    }

    pub fn connect_timeout(&self) -> Duration {
        self.config.connect_timeout
    }

    pub fn set_connect_timeout(&mut self, timeout: Duration) {
        self.config.connect_timeout = timeout;
    }

    /// Run one request against `url`.
    ///
    /// `action` is only consulted when `url` carries no `api_action`; it
    /// decides whether a non-object body may be returned as text.
    pub fn request(
        &self,
        url: &str,
        action: Option<&str>,
        params: Option<&ParamValue>,
        verb: Option<HttpMethod>,
    ) -> Result<Response, ApiError> {
        let request = build_request(url, params, verb, self.config.send_empty_expect());
        let action = action_name(url, action);
        debug!(
            action = action.as_deref().unwrap_or("-"),
            method = request.method.as_str(),
            "sending request"
        );

        let options = TransportOptions {
            connect_timeout: self.config.connect_timeout,
            read_timeout: self.config.read_timeout,
        };
        let outcome = self.transport.execute(&request, &options);
        if let Err(e) = &outcome {
            warn!(error = ?e, "transport failure");
        }

        let response = classify(outcome)?;
        debug!(status = response.status, "response received");
        normalize(action.as_deref(), response)
    }

    /// Invoke a capability. The first argument, if any, is its parameter
    /// structure; further arguments are ignored.
    pub fn invoke(&self, spec: &ActionSpec, args: &[ParamValue]) -> Result<Response, ApiError> {
        let url = self.config.action_url(spec.action);
        self.request(&url, Some(spec.action), args.first(), spec.verb)
    }

    /// Dispatch a call by name (`contact_list`, `contactList`, `list_`).
    pub fn call(&self, name: &str, args: &[ParamValue]) -> Result<Response, ApiError> {
        let spec = Dispatcher::global().resolve(name)?;
        self.invoke(spec, args)
    }

    /// Dispatch a call given as a `component/method` path.
    pub fn api(&self, path: &str, args: &[ParamValue]) -> Result<Response, ApiError> {
        let spec = Dispatcher::global()
            .resolve(&path_to_call(path))
            .map_err(|_| ApiError::MissingMethod {
                name: path.to_string(),
                type_name: "ApiClient".to_string(),
            })?;
        self.invoke(spec, args)
    }

    /// Whether the configured credentials are accepted. Every failure,
    /// including transport errors, reduces to `false`.
    pub fn credentials_test(&self) -> bool {
        match self.user_me() {
            Ok(Response::Object(obj)) => obj.is_success(),
            Ok(Response::Text(_)) => false,
            Err(e) => {
                debug!(error = %e, "credentials test failed");
                false
            }
        }
    }

    fn named(&self, name: &str, params: Option<ParamValue>) -> Result<Response, ApiError> {
        let args: Vec<ParamValue> = params.into_iter().collect();
        self.call(name, &args)
    }

    pub fn account_view(&self) -> Result<Response, ApiError> {
        self.named("account_view", None)
    }

    pub fn user_me(&self) -> Result<Response, ApiError> {
        self.named("user_me", None)
    }

    pub fn contact_add(&self, params: ParamValue) -> Result<Response, ApiError> {
        self.named("contact_add", Some(params))
    }

    pub fn contact_edit(&self, params: ParamValue) -> Result<Response, ApiError> {
        self.named("contact_edit", Some(params))
    }

    pub fn contact_sync(&self, params: ParamValue) -> Result<Response, ApiError> {
        self.named("contact_sync", Some(params))
    }

    pub fn contact_view(&self, params: ParamValue) -> Result<Response, ApiError> {
        self.named("contact_view", Some(params))
    }

    pub fn contact_list(&self, params: ParamValue) -> Result<Response, ApiError> {
        self.named("contact_list", Some(params))
    }

    pub fn contact_delete(&self, params: ParamValue) -> Result<Response, ApiError> {
        self.named("contact_delete", Some(params))
    }

    pub fn list_add(&self, params: ParamValue) -> Result<Response, ApiError> {
        self.named("list_add", Some(params))
    }

    pub fn list_list(&self, params: ParamValue) -> Result<Response, ApiError> {
        self.named("list_", Some(params))
    }

    pub fn tags_list(&self) -> Result<Response, ApiError> {
        self.named("tags_list", None)
    }

    pub fn form_html(&self, params: ParamValue) -> Result<Response, ApiError> {
        self.named("form_html", Some(params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use crate::http::{HttpRequest, HttpResponse, TransportError};

    /// Transport returning a canned outcome and recording what it was sent.
    struct FakeTransport {
        outcome: Result<HttpResponse, TransportError>,
        sent: RefCell<Vec<(HttpRequest, TransportOptions)>>,
    }

    impl FakeTransport {
        fn ok(status: u16, body: &str) -> Self {
            Self::with(Ok(HttpResponse::new(status, body)))
        }

        fn with(outcome: Result<HttpResponse, TransportError>) -> Self {
            Self {
                outcome,
                sent: RefCell::new(Vec::new()),
            }
        }

        fn last(&self) -> HttpRequest {
            self.sent.borrow().last().map(|(r, _)| r.clone()).unwrap()
        }
    }

    impl Transport for FakeTransport {
        fn execute(
            &self,
            request: &HttpRequest,
            options: &TransportOptions,
        ) -> Result<HttpResponse, TransportError> {
            self.sent.borrow_mut().push((request.clone(), *options));
            self.outcome.clone()
        }
    }

    fn client(transport: FakeTransport) -> ApiClient<FakeTransport> {
        let config = ClientConfig::builder("http://acct.test").api_key("k").build().unwrap();
        ApiClient::with_transport(config, transport)
    }

    const BASE: &str = "http://acct.test/admin/api.php?api_key=k&api_output=json";

    #[test]
    fn call_routes_snake_case_to_capability() {
        let c = client(FakeTransport::ok(200, r#"{"result_code":1,"subscriber_id":9}"#));
        let params = ParamValue::map([("email", "a@b.co")]);
        let result = c.call("contact_add", &[params]).unwrap();

        let req = c.transport().last();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, format!("{BASE}&api_action=contact_add"));
        assert_eq!(req.body.as_deref(), Some("email=a%40b.co"));
        assert!(result.as_object().unwrap().is_success());
    }

    #[test]
    fn extra_arguments_are_ignored() {
        let c = client(FakeTransport::ok(200, r#"{"result_code":1}"#));
        let args = [ParamValue::map([("id", 3)]), ParamValue::from("ignored")];
        c.call("contact_view", &args).unwrap();
        assert_eq!(
            c.transport().last().url,
            format!("{BASE}&api_action=contact_view&id=3")
        );
    }

    #[test]
    fn reserved_word_alias_dispatches() {
        let c = client(FakeTransport::ok(200, r#"{"result_code":1}"#));
        c.call("list_", &[ParamValue::map([("ids", "all")])]).unwrap();
        assert_eq!(
            c.transport().last().url,
            format!("{BASE}&api_action=list_list&ids=all")
        );
    }

    #[test]
    fn unknown_call_never_reaches_transport() {
        let c = client(FakeTransport::ok(200, "{}"));
        let err = c.call("contact_explode", &[]).unwrap_err();
        assert!(matches!(err, ApiError::MissingMethod { ref name, .. } if name == "contact_explode"));
        assert!(c.transport().sent.borrow().is_empty());
    }

    #[test]
    fn api_path_form_dispatches() {
        let c = client(FakeTransport::ok(200, r#"{"result_code":1}"#));
        c.api("account/view", &[]).unwrap();
        assert_eq!(c.transport().last().url, format!("{BASE}&api_action=account_view"));

        let err = c.api("nope/never", &[]).unwrap_err();
        assert!(matches!(err, ApiError::MissingMethod { ref name, .. } if name == "nope/never"));
    }

    #[test]
    fn string_action_returns_text() {
        let c = client(FakeTransport::ok(200, r#"["vip"]"#));
        assert_eq!(c.tags_list().unwrap().as_text(), Some(r#"["vip"]"#));
    }

    #[test]
    fn url_action_overrides_hint() {
        let c = client(FakeTransport::ok(200, "<form/>"));
        let url = format!("{BASE}&api_action=form_html");
        let result = c.request(&url, Some("contact_add"), None, None).unwrap();
        assert_eq!(result.as_text(), Some("<form/>"));
    }

    #[test]
    fn client_error_short_circuits() {
        let c = client(FakeTransport::ok(404, r#"{"result_code":1}"#));
        let err = c.account_view().unwrap_err();
        assert!(matches!(err, ApiError::ClientError { status: 404, .. }));
    }

    #[test]
    fn connect_timeout_surfaces_as_timeout() {
        let transport = FakeTransport::with(Err(TransportError::Timeout(
            "timeout: connect".to_string(),
        )));
        let mut c = client(transport);
        c.set_connect_timeout(Duration::from_millis(250));
        let err = c.user_me().unwrap_err();
        assert!(matches!(err, ApiError::Timeout(_)));
        let options = c.transport().sent.borrow()[0].1;
        assert_eq!(options.connect_timeout, Duration::from_millis(250));
    }

    #[test]
    fn timeout_setters_update_config() {
        let mut c = client(FakeTransport::ok(200, "{}"));
        assert_eq!(c.timeout(), Duration::from_secs(30));
        assert_eq!(c.connect_timeout(), Duration::from_secs(10));
        c.set_timeout(Duration::from_secs(5));
        c.set_connect_timeout(Duration::from_secs(2));
        assert_eq!(c.timeout(), Duration::from_secs(5));
        assert_eq!(c.connect_timeout(), Duration::from_secs(2));
    }

    #[test]
    fn credentials_test_reduces_to_bool() {
        assert!(client(FakeTransport::ok(200, r#"{"result_code":1}"#)).credentials_test());
        assert!(!client(FakeTransport::ok(
            200,
            r#"{"result_code":0,"result_message":"not authorized"}"#
        ))
        .credentials_test());
        assert!(!client(FakeTransport::ok(500, "boom")).credentials_test());
        assert!(!client(FakeTransport::with(Err(TransportError::Failed(
            "dns".to_string()
        ))))
        .credentials_test());
    }
}
