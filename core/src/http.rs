//! HTTP plain-data types and the blocking transport.
//!
//! # Design
//! Requests and responses are described as plain data so the engine can build
//! and classify them without touching the network. The `Transport` trait is
//! the only place I/O happens; `UreqTransport` is the production
//! implementation and tests substitute their own.

use std::time::Duration;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    /// Parse a caller-supplied verb. Anything that is not `GET`, `PUT` or
    /// `DELETE` is sent as `POST`.
    pub fn from_verb(verb: &str) -> Self {
        match verb.to_ascii_uppercase().as_str() {
            "GET" => HttpMethod::Get,
            "PUT" => HttpMethod::Put,
            "DELETE" => HttpMethod::Delete,
            _ => HttpMethod::Post,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    /// A bare response with no headers.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }
}

/// Per-call transport settings taken from `ClientConfig`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportOptions {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}

/// Failure to complete a round trip at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    Timeout(String),
    Failed(String),
}

/// Executes one request and returns the response, whatever its status.
pub trait Transport {
    fn execute(
        &self,
        request: &HttpRequest,
        options: &TransportOptions,
    ) -> Result<HttpResponse, TransportError>;
}

/// Blocking transport backed by `ureq`.
///
/// Certificate and hostname verification are disabled: the legacy service
/// is commonly deployed behind self-signed certificates. Callers that need
/// verification should supply their own `Transport`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UreqTransport;

impl UreqTransport {
    fn agent(options: &TransportOptions) -> ureq::Agent {
        let tls = ureq::tls::TlsConfig::builder()
            .disable_verification(true)
            .build();
        ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_connect(Some(options.connect_timeout))
            .timeout_global(Some(options.read_timeout))
            .tls_config(tls)
            .build()
            .new_agent()
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (key, value) in headers {
        builder = builder.header(key.as_str(), value.as_str());
    }
    builder
}

fn classify(err: ureq::Error) -> TransportError {
    let message = err.to_string();
    match err {
        ureq::Error::Timeout(_) => TransportError::Timeout(message),
        ureq::Error::Io(ref io) if io.kind() == std::io::ErrorKind::TimedOut => {
            TransportError::Timeout(message)
        }
        _ => TransportError::Failed(message),
    }
}

impl Transport for UreqTransport {
    fn execute(
        &self,
        request: &HttpRequest,
        options: &TransportOptions,
    ) -> Result<HttpResponse, TransportError> {
        let agent = Self::agent(options);
        let url = request.url.as_str();
        let headers = &request.headers;

        let result = match (request.method, request.body.as_deref()) {
            (HttpMethod::Get, _) => with_headers(agent.get(url), headers).call(),
            (HttpMethod::Post, body) => {
                with_headers(agent.post(url), headers).send(body.unwrap_or("").as_bytes())
            }
            (HttpMethod::Put, body) => {
                with_headers(agent.put(url), headers).send(body.unwrap_or("").as_bytes())
            }
            (HttpMethod::Delete, Some(body)) => with_headers(agent.delete(url), headers)
                .force_send_body()
                .send(body.as_bytes()),
            (HttpMethod::Delete, None) => with_headers(agent.delete(url), headers).call(),
        };

        let mut response = result.map_err(classify)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.body_mut().read_to_string().map_err(classify)?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
