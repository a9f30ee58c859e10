//! Blocking client core for a legacy form-encoded HTTP API.
//!
//! # Overview
//! Callers name remote actions (`contact_add`, `list_`); the dispatcher maps
//! the name onto a capability, the engine encodes the nested parameters into
//! a form body or query string, a `Transport` performs the round trip, and
//! the response is normalized into one result shape with a uniform
//! `success` / `error` / `http_code` signal.
//!
//! # Design
//! - `params`, `engine` and `response` are pure and tested without I/O.
//! - `http::Transport` is the only I/O seam; `UreqTransport` is the default.
//! - No retries: every failure is returned to the caller as an `ApiError`.

pub mod client;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod http;
pub mod params;
pub mod response;

pub use client::ApiClient;
pub use config::{ClientConfig, ClientConfigBuilder, Credentials};
pub use dispatch::{method_name, ActionSpec, Dispatcher, CAPABILITIES};
pub use error::ApiError;
pub use http::{
    HttpMethod, HttpRequest, HttpResponse, Transport, TransportError, TransportOptions,
    UreqTransport,
};
pub use params::{encode_form, ParamValue};
pub use response::{ApiResponse, Response};
