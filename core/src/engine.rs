//! Request construction and outcome classification.
//!
//! # Design
//! Both halves are pure: `build_request` turns a URL, parameters and a verb
//! hint into an `HttpRequest`, and `classify` sorts a transport outcome into
//! an error or a response whose body is ready for `response::normalize`.
//! The client wires them around a `Transport`.

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, TransportError};
use crate::params::{append_query, encode_form, ParamValue};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Pick the verb for a request.
///
/// Supplied parameters default to `POST` and honor an explicit verb; with
/// no parameters the request is always a `GET`.
pub fn resolve_method(has_params: bool, requested: Option<HttpMethod>) -> HttpMethod {
    match (has_params, requested) {
        (false, _) => HttpMethod::Get,
        (true, None) => HttpMethod::Post,
        (true, Some(verb)) => verb,
    }
}

/// Build the request for one call.
///
/// Parameters with an explicit `GET` go into the query string; otherwise
/// they become a form body on `POST`, `PUT` or `DELETE`.
pub fn build_request(
    url: &str,
    params: Option<&ParamValue>,
    requested: Option<HttpMethod>,
    send_empty_expect: bool,
) -> HttpRequest {
    let params = params.filter(|p| p.is_present());

    if let (Some(params), Some(HttpMethod::Get)) = (params, requested) {
        return HttpRequest {
            method: HttpMethod::Get,
            url: append_query(url, params),
            headers: Vec::new(),
            body: None,
        };
    }

    let method = resolve_method(params.is_some(), requested);
    let (headers, body) = match (method, params) {
        (HttpMethod::Get, _) | (_, None) => (Vec::new(), None),
        (_, Some(params)) => {
            let mut headers = vec![("content-type".to_string(), FORM_CONTENT_TYPE.to_string())];
            if send_empty_expect {
                headers.push(("expect".to_string(), String::new()));
            }
            (headers, Some(encode_form(params)))
        }
    };

    HttpRequest {
        method,
        url: url.to_string(),
        headers,
        body,
    }
}

/// Sort a transport outcome: transport failures first, then 4xx/5xx status
/// codes. Only what remains has its body parsed.
pub fn classify(outcome: Result<HttpResponse, TransportError>) -> Result<HttpResponse, ApiError> {
    let response = match outcome {
        Ok(response) => response,
        Err(TransportError::Timeout(msg)) => return Err(ApiError::Timeout(msg)),
        Err(TransportError::Failed(msg)) => return Err(ApiError::Request(msg)),
    };
    match response.status / 100 {
        4 => Err(ApiError::ClientError {
            status: response.status,
            body: response.body,
        }),
        5 => Err(ApiError::ServerError {
            status: response.status,
            body: response.body,
        }),
        _ => Ok(response),
    }
}
