//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! A call result crosses the boundary as one envelope: an error code, an
//! optional message, the HTTP status, and a tagged C string payload. Object
//! results are serialized to JSON; plain-string results are passed through
//! unchanged.

use std::ffi::CString;
use std::os::raw::c_char;

use formapi_core::{ApiError, Response};

/// Opaque handle to an `ApiClient`. C callers receive a pointer to this
/// and pass it back into every FFI function.
pub struct FfiApiClient {
    pub(crate) inner: formapi_core::ApiClient,
}

/// Convert to a heap C string. Interior NULs are dropped.
pub(crate) fn to_c_string(s: &str) -> *mut c_char {
    CString::new(s.replace('\0', ""))
        .unwrap_or_default()
        .into_raw()
}

/// Error codes returned in `FfiCallResult`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    MissingMethod = 1,
    Timeout = 2,
    Request = 3,
    ClientError = 4,
    ServerError = 5,
    Configuration = 6,
    InvalidArgs = 7,
    Panic = 8,
    NullArg = 9,
}

/// Tag describing what `FfiCallResult::data` holds.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiDataTag {
    None = 0,
    /// JSON text of the normalized result object.
    Object = 1,
    /// Verbatim body of a plain-string action.
    Text = 2,
}

/// Result envelope for `formapi_call`.
///
/// On success `error_code` is `Ok`, `error_message` is null, and `data`
/// holds the payload described by `data_tag`. On failure `error_message`
/// is a human-readable C string and `data` is null.
#[repr(C)]
pub struct FfiCallResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub data_tag: FfiDataTag,
    pub data: *mut c_char,
}

impl FfiCallResult {
    fn boxed(
        error_code: FfiErrorCode,
        error_message: Option<&str>,
        http_status: u16,
        data_tag: FfiDataTag,
        data: *mut c_char,
    ) -> *mut Self {
        Box::into_raw(Box::new(FfiCallResult {
            error_code,
            error_message: error_message.map_or(std::ptr::null_mut(), to_c_string),
            http_status,
            data_tag,
            data,
        }))
    }

    /// Build a success result from a core `Response`.
    pub(crate) fn from_response(response: Response) -> *mut Self {
        match response {
            Response::Object(obj) => {
                let status = obj.http_code().parse().unwrap_or(0);
                match serde_json::to_string(&obj) {
                    Ok(json) => Self::boxed(
                        FfiErrorCode::Ok,
                        None,
                        status,
                        FfiDataTag::Object,
                        to_c_string(&json),
                    ),
                    Err(e) => Self::boxed(
                        FfiErrorCode::Request,
                        Some(&e.to_string()),
                        status,
                        FfiDataTag::None,
                        std::ptr::null_mut(),
                    ),
                }
            }
            Response::Text(text) => {
                Self::boxed(FfiErrorCode::Ok, None, 0, FfiDataTag::Text, to_c_string(&text))
            }
        }
    }

    /// Build an error result from an `ApiError`.
    pub(crate) fn from_error(err: ApiError) -> *mut Self {
        let code = match &err {
            ApiError::MissingMethod { .. } => FfiErrorCode::MissingMethod,
            ApiError::Timeout(_) => FfiErrorCode::Timeout,
            ApiError::Request(_) => FfiErrorCode::Request,
            ApiError::ClientError { .. } => FfiErrorCode::ClientError,
            ApiError::ServerError { .. } => FfiErrorCode::ServerError,
            ApiError::Configuration(_) => FfiErrorCode::Configuration,
        };
        Self::boxed(
            code,
            Some(&err.to_string()),
            err.status().unwrap_or(0),
            FfiDataTag::None,
            std::ptr::null_mut(),
        )
    }

    /// Build an error result for arguments that are not a JSON array.
    pub(crate) fn invalid_args(msg: &str) -> *mut Self {
        Self::boxed(
            FfiErrorCode::InvalidArgs,
            Some(&format!("invalid arguments: {msg}")),
            0,
            FfiDataTag::None,
            std::ptr::null_mut(),
        )
    }

    /// Build an error result for a null argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::boxed(
            FfiErrorCode::NullArg,
            Some(&format!("null argument: {name}")),
            0,
            FfiDataTag::None,
            std::ptr::null_mut(),
        )
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::boxed(
            FfiErrorCode::Panic,
            Some(msg),
            0,
            FfiDataTag::None,
            std::ptr::null_mut(),
        )
    }
}
