//! C-ABI wrapper around `formapi-core`.
//!
//! # Overview
//! Exposes the blocking client through `extern "C"` functions: create a
//! client, adjust its timeouts, dispatch calls by name with JSON-encoded
//! positional arguments, and test credentials.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - `formapi_call` mirrors `ApiClient::call`: the name goes through the
//!   same dispatcher, and `args_json` must be a JSON array whose elements
//!   become the positional arguments.
//! - A single `FfiCallResult` envelope carries payloads and errors.
//! - The C caller owns all returned pointers and must release them with the
//!   matching `formapi_free_*` function.

pub mod types;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::catch_unwind;
use std::time::Duration;

use formapi_core::{ApiClient, ClientConfig, ParamValue};
use serde_json::Value;

use types::*;

/// Read a borrowed C string. Invalid UTF-8 reads as empty.
///
/// # Safety
/// `ptr` must be non-null and point to a NUL-terminated string that outlives
/// the returned slice.
unsafe fn read_str<'a>(ptr: *const c_char) -> &'a str {
    CStr::from_ptr(ptr).to_str().unwrap_or("")
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a client for the account at `base_url`, authenticating with
/// `api_key`.
///
/// Returns null if either argument is null, if the configuration is
/// rejected, or if an internal panic occurs. The caller must free the
/// returned pointer with `formapi_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn formapi_client_new(
    base_url: *const c_char,
    api_key: *const c_char,
) -> *mut FfiApiClient {
    catch_unwind(|| {
        if base_url.is_null() || api_key.is_null() {
            return std::ptr::null_mut();
        }
        let url = unsafe { read_str(base_url) };
        let key = unsafe { read_str(api_key) };
        match ClientConfig::builder(url).api_key(key).build() {
            Ok(config) => Box::into_raw(Box::new(FfiApiClient {
                inner: ApiClient::new(config),
            })),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `formapi_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn formapi_client_free(client: *mut FfiApiClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

/// Set the read timeout, in milliseconds. Ignored for a null client.
///
/// Not synchronized: do not call while another thread is using `client`.
#[unsafe(no_mangle)]
pub extern "C" fn formapi_client_set_timeout_ms(client: *mut FfiApiClient, millis: u64) {
    if client.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let client = unsafe { &mut *client };
        client.inner.set_timeout(Duration::from_millis(millis));
    });
}

/// Set the connect timeout, in milliseconds. Ignored for a null client.
#[unsafe(no_mangle)]
pub extern "C" fn formapi_client_set_connect_timeout_ms(client: *mut FfiApiClient, millis: u64) {
    if client.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let client = unsafe { &mut *client };
        client.inner.set_connect_timeout(Duration::from_millis(millis));
    });
}

// ---------------------------------------------------------------------------
// Calls
// ---------------------------------------------------------------------------

fn parse_args(args_json: &str) -> Result<Vec<ParamValue>, String> {
    if args_json.trim().is_empty() {
        return Ok(Vec::new());
    }
    match serde_json::from_str::<Value>(args_json).map_err(|e| e.to_string())? {
        Value::Array(items) => Ok(items.into_iter().map(ParamValue::from).collect()),
        _ => Err("expected a JSON array".to_string()),
    }
}

/// Dispatch `name` with the positional arguments in `args_json`.
///
/// `args_json` may be null for a call without arguments. Performs one
/// blocking HTTP round trip.
#[unsafe(no_mangle)]
pub extern "C" fn formapi_call(
    client: *const FfiApiClient,
    name: *const c_char,
    args_json: *const c_char,
) -> *mut FfiCallResult {
    catch_unwind(|| {
        if client.is_null() {
            return FfiCallResult::null_arg("client");
        }
        if name.is_null() {
            return FfiCallResult::null_arg("name");
        }
        let client = unsafe { &*client };
        let name = unsafe { read_str(name) };
        let raw_args = if args_json.is_null() {
            ""
        } else {
            unsafe { read_str(args_json) }
        };
        let args = match parse_args(raw_args) {
            Ok(args) => args,
            Err(msg) => return FfiCallResult::invalid_args(&msg),
        };
        match client.inner.call(name, &args) {
            Ok(response) => FfiCallResult::from_response(response),
            Err(e) => FfiCallResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiCallResult::panic("panic in formapi_call"))
}

/// Whether the client's credentials are accepted. Any failure is `false`.
#[unsafe(no_mangle)]
pub extern "C" fn formapi_credentials_test(client: *const FfiApiClient) -> bool {
    if client.is_null() {
        return false;
    }
    catch_unwind(|| {
        let client = unsafe { &*client };
        client.inner.credentials_test()
    })
    .unwrap_or(false)
}

/// The capability identifier `name` resolves to (`contact_list` →
/// `contactList`). Returns null for a null `name`; free the result with
/// `formapi_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn formapi_method_name(name: *const c_char) -> *mut c_char {
    if name.is_null() {
        return std::ptr::null_mut();
    }
    catch_unwind(|| {
        let name = unsafe { read_str(name) };
        to_c_string(&formapi_core::method_name(name))
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiCallResult` returned by `formapi_call`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn formapi_free_result(result: *mut FfiCallResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        if !result.error_message.is_null() {
            drop(unsafe { CString::from_raw(result.error_message) });
        }
        if !result.data.is_null() {
            drop(unsafe { CString::from_raw(result.data) });
        }
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn formapi_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { CString::from_raw(s) });
        });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
