//! C-ABI wrapper around `user-core`.
//!
//! # Overview
//! Exposes the user lookup through `extern "C"` functions so a host written
//! in any language with a C FFI can build requests, parse responses, and
//! drive the view state controller without linking Rust's async runtime.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - `user_build_get_user` / `user_parse_get_user` mirror the core client.
//! - The controller functions hand back an `FfiFetchCommand` whenever the
//!   host must perform a request; the host reports the outcome with the
//!   command's ticket through `user_controller_complete` or
//!   `user_controller_fail_transport`.
//! - The C caller owns all returned pointers and must call the matching
//!   `user_free_*` function to release them.

pub mod types;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

use user_core::error::{ApiError, LookupError};
use user_core::http::HttpResponse;
use user_core::{RetryPolicy, Route, UserClient, UserId, ViewStateController};

use types::*;

/// Borrow a C string as `&str`. Null or invalid UTF-8 yields `None`.
///
/// # Safety
/// `s` must be null or point to a NUL-terminated string that outlives `'a`.
unsafe fn opt_str<'a>(s: *const c_char) -> Option<&'a str> {
    if s.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(s) }.to_str().ok()
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a new `UserClient` bound to `base_url`.
///
/// Returns null if `base_url` is null or if an internal panic occurs.
/// The caller must free the returned pointer with `user_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn user_client_new(base_url: *const c_char) -> *mut FfiUserClient {
    catch_unwind(|| {
        if base_url.is_null() {
            return std::ptr::null_mut();
        }
        let url = unsafe { opt_str(base_url) }.unwrap_or("");
        Box::into_raw(Box::new(FfiUserClient {
            inner: UserClient::new(url),
        }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `user_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn user_client_free(client: *mut FfiUserClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

// ---------------------------------------------------------------------------
// Build / parse
// ---------------------------------------------------------------------------

/// Build the request fetching user `id`.
///
/// Returns null if `client` or `id` is null, or if `id` is not a positive
/// integer. The caller must free the result with `user_free_request`.
#[unsafe(no_mangle)]
pub extern "C" fn user_build_get_user(
    client: *const FfiUserClient,
    id: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() || id.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        let id = match unsafe { opt_str(id) }.map(str::parse::<UserId>) {
            Some(Ok(id)) => id,
            _ => return std::ptr::null_mut(),
        };
        FfiHttpRequest::from_core(client.inner.build_get_user(id))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Convert a caller-owned `FfiHttpResponse` to a core `HttpResponse`.
/// A null body is read as empty.
fn ffi_response_to_core(resp: &FfiHttpResponse) -> HttpResponse {
    HttpResponse {
        status: resp.status,
        headers: Vec::new(),
        body: unsafe { opt_str(resp.body) }.unwrap_or("").to_string(),
    }
}

/// Parse the response to a get-user request.
///
/// Never returns null. Free the result with `user_free_result`.
#[unsafe(no_mangle)]
pub extern "C" fn user_parse_get_user(
    client: *const FfiUserClient,
    response: *const FfiHttpResponse,
) -> *mut FfiUserResult {
    catch_unwind(|| {
        if client.is_null() {
            return FfiUserResult::null_arg("client");
        }
        if response.is_null() {
            return FfiUserResult::null_arg("response");
        }
        let client = unsafe { &*client };
        let resp = unsafe { &*response };
        match client.inner.parse_get_user(ffi_response_to_core(resp)) {
            Ok(user) => FfiUserResult::ok_user(user),
            Err(e) => FfiUserResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiUserResult::panic("panic in user_parse_get_user"))
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Create a view state controller whose requests target `base_url`.
///
/// `max_retries` is the number of extra attempts after a failed fetch.
/// Returns null if `base_url` is null. Free with `user_controller_free`.
#[unsafe(no_mangle)]
pub extern "C" fn user_controller_new(
    base_url: *const c_char,
    max_retries: u32,
) -> *mut FfiController {
    catch_unwind(|| {
        let Some(url) = (unsafe { opt_str(base_url) }) else {
            return std::ptr::null_mut();
        };
        let policy = RetryPolicy::default().with_max_retries(max_retries);
        Box::into_raw(Box::new(FfiController {
            client: UserClient::new(url),
            inner: ViewStateController::new(policy),
        }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a controller created by `user_controller_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn user_controller_free(controller: *mut FfiController) {
    if !controller.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(controller) });
        });
    }
}

/// Apply a new route parameter. `param` may be null for "no id".
///
/// Returns the fetch to perform, or null when none is needed.
#[unsafe(no_mangle)]
pub extern "C" fn user_controller_set_route_param(
    controller: *mut FfiController,
    param: *const c_char,
) -> *mut FfiFetchCommand {
    catch_unwind(AssertUnwindSafe(|| {
        if controller.is_null() {
            return std::ptr::null_mut();
        }
        let controller = unsafe { &mut *controller };
        let command = controller
            .inner
            .set_route_param(unsafe { opt_str(param) });
        FfiFetchCommand::from_option(command, &controller.client)
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Resolve `path` as a route and apply its user parameter.
///
/// Unknown paths resolve to the home route and leave the lookup idle.
#[unsafe(no_mangle)]
pub extern "C" fn user_controller_navigate(
    controller: *mut FfiController,
    path: *const c_char,
) -> *mut FfiFetchCommand {
    catch_unwind(AssertUnwindSafe(|| {
        if controller.is_null() || path.is_null() {
            return std::ptr::null_mut();
        }
        let controller = unsafe { &mut *controller };
        let route = Route::resolve(unsafe { opt_str(path) }.unwrap_or(""));
        let command = controller.inner.set_route_param(route.user_param());
        FfiFetchCommand::from_option(command, &controller.client)
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Report the HTTP response to the request identified by `ticket`.
///
/// Returns the retry to perform, or null when the lookup settled or the
/// response was stale.
#[unsafe(no_mangle)]
pub extern "C" fn user_controller_complete(
    controller: *mut FfiController,
    ticket: FfiTicket,
    response: *const FfiHttpResponse,
) -> *mut FfiFetchCommand {
    catch_unwind(AssertUnwindSafe(|| {
        if controller.is_null() || response.is_null() {
            return std::ptr::null_mut();
        }
        let Some(ticket) = ticket.to_core() else {
            return std::ptr::null_mut();
        };
        let controller = unsafe { &mut *controller };
        let resp = unsafe { &*response };
        let result = controller
            .client
            .parse_get_user(ffi_response_to_core(resp))
            .map_err(LookupError::from);
        let command = controller.inner.complete(ticket, result);
        FfiFetchCommand::from_option(command, &controller.client)
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Report that the request identified by `ticket` never got a response.
///
/// `cause` is logged but not shown; it may be null.
#[unsafe(no_mangle)]
pub extern "C" fn user_controller_fail_transport(
    controller: *mut FfiController,
    ticket: FfiTicket,
    cause: *const c_char,
) -> *mut FfiFetchCommand {
    catch_unwind(AssertUnwindSafe(|| {
        if controller.is_null() {
            return std::ptr::null_mut();
        }
        let Some(ticket) = ticket.to_core() else {
            return std::ptr::null_mut();
        };
        let controller = unsafe { &mut *controller };
        let cause = unsafe { opt_str(cause) }.unwrap_or("transport failure").to_string();
        let err = LookupError::from(ApiError::Transport { cause });
        let command = controller.inner.complete(ticket, Err(err));
        FfiFetchCommand::from_option(command, &controller.client)
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Snapshot the controller's view state. Free with `user_free_view`.
#[unsafe(no_mangle)]
pub extern "C" fn user_controller_view(controller: *const FfiController) -> *mut FfiViewState {
    catch_unwind(|| {
        if controller.is_null() {
            return std::ptr::null_mut();
        }
        let controller = unsafe { &*controller };
        FfiViewState::from_core(controller.inner.state())
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiHttpRequest` and its strings.
///
/// # Safety
/// `req` must be null or a pointer produced by `FfiHttpRequest::from_core`.
unsafe fn free_request_parts(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let req = unsafe { Box::from_raw(req) };
    if !req.path.is_null() {
        drop(unsafe { CString::from_raw(req.path) });
    }
    if !req.body.is_null() {
        drop(unsafe { CString::from_raw(req.body) });
    }
    if !req.headers.is_null() && req.headers_len > 0 {
        let headers = unsafe {
            Vec::from_raw_parts(req.headers, req.headers_len as usize, req.headers_len as usize)
        };
        for h in headers {
            if !h.key.is_null() {
                drop(unsafe { CString::from_raw(h.key) });
            }
            if !h.value.is_null() {
                drop(unsafe { CString::from_raw(h.value) });
            }
        }
    }
}

/// Free an `FfiHttpRequest` returned by `user_build_get_user`.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn user_free_request(req: *mut FfiHttpRequest) {
    let _ = catch_unwind(|| unsafe { free_request_parts(req) });
}

/// Free an `FfiFetchCommand` together with its request. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn user_free_command(command: *mut FfiFetchCommand) {
    if command.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let command = unsafe { Box::from_raw(command) };
        unsafe { free_request_parts(command.request) };
    });
}

/// Free an `FfiUserResult` returned by `user_parse_get_user`.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn user_free_result(result: *mut FfiUserResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        if !result.error_message.is_null() {
            drop(unsafe { CString::from_raw(result.error_message) });
        }
        unsafe { FfiUser::free(result.user) };
    });
}

/// Free an `FfiViewState` returned by `user_controller_view`.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn user_free_view(view: *mut FfiViewState) {
    if view.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let view = unsafe { Box::from_raw(view) };
        if !view.message.is_null() {
            drop(unsafe { CString::from_raw(view.message) });
        }
        unsafe { FfiUser::free(view.user) };
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn user_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { CString::from_raw(s) });
        });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
