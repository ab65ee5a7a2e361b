//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type but uses C-compatible representations:
//! `*mut c_char` instead of `String`, raw pointers instead of `Vec` and
//! `Option`, and tagged enums with explicit discriminants. Conversion
//! functions live here to keep `lib.rs` focused on the `extern "C"` surface.

use std::ffi::CString;
use std::os::raw::c_char;

use user_core::controller::{FetchCommand, FetchOutcome, Ticket, ViewState, ViewStateController};
use user_core::error::ApiError;
use user_core::http::HttpMethod;
use user_core::{User, UserClient, UserId};

/// Opaque handle to a `UserClient`.
pub struct FfiUserClient {
    pub(crate) inner: UserClient,
}

/// Opaque handle to a view state controller plus the client used to build
/// the requests it asks for.
pub struct FfiController {
    pub(crate) client: UserClient,
    pub(crate) inner: ViewStateController,
}

/// Heap-allocate `s` as a C string. Interior NULs yield an empty string.
pub(crate) fn c_string(s: impl Into<Vec<u8>>) -> *mut c_char {
    CString::new(s).unwrap_or_default().into_raw()
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
pub enum FfiHttpMethod {
    Get = 0,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
        }
    }
}

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request described as C-compatible plain data.
///
/// The C caller executes the request and passes the response back through
/// `user_parse_get_user` or `user_controller_complete`.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub path: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut c_char,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    pub(crate) fn from_core(req: user_core::HttpRequest) -> *mut Self {
        let path = c_string(req.path);
        let body = match req.body {
            Some(b) => c_string(b),
            None => std::ptr::null_mut(),
        };

        let headers_len = req.headers.len() as u32;
        let headers = if req.headers.is_empty() {
            std::ptr::null_mut()
        } else {
            let ffi_headers: Box<[FfiHeader]> = req
                .headers
                .into_iter()
                .map(|(k, v)| FfiHeader {
                    key: c_string(k),
                    value: c_string(v),
                })
                .collect();
            Box::into_raw(ffi_headers) as *mut FfiHeader
        };

        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            path,
            headers,
            headers_len,
            body,
        }))
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// An HTTP response described as C-compatible plain data.
///
/// The C caller constructs this on the stack after executing a request. The
/// FFI layer reads but does not free these fields.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

// ---------------------------------------------------------------------------
// User & result types
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiUserResult`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    Transport = 1,
    Http = 2,
    InvalidResponse = 3,
    Panic = 4,
    NullArg = 5,
}

/// A user record exposed to C.
#[repr(C)]
pub struct FfiUser {
    pub id: i64,
    pub email: *mut c_char,
    pub first_name: *mut c_char,
    pub last_name: *mut c_char,
    pub avatar: *mut c_char,
}

impl FfiUser {
    pub(crate) fn boxed(user: User) -> *mut Self {
        Box::into_raw(Box::new(FfiUser {
            id: user.id,
            email: c_string(user.email),
            first_name: c_string(user.first_name),
            last_name: c_string(user.last_name),
            avatar: c_string(user.avatar),
        }))
    }

    /// Free a boxed `FfiUser` and its strings. Null is ignored.
    ///
    /// # Safety
    /// `user` must be null or a pointer produced by `FfiUser::boxed`.
    pub(crate) unsafe fn free(user: *mut Self) {
        if user.is_null() {
            return;
        }
        let user = unsafe { Box::from_raw(user) };
        for s in [user.email, user.first_name, user.last_name, user.avatar] {
            if !s.is_null() {
                drop(unsafe { CString::from_raw(s) });
            }
        }
    }
}

/// Result envelope for `user_parse_get_user`.
///
/// On success `error_code` is `Ok`, `error_message` is null, and `user`
/// points to the parsed record. On failure `error_message` holds the
/// user-facing message, `http_status` is 0 when the error has no status, and
/// `user` is null.
#[repr(C)]
pub struct FfiUserResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub user: *mut FfiUser,
}

impl FfiUserResult {
    pub(crate) fn ok_user(user: User) -> *mut Self {
        Box::into_raw(Box::new(FfiUserResult {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            http_status: 0,
            user: FfiUser::boxed(user),
        }))
    }

    pub(crate) fn from_error(err: ApiError) -> *mut Self {
        let error_code = match &err {
            ApiError::Transport { .. } => FfiErrorCode::Transport,
            ApiError::Http { .. } => FfiErrorCode::Http,
            ApiError::InvalidResponse(_) => FfiErrorCode::InvalidResponse,
        };
        Self::failure(error_code, &err.message(), err.status().unwrap_or(0))
    }

    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::failure(FfiErrorCode::NullArg, &format!("null argument: {name}"), 0)
    }

    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::failure(FfiErrorCode::Panic, msg, 0)
    }

    fn failure(error_code: FfiErrorCode, msg: &str, http_status: u16) -> *mut Self {
        Box::into_raw(Box::new(FfiUserResult {
            error_code,
            error_message: c_string(msg),
            http_status,
            user: std::ptr::null_mut(),
        }))
    }
}

// ---------------------------------------------------------------------------
// Controller types
// ---------------------------------------------------------------------------

/// Identity of one request issued by the controller. Hand it back unchanged
/// with the response.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FfiTicket {
    pub user_id: u64,
    pub serial: u64,
    pub attempt: u32,
}

impl From<Ticket> for FfiTicket {
    fn from(t: Ticket) -> Self {
        FfiTicket {
            user_id: t.user_id.get(),
            serial: t.serial,
            attempt: t.attempt,
        }
    }
}

impl FfiTicket {
    pub(crate) fn to_core(self) -> Option<Ticket> {
        Some(Ticket {
            user_id: UserId::new(self.user_id)?,
            serial: self.serial,
            attempt: self.attempt,
        })
    }
}

/// A fetch the host must perform: wait `delay_ms`, execute `request`, then
/// report the outcome with `ticket`.
#[repr(C)]
pub struct FfiFetchCommand {
    pub ticket: FfiTicket,
    pub delay_ms: u64,
    pub request: *mut FfiHttpRequest,
}

impl FfiFetchCommand {
    pub(crate) fn from_core(command: FetchCommand, client: &UserClient) -> *mut Self {
        let request = FfiHttpRequest::from_core(client.build_get_user(command.ticket.user_id));
        Box::into_raw(Box::new(FfiFetchCommand {
            ticket: command.ticket.into(),
            delay_ms: u64::try_from(command.delay.as_millis()).unwrap_or(u64::MAX),
            request,
        }))
    }

    pub(crate) fn from_option(command: Option<FetchCommand>, client: &UserClient) -> *mut Self {
        command.map_or(std::ptr::null_mut(), |c| Self::from_core(c, client))
    }
}

/// Which panel the view should show.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiViewKind {
    Idle = 0,
    InvalidId = 1,
    Loading = 2,
    Success = 3,
    Failure = 4,
}

/// Snapshot of the controller's visible state.
///
/// `user_id` is 0 unless a lookup is active. `message` is set for
/// `InvalidId` and `Failure`; `user` only for `Success`.
#[repr(C)]
pub struct FfiViewState {
    pub kind: FfiViewKind,
    pub user_id: u64,
    pub message: *mut c_char,
    pub http_status: u16,
    pub user: *mut FfiUser,
}

impl FfiViewState {
    pub(crate) fn from_core(state: ViewState) -> *mut Self {
        let message = state
            .error_message()
            .map_or(std::ptr::null_mut(), c_string);
        let user_id = state.active_id().map_or(0, UserId::get);
        let (kind, http_status, user) = match state {
            ViewState::Idle => (FfiViewKind::Idle, 0, std::ptr::null_mut()),
            ViewState::InvalidId { .. } => (FfiViewKind::InvalidId, 0, std::ptr::null_mut()),
            ViewState::Active { outcome, .. } => match outcome {
                FetchOutcome::Loading => (FfiViewKind::Loading, 0, std::ptr::null_mut()),
                FetchOutcome::Success(user) => (FfiViewKind::Success, 0, FfiUser::boxed(user)),
                FetchOutcome::Failure(failure) => (
                    FfiViewKind::Failure,
                    failure.status.unwrap_or(0),
                    std::ptr::null_mut(),
                ),
            },
        };
        Box::into_raw(Box::new(FfiViewState {
            kind,
            user_id,
            message,
            http_status,
            user,
        }))
    }
}
