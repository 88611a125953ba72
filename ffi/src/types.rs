//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type with C-compatible representations:
//! `*mut c_char` instead of `String`, pointer + length instead of `Vec`, and
//! enums with explicit discriminants. Conversion functions live here to keep
//! `lib.rs` focused on the `extern "C"` surface.

use std::ffi::CString;
use std::os::raw::c_char;

use tmdb_auth_core::{
    HandshakeError, HandshakeResult, HandshakeState, HandshakeStep, HttpMethod, LoginErrorKind,
    SequenceError,
};

/// Opaque handle to a `TmdbClient`.
pub struct FfiTmdbClient {
    pub(crate) inner: tmdb_auth_core::TmdbClient,
}

/// Opaque handle to one in-progress login attempt.
pub struct FfiHandshake {
    pub(crate) inner: tmdb_auth_core::Handshake,
}

/// Allocate a C string, dropping interior NULs rather than failing.
pub(crate) fn to_c_string(s: impl Into<String>) -> *mut c_char {
    let s: String = s.into();
    let cleaned = if s.contains('\0') {
        s.replace('\0', "")
    } else {
        s
    };
    CString::new(cleaned).unwrap_or_default().into_raw()
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

/// An HTTP request the host must execute.
///
/// `url` includes the query string and may contain the user's password.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    pub(crate) fn from_core(req: tmdb_auth_core::HttpRequest) -> *mut Self {
        let headers_len = req.headers.len() as u32;
        let headers = if req.headers.is_empty() {
            std::ptr::null_mut()
        } else {
            let ffi_headers: Box<[FfiHeader]> = req
                .headers
                .into_iter()
                .map(|(k, v)| FfiHeader {
                    key: to_c_string(k),
                    value: to_c_string(v),
                })
                .collect();
            Box::into_raw(ffi_headers) as *mut FfiHeader
        };

        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            url: to_c_string(req.url),
            headers,
            headers_len,
        }))
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// An HTTP response filled in by the host.
///
/// `body` points at `body_len` raw bytes owned by the host. The library
/// copies them before returning and never frees them.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const u8,
    pub body_len: usize,
}

impl FfiHttpResponse {
    pub(crate) fn to_core(&self) -> tmdb_auth_core::HttpResponse {
        let body = if self.body.is_null() || self.body_len == 0 {
            Vec::new()
        } else {
            unsafe { std::slice::from_raw_parts(self.body, self.body_len) }.to_vec()
        };
        tmdb_auth_core::HttpResponse::new(self.status, body)
    }
}

// ---------------------------------------------------------------------------
// State and result types
// ---------------------------------------------------------------------------

/// Handshake state as a C enum.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiHandshakeState {
    Idle = 0,
    AwaitingToken = 1,
    AwaitingValidation = 2,
    AwaitingSession = 3,
    AwaitingUserId = 4,
    Done = 5,
    Failed = 6,
}

impl From<&HandshakeState> for FfiHandshakeState {
    fn from(state: &HandshakeState) -> Self {
        match state {
            HandshakeState::Idle => FfiHandshakeState::Idle,
            HandshakeState::AwaitingToken => FfiHandshakeState::AwaitingToken,
            HandshakeState::AwaitingValidation { .. } => FfiHandshakeState::AwaitingValidation,
            HandshakeState::AwaitingSession { .. } => FfiHandshakeState::AwaitingSession,
            HandshakeState::AwaitingUserId { .. } => FfiHandshakeState::AwaitingUserId,
            HandshakeState::Done(_) => FfiHandshakeState::Done,
            HandshakeState::Failed(_) => FfiHandshakeState::Failed,
        }
    }
}

/// Which step a failure belongs to.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiStep {
    None = 0,
    Credentials = 1,
    RequestToken = 2,
    ValidateLogin = 3,
    CreateSession = 4,
    AccountId = 5,
}

impl From<HandshakeStep> for FfiStep {
    fn from(step: HandshakeStep) -> Self {
        match step {
            HandshakeStep::Credentials => FfiStep::Credentials,
            HandshakeStep::RequestToken => FfiStep::RequestToken,
            HandshakeStep::ValidateLogin => FfiStep::ValidateLogin,
            HandshakeStep::CreateSession => FfiStep::CreateSession,
            HandshakeStep::AccountId => FfiStep::AccountId,
        }
    }
}

/// Error codes returned in `FfiLoginResult`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    Transport = 1,
    HttpStatus = 2,
    Decode = 3,
    Service = 4,
    MissingField = 5,
    Cancelled = 6,
    EmptyCredentials = 7,
    InvalidState = 8,
    Panic = 9,
    NullArg = 10,
}

/// Terminal outcome of a login, or an error from the FFI layer itself.
///
/// On success `error_code` is `Ok`, `session_id` is set and `user_id` holds
/// the account id. On failure `error_message` is a human-readable reason,
/// `failed_step` names the step, and `session_id` is null. `http_status`
/// and `service_status_code` are 0 when not applicable.
#[repr(C)]
pub struct FfiLoginResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub failed_step: FfiStep,
    pub http_status: u16,
    pub service_status_code: i64,
    pub session_id: *mut c_char,
    pub user_id: u64,
}

impl FfiLoginResult {
    fn empty(error_code: FfiErrorCode) -> Self {
        FfiLoginResult {
            error_code,
            error_message: std::ptr::null_mut(),
            failed_step: FfiStep::None,
            http_status: 0,
            service_status_code: 0,
            session_id: std::ptr::null_mut(),
            user_id: 0,
        }
    }

    /// Build a result from a terminal handshake outcome.
    pub(crate) fn from_result(result: HandshakeResult) -> *mut Self {
        let ffi = match result {
            Ok(session) => FfiLoginResult {
                session_id: to_c_string(session.session_id.into_string()),
                user_id: session.user_id.0,
                ..Self::empty(FfiErrorCode::Ok)
            },
            Err(err) => {
                let mut ffi = Self::empty(FfiErrorCode::Transport);
                ffi.error_code = match &err.source {
                    LoginErrorKind::Credentials(_) => FfiErrorCode::EmptyCredentials,
                    LoginErrorKind::Internal(_) => FfiErrorCode::InvalidState,
                    LoginErrorKind::Handshake(e) => match e {
                        HandshakeError::Transport(_) => FfiErrorCode::Transport,
                        HandshakeError::HttpStatus { status, .. } => {
                            ffi.http_status = *status;
                            FfiErrorCode::HttpStatus
                        }
                        HandshakeError::Decode(_) => FfiErrorCode::Decode,
                        HandshakeError::Service { status_code, .. } => {
                            ffi.service_status_code = status_code.unwrap_or(0);
                            FfiErrorCode::Service
                        }
                        HandshakeError::MissingField { .. } => FfiErrorCode::MissingField,
                        HandshakeError::Cancelled => FfiErrorCode::Cancelled,
                    },
                };
                ffi.failed_step = err.step.into();
                ffi.error_message = to_c_string(err.reason());
                ffi
            }
        };
        Box::into_raw(Box::new(ffi))
    }

    /// Build an error result for misuse of the handshake.
    pub(crate) fn from_sequence_error(err: SequenceError) -> *mut Self {
        Self::with_message(FfiErrorCode::InvalidState, &err.to_string())
    }

    /// Build an error result for a null argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::with_message(FfiErrorCode::NullArg, &format!("null argument: {name}"))
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::with_message(FfiErrorCode::Panic, msg)
    }

    fn with_message(code: FfiErrorCode, msg: &str) -> *mut Self {
        Box::into_raw(Box::new(FfiLoginResult {
            error_message: to_c_string(msg),
            ..Self::empty(code)
        }))
    }
}
