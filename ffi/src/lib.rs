//! C-ABI wrapper around `tmdb-auth-core`.
//!
//! # Overview
//! Exposes the TMDb login handshake through `extern "C"` functions so any
//! language with a C FFI can log a user in without linking a Rust HTTP
//! stack. Two styles are offered:
//! - step-driven: `tmdb_handshake_start` / `tmdb_handshake_advance` hand the
//!   host one request at a time, and the host feeds back each response;
//! - callback-driven: `tmdb_login` takes a send function pointer and a
//!   completion callback, and runs all four steps itself.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - A single `FfiLoginResult` envelope carries either the session or a
//!   categorized error with a human-readable message.
//! - The C caller owns all returned pointers and must call the matching
//!   `tmdb_free_*` / `*_free` function to release them.

pub mod types;

use std::ffi::{c_void, CStr, CString};
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

use tmdb_auth_core::{
    Authenticator, Credentials, Handshake, HandshakeState, HandshakeStep,
    HttpRequest, HttpResponse, LoginError, SequenceError, Step, TmdbClient, Transport,
    TransportError,
};

use types::*;

/// Host transport: execute `request`, fill `response`, return 0 on success.
///
/// Any non-zero return is reported as a transport error. The body buffer
/// written into `response` must stay valid until the function is called
/// again or `tmdb_login` returns.
pub type TmdbSendFn = extern "C" fn(
    ctx: *mut c_void,
    request: *const FfiHttpRequest,
    response: *mut FfiHttpResponse,
) -> i32;

/// Completion callback. `result` is only valid for the duration of the call.
pub type TmdbCompleteFn = extern "C" fn(ctx: *mut c_void, result: *const FfiLoginResult);

/// Borrow a C string as `&str`; invalid UTF-8 reads as empty.
unsafe fn str_arg<'a>(ptr: *const c_char) -> &'a str {
    unsafe { CStr::from_ptr(ptr) }.to_str().unwrap_or("")
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a new `TmdbClient` bound to `base_url` and `api_key`.
///
/// Returns null if either argument is null or if an internal panic occurs.
/// The caller must free the returned pointer with `tmdb_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn tmdb_client_new(
    base_url: *const c_char,
    api_key: *const c_char,
) -> *mut FfiTmdbClient {
    catch_unwind(|| {
        if base_url.is_null() || api_key.is_null() {
            return std::ptr::null_mut();
        }
        let url = unsafe { str_arg(base_url) };
        let key = unsafe { str_arg(api_key) };
        let client = TmdbClient::new(url, key);
        Box::into_raw(Box::new(FfiTmdbClient { inner: client }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a `TmdbClient` created by `tmdb_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn tmdb_client_free(client: *mut FfiTmdbClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

// ---------------------------------------------------------------------------
// Step-driven handshake
// ---------------------------------------------------------------------------

/// Begin a login attempt for `username` / `password`.
///
/// Returns null if any argument is null or if either credential is empty.
/// The caller must free the returned pointer with `tmdb_handshake_free`.
#[unsafe(no_mangle)]
pub extern "C" fn tmdb_handshake_new(
    client: *const FfiTmdbClient,
    username: *const c_char,
    password: *const c_char,
) -> *mut FfiHandshake {
    catch_unwind(|| {
        if client.is_null() || username.is_null() || password.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        let credentials =
            match Credentials::new(unsafe { str_arg(username) }, unsafe { str_arg(password) }) {
                Ok(c) => c,
                Err(_) => return std::ptr::null_mut(),
            };
        let inner = Handshake::new(client.inner.clone(), credentials);
        Box::into_raw(Box::new(FfiHandshake { inner }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a handshake created by `tmdb_handshake_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn tmdb_handshake_free(handshake: *mut FfiHandshake) {
    if !handshake.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(handshake) });
        });
    }
}

/// Produce the request-token request.
///
/// Returns null if `handshake` is null or was already started.
/// The caller must free the returned pointer with `tmdb_free_request`.
#[unsafe(no_mangle)]
pub extern "C" fn tmdb_handshake_start(handshake: *mut FfiHandshake) -> *mut FfiHttpRequest {
    catch_unwind(AssertUnwindSafe(|| {
        if handshake.is_null() {
            return std::ptr::null_mut();
        }
        let handshake = unsafe { &mut *handshake };
        match handshake.inner.start() {
            Ok(req) => FfiHttpRequest::from_core(req),
            Err(e) => {
                tracing::debug!(error = %e, "tmdb_handshake_start refused");
                std::ptr::null_mut()
            }
        }
    }))
    .unwrap_or(std::ptr::null_mut())
}

fn advance_with(
    handshake: *mut FfiHandshake,
    outcome: Result<HttpResponse, TransportError>,
) -> *mut FfiHttpRequest {
    if handshake.is_null() {
        return std::ptr::null_mut();
    }
    let handshake = unsafe { &mut *handshake };
    match handshake.inner.advance(outcome) {
        Ok(Step::Send(req)) => FfiHttpRequest::from_core(req),
        Ok(Step::Finished(_)) | Err(_) => std::ptr::null_mut(),
    }
}

/// Feed the response to the in-flight request.
///
/// Returns the next request, or null once the handshake has finished (check
/// `tmdb_handshake_result`). Returns null without changing state if either
/// argument is null or the handshake is not awaiting a response.
#[unsafe(no_mangle)]
pub extern "C" fn tmdb_handshake_advance(
    handshake: *mut FfiHandshake,
    response: *const FfiHttpResponse,
) -> *mut FfiHttpRequest {
    catch_unwind(AssertUnwindSafe(|| {
        if response.is_null() {
            return std::ptr::null_mut();
        }
        let response = unsafe { &*response }.to_core();
        advance_with(handshake, Ok(response))
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Report that the host could not execute the in-flight request.
///
/// Always finishes the handshake; `message` may be null.
#[unsafe(no_mangle)]
pub extern "C" fn tmdb_handshake_fail_transport(
    handshake: *mut FfiHandshake,
    message: *const c_char,
) {
    let _ = catch_unwind(AssertUnwindSafe(|| {
        let message = if message.is_null() {
            "transport failure"
        } else {
            unsafe { str_arg(message) }
        };
        let next = advance_with(handshake, Err(TransportError::new(message)));
        tmdb_free_request(next);
    }));
}

/// Cancel the handshake. No-op if it already finished or `handshake` is null.
#[unsafe(no_mangle)]
pub extern "C" fn tmdb_handshake_cancel(handshake: *mut FfiHandshake) {
    let _ = catch_unwind(AssertUnwindSafe(|| {
        if handshake.is_null() {
            return;
        }
        let handshake = unsafe { &mut *handshake };
        handshake.inner.cancel();
    }));
}

/// Current state of the handshake. A null handle reads as `Failed`.
#[unsafe(no_mangle)]
pub extern "C" fn tmdb_handshake_state(handshake: *const FfiHandshake) -> FfiHandshakeState {
    catch_unwind(|| {
        if handshake.is_null() {
            return FfiHandshakeState::Failed;
        }
        let handshake = unsafe { &*handshake };
        FfiHandshakeState::from(handshake.inner.state())
    })
    .unwrap_or(FfiHandshakeState::Failed)
}

/// Terminal result of the handshake.
///
/// Returns an `InvalidState` result while the handshake is still running.
/// The caller must free the returned pointer with `tmdb_free_result`.
#[unsafe(no_mangle)]
pub extern "C" fn tmdb_handshake_result(handshake: *const FfiHandshake) -> *mut FfiLoginResult {
    catch_unwind(|| {
        if handshake.is_null() {
            return FfiLoginResult::null_arg("handshake");
        }
        let handshake = unsafe { &*handshake };
        match handshake.inner.state() {
            HandshakeState::Done(session) => FfiLoginResult::from_result(Ok(session.clone())),
            HandshakeState::Failed(err) => FfiLoginResult::from_result(Err(err.clone())),
            HandshakeState::Idle => FfiLoginResult::from_sequence_error(SequenceError::NotStarted),
            _ => FfiLoginResult::from_sequence_error(SequenceError::AlreadyStarted),
        }
    })
    .unwrap_or_else(|_| FfiLoginResult::panic("panic in tmdb_handshake_result"))
}

// ---------------------------------------------------------------------------
// Callback-driven login
// ---------------------------------------------------------------------------

/// Adapts a host send function to the core `Transport` trait.
struct CallbackTransport {
    send: TmdbSendFn,
    ctx: *mut c_void,
}

impl Transport for CallbackTransport {
    fn send(&mut self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let ffi_req = FfiHttpRequest::from_core(request.clone());
        let mut ffi_resp = FfiHttpResponse {
            status: 0,
            body: std::ptr::null(),
            body_len: 0,
        };
        let rc = (self.send)(self.ctx, ffi_req, &mut ffi_resp);
        tmdb_free_request(ffi_req);
        if rc != 0 {
            return Err(TransportError::new(format!("host transport returned {rc}")));
        }
        Ok(ffi_resp.to_core())
    }
}

/// Run the whole handshake, executing requests through `send` and
/// reporting the outcome through `on_complete` exactly once.
///
/// Returns the result's error code (`NullArg` without invoking the callback
/// if `client` is null; null strings count as empty credentials).
#[unsafe(no_mangle)]
pub extern "C" fn tmdb_login(
    client: *const FfiTmdbClient,
    username: *const c_char,
    password: *const c_char,
    send: TmdbSendFn,
    send_ctx: *mut c_void,
    on_complete: TmdbCompleteFn,
    complete_ctx: *mut c_void,
) -> FfiErrorCode {
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return FfiLoginResult::null_arg("client");
        }
        let client = unsafe { &*client };
        let username = if username.is_null() {
            ""
        } else {
            unsafe { str_arg(username) }
        };
        let password = if password.is_null() {
            ""
        } else {
            unsafe { str_arg(password) }
        };

        let transport = CallbackTransport {
            send,
            ctx: send_ctx,
        };
        let mut auth = Authenticator::new(client.inner.clone(), transport);
        let mut outcome = None;
        auth.login(username, password, |r| outcome = Some(r));
        // `login` always calls back; a missing outcome is a driver bug.
        FfiLoginResult::from_result(outcome.unwrap_or_else(|| {
            Err(LoginError::new(
                HandshakeStep::RequestToken,
                SequenceError::NotStarted,
            ))
        }))
    }))
    .unwrap_or_else(|_| {
        tracing::error!("panic caught in tmdb_login");
        FfiLoginResult::panic("panic in tmdb_login")
    });

    let code = unsafe { (*outcome).error_code };
    if code != FfiErrorCode::NullArg {
        on_complete(complete_ctx, outcome);
    }
    tmdb_free_result(outcome);
    code
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiHttpRequest` returned by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn tmdb_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let req = unsafe { Box::from_raw(req) };
        if !req.url.is_null() {
            drop(unsafe { CString::from_raw(req.url) });
        }
        if !req.headers.is_null() && req.headers_len > 0 {
            let headers = unsafe {
                Box::from_raw(std::ptr::slice_from_raw_parts_mut(
                    req.headers,
                    req.headers_len as usize,
                ))
            };
            for h in headers.iter() {
                if !h.key.is_null() {
                    drop(unsafe { CString::from_raw(h.key) });
                }
                if !h.value.is_null() {
                    drop(unsafe { CString::from_raw(h.value) });
                }
            }
        }
    });
}

/// Free an `FfiLoginResult` returned by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn tmdb_free_result(result: *mut FfiLoginResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        if !result.error_message.is_null() {
            drop(unsafe { CString::from_raw(result.error_message) });
        }
        if !result.session_id.is_null() {
            drop(unsafe { CString::from_raw(result.session_id) });
        }
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn tmdb_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { CString::from_raw(s) });
        });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
