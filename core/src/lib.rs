//! Login handshake core for The Movie Database (TMDb) v3 API.
//!
//! # Overview
//! Obtains a session for a username/password pair in four sequential
//! calls: request token, validate with login, create session, resolve the
//! account id. The core builds `HttpRequest` values and parses
//! `HttpResponse` values without touching the network (host-does-IO
//! pattern), so it stays deterministic and testable.
//!
//! # Design
//! - `TmdbClient` is stateless: it holds only the base URL and API key.
//! - `Handshake` is an explicit state machine that owns every intermediate
//!   artifact and only moves forward; the host feeds it one response at a
//!   time.
//! - `Authenticator` drives a `Handshake` over a host `Transport` and
//!   reports the single terminal `HandshakeResult` through a callback.
//! - Types use owned `String` / `Vec` fields to keep the FFI mapping simple.

pub mod client;
pub mod config;
pub mod decode;
pub mod error;
pub mod handshake;
pub mod http;
pub mod login;
pub mod types;

pub use client::TmdbClient;
pub use config::{ClientConfig, DEFAULT_BASE_URL};
pub use error::{
    ConfigError, CredentialsError, HandshakeError, HandshakeStep, LoginError, LoginErrorKind,
    SequenceError,
};
pub use handshake::{Handshake, HandshakeState, Step};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};
pub use login::{Authenticator, CancelToken};
pub use types::{Credentials, HandshakeResult, RequestToken, Session, SessionId, UserId};
