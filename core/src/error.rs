//! Error types for the login handshake.
//!
//! # Design
//! `HandshakeError` is the per-step taxonomy: transport, HTTP status,
//! malformed JSON, service-reported failure and missing field are kept
//! apart so the reason shown to a user says which one happened. The
//! sequencer wraps it in `LoginError` together with the step that failed;
//! that pair is the `Failure` half of `HandshakeResult`.

use std::fmt;

use thiserror::Error;

use crate::http::TransportError;

/// Failure of a single handshake step.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandshakeError {
    /// The host could not reach the service.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The service answered with a non-2xx status.
    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    /// The body was not a well-formed JSON object.
    #[error("malformed response: {0}")]
    Decode(String),

    /// Well-formed JSON carrying an application-level failure.
    #[error("service error {}: {status_message}", display_code(.status_code))]
    Service {
        status_code: Option<i64>,
        status_message: String,
    },

    /// A field the step depends on was absent or had the wrong type.
    #[error("response has no `{field}` field")]
    MissingField { field: &'static str },

    /// The caller cancelled the handshake between steps.
    #[error("cancelled")]
    Cancelled,
}

fn display_code(code: &Option<i64>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "(no code)".to_string(),
    }
}

/// Rejected user input, checked before any request is issued.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialsError {
    #[error("username or password empty")]
    Empty,
}

/// Which part of the login flow a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandshakeStep {
    /// Input checks before the first request.
    Credentials,
    RequestToken,
    ValidateLogin,
    CreateSession,
    AccountId,
}

impl fmt::Display for HandshakeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            HandshakeStep::Credentials => "credentials",
            HandshakeStep::RequestToken => "request token",
            HandshakeStep::ValidateLogin => "login",
            HandshakeStep::CreateSession => "session id",
            HandshakeStep::AccountId => "user id",
        };
        f.write_str(label)
    }
}

/// Terminal failure of a login attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("login failed ({step}): {source}")]
pub struct LoginError {
    pub step: HandshakeStep,
    #[source]
    pub source: LoginErrorKind,
}

/// What went wrong: the input, one of the steps, or the driver itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoginErrorKind {
    #[error(transparent)]
    Credentials(#[from] CredentialsError),
    #[error(transparent)]
    Handshake(#[from] HandshakeError),
    /// The driver fed the state machine out of order. Always a bug.
    #[error("internal error: {0}")]
    Internal(#[from] SequenceError),
}

impl LoginError {
    pub fn new(step: HandshakeStep, source: impl Into<LoginErrorKind>) -> Self {
        Self {
            step,
            source: source.into(),
        }
    }

    /// Human-readable reason suitable for a status line.
    pub fn reason(&self) -> String {
        self.to_string()
    }

    /// The step error, if the failure came from the network flow.
    pub fn handshake_error(&self) -> Option<&HandshakeError> {
        match &self.source {
            LoginErrorKind::Handshake(e) => Some(e),
            LoginErrorKind::Credentials(_) | LoginErrorKind::Internal(_) => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.handshake_error(), Some(HandshakeError::Cancelled))
    }
}

/// Misuse of the `Handshake` state machine by its driver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequenceError {
    #[error("handshake already started")]
    AlreadyStarted,
    #[error("handshake not started")]
    NotStarted,
    #[error("handshake already finished")]
    Finished,
}

/// Missing or invalid client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    MissingVar(&'static str),
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("invalid base URL {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}
