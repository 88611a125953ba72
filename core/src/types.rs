//! Login artifacts and TMDb response DTOs.
//!
//! # Design
//! Every artifact produced by the handshake is a newtype so a session id can
//! never be passed where a request token is expected. The DTOs are defined
//! independently from the mock-server crate; integration tests catch schema
//! drift between the two.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CredentialsError, HandshakeError, LoginError};

/// Username and password typed by the user.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Rejects an empty username or password before any request is made.
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, CredentialsError> {
        let username = username.into();
        let password = password.into();
        if username.is_empty() || password.is_empty() {
            return Err(CredentialsError::Empty);
        }
        Ok(Self { username, password })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Short-lived token issued by step 1, used by steps 2 and 3.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestToken(String);

impl RequestToken {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Authenticated session issued by step 3.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Numeric account id resolved by step 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a successful login hands back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: SessionId,
    pub user_id: UserId,
}

/// Outcome of one login attempt: exactly one per invocation.
pub type HandshakeResult = Result<Session, LoginError>;

/// Result type for a single step.
pub type StepResult<T> = Result<T, HandshakeError>;

// ---------------------------------------------------------------------------
// Response DTOs
//
// Each DTO names only the field its step reads. Everything else in the body
// is ignored, whatever its type.
// ---------------------------------------------------------------------------

/// `GET /authentication/token/new`
#[derive(Debug, Clone, Deserialize)]
pub struct RequestTokenResponse {
    pub request_token: String,
}

/// `GET /authentication/token/validate_with_login`
#[derive(Debug, Clone, Deserialize)]
pub struct ValidateLoginResponse {
    pub success: bool,
}

/// `GET /authentication/session/new`
#[derive(Debug, Clone, Deserialize)]
pub struct SessionResponse {
    pub session_id: String,
}

/// `GET /account`
#[derive(Debug, Clone, Deserialize)]
pub struct AccountResponse {
    pub id: u64,
}

/// The service's error envelope, present on failures.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceStatus {
    pub status_code: Option<i64>,
    #[serde(default)]
    pub status_message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_credentials_are_rejected() {
        assert_eq!(Credentials::new("", "pw"), Err(CredentialsError::Empty));
        assert_eq!(Credentials::new("user", ""), Err(CredentialsError::Empty));
        assert!(Credentials::new("user", "pw").is_ok());
    }

    #[test]
    fn debug_redacts_password() {
        let creds = Credentials::new("alice", "hunter2").unwrap();
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn session_serializes_flat() {
        let session = Session {
            session_id: SessionId::new("xyz"),
            user_id: UserId(42),
        };
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["session_id"], "xyz");
        assert_eq!(json["user_id"], 42);
    }

    #[test]
    fn response_dtos_ignore_unread_fields() {
        let parsed: RequestTokenResponse = serde_json::from_str(
            r#"{"success":true,"request_token":"abc","expires_at":1760616000}"#,
        )
        .unwrap();
        assert_eq!(parsed.request_token, "abc");

        let parsed: AccountResponse =
            serde_json::from_str(r#"{"id":548,"username":{"display":"alice"}}"#).unwrap();
        assert_eq!(parsed.id, 548);
    }
}
