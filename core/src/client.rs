//! Stateless HTTP request builder and response parser for the TMDb
//! authentication endpoints.
//!
//! # Design
//! `TmdbClient` holds only the base URL and the API key. Each handshake step
//! is split into a `build_*` method that produces an `HttpRequest` and a
//! `parse_*` method that consumes an `HttpResponse`. The caller executes the
//! HTTP round trip in between, so this module stays deterministic and free
//! of I/O.
//!
//! Every `parse_*` applies the same checks in order: non-2xx status, body
//! that is not a JSON object, the step's expected field, then the service's
//! `status_code` envelope, and finally a missing-field error.

use url::form_urlencoded;

use crate::config::ClientConfig;
use crate::decode::{decode_object, extract, status_of, JsonObject};
use crate::error::HandshakeError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{
    AccountResponse, Credentials, RequestToken, RequestTokenResponse, SessionId, SessionResponse,
    StepResult, UserId, ValidateLoginResponse,
};

pub const REQUEST_TOKEN_PATH: &str = "/authentication/token/new";
pub const VALIDATE_LOGIN_PATH: &str = "/authentication/token/validate_with_login";
pub const CREATE_SESSION_PATH: &str = "/authentication/session/new";
pub const ACCOUNT_PATH: &str = "/account";

/// Longest body excerpt carried in an `HttpStatus` message, in characters.
pub const MAX_ERROR_BODY_CHARS: usize = 200;

/// Synchronous, stateless client for the TMDb login endpoints.
#[derive(Debug, Clone)]
pub struct TmdbClient {
    base_url: String,
    api_key: String,
}

impl TmdbClient {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(&config.base_url, &config.api_key)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get(&self, path: &str, params: &[(&str, &str)]) -> HttpRequest {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("api_key", &self.api_key)
            .extend_pairs(params)
            .finish();
        HttpRequest {
            method: HttpMethod::Get,
            url: format!("{}{path}?{query}", self.base_url),
            headers: vec![("accept".to_string(), "application/json".to_string())],
        }
    }

    // --- step 1 ---

    pub fn build_request_token(&self) -> HttpRequest {
        self.get(REQUEST_TOKEN_PATH, &[])
    }

    pub fn parse_request_token(&self, response: HttpResponse) -> StepResult<RequestToken> {
        let object = decode_success(&response)?;
        match extract::<RequestTokenResponse>(&object) {
            Some(body) => Ok(RequestToken::new(body.request_token)),
            None => Err(missing(&object, "request_token")),
        }
    }

    // --- step 2 ---

    pub fn build_validate_login(&self, token: &RequestToken, credentials: &Credentials) -> HttpRequest {
        self.get(
            VALIDATE_LOGIN_PATH,
            &[
                ("request_token", token.as_str()),
                ("username", credentials.username()),
                ("password", credentials.password()),
            ],
        )
    }

    /// Succeeds only on `"success": true`. The token is not reissued here;
    /// the caller keeps using the one from step 1.
    pub fn parse_validate_login(&self, response: HttpResponse) -> StepResult<()> {
        let object = decode_success(&response)?;
        match extract::<ValidateLoginResponse>(&object) {
            Some(ValidateLoginResponse { success: true }) => Ok(()),
            Some(ValidateLoginResponse { success: false }) => {
                Err(service_error(&object).unwrap_or_else(|| HandshakeError::Service {
                    status_code: None,
                    status_message: "validation rejected".to_string(),
                }))
            }
            None => Err(missing(&object, "success")),
        }
    }

    // --- step 3 ---

    pub fn build_create_session(&self, token: &RequestToken) -> HttpRequest {
        self.get(CREATE_SESSION_PATH, &[("request_token", token.as_str())])
    }

    pub fn parse_create_session(&self, response: HttpResponse) -> StepResult<SessionId> {
        let object = decode_success(&response)?;
        match extract::<SessionResponse>(&object) {
            Some(body) => Ok(SessionId::new(body.session_id)),
            None => Err(missing(&object, "session_id")),
        }
    }

    // --- step 4 ---

    pub fn build_account(&self, session_id: &SessionId) -> HttpRequest {
        self.get(ACCOUNT_PATH, &[("session_id", session_id.as_str())])
    }

    pub fn parse_account(&self, response: HttpResponse) -> StepResult<UserId> {
        let object = decode_success(&response)?;
        match extract::<AccountResponse>(&object) {
            Some(body) => Ok(UserId(body.id)),
            None => Err(missing(&object, "id")),
        }
    }
}

/// Reject non-2xx responses, then decode the body as a JSON object.
fn decode_success(response: &HttpResponse) -> StepResult<JsonObject> {
    if !response.is_success() {
        return Err(status_error(response));
    }
    decode_object(&response.body)
}

/// Map a non-2xx response to `HttpStatus`, preferring the service message.
fn status_error(response: &HttpResponse) -> HandshakeError {
    let message = decode_object(&response.body)
        .ok()
        .and_then(|object| status_of(&object))
        .and_then(|status| status.status_message)
        .unwrap_or_else(|| body_excerpt(&response.body_text()));
    HandshakeError::HttpStatus {
        status: response.status,
        message,
    }
}

/// Trimmed body text, cut to `MAX_ERROR_BODY_CHARS` on a char boundary.
fn body_excerpt(text: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        return "empty body".to_string();
    }
    match text.char_indices().nth(MAX_ERROR_BODY_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

fn service_error(object: &JsonObject) -> Option<HandshakeError> {
    status_of(object).map(|status| HandshakeError::Service {
        status_code: status.status_code,
        status_message: status.status_message.unwrap_or_default(),
    })
}

fn missing(object: &JsonObject, field: &'static str) -> HandshakeError {
    service_error(object).unwrap_or(HandshakeError::MissingField { field })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> TmdbClient {
        TmdbClient::new("http://localhost:3000", "test-key")
    }

    fn credentials() -> Credentials {
        Credentials::new("alice", "p@ss word&").unwrap()
    }

    #[test]
    fn build_request_token_produces_correct_request() {
        let req = client().build_request_token();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(
            req.url,
            "http://localhost:3000/authentication/token/new?api_key=test-key"
        );
        assert_eq!(
            req.headers,
            vec![("accept".to_string(), "application/json".to_string())]
        );
    }

    #[test]
    fn build_validate_login_encodes_credentials() {
        let token = RequestToken::new("abc");
        let req = client().build_validate_login(&token, &credentials());
        assert_eq!(
            req.url,
            "http://localhost:3000/authentication/token/validate_with_login\
             ?api_key=test-key&request_token=abc&username=alice&password=p%40ss+word%26"
        );
    }

    #[test]
    fn build_create_session_reuses_token() {
        let token = RequestToken::new("abc");
        let req = client().build_create_session(&token);
        assert_eq!(
            req.url,
            "http://localhost:3000/authentication/session/new?api_key=test-key&request_token=abc"
        );
    }

    #[test]
    fn build_account_carries_session() {
        let req = client().build_account(&SessionId::new("xyz"));
        assert_eq!(
            req.url,
            "http://localhost:3000/account?api_key=test-key&session_id=xyz"
        );
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let client = TmdbClient::new("http://localhost:3000/", "k");
        let req = client.build_request_token();
        assert_eq!(req.url, "http://localhost:3000/authentication/token/new?api_key=k");
    }

    #[test]
    fn parse_request_token_success() {
        let resp = HttpResponse::new(200, r#"{"success":true,"request_token":"abc"}"#);
        let token = client().parse_request_token(resp).unwrap();
        assert_eq!(token.as_str(), "abc");
    }

    #[test]
    fn parse_request_token_ignores_unread_fields() {
        let resp = HttpResponse::new(
            200,
            r#"{"success":true,"request_token":"abc","expires_at":1760616000}"#,
        );
        let token = client().parse_request_token(resp).unwrap();
        assert_eq!(token.as_str(), "abc");
    }

    #[test]
    fn parse_request_token_missing_field() {
        let resp = HttpResponse::new(200, r#"{"success":true}"#);
        let err = client().parse_request_token(resp).unwrap_err();
        assert_eq!(err, HandshakeError::MissingField { field: "request_token" });
    }

    #[test]
    fn parse_request_token_wrong_type_is_missing() {
        let resp = HttpResponse::new(200, r#"{"request_token":17}"#);
        let err = client().parse_request_token(resp).unwrap_err();
        assert_eq!(err, HandshakeError::MissingField { field: "request_token" });
    }

    #[test]
    fn non_2xx_uses_service_message() {
        let resp = HttpResponse::new(
            401,
            r#"{"success":false,"status_code":7,"status_message":"Invalid API key: You must be granted a valid key."}"#,
        );
        let err = client().parse_request_token(resp).unwrap_err();
        assert_eq!(
            err,
            HandshakeError::HttpStatus {
                status: 401,
                message: "Invalid API key: You must be granted a valid key.".to_string(),
            }
        );
    }

    #[test]
    fn non_2xx_falls_back_to_body_text() {
        let err = client()
            .parse_create_session(HttpResponse::new(502, "Bad Gateway\n"))
            .unwrap_err();
        assert_eq!(
            err,
            HandshakeError::HttpStatus {
                status: 502,
                message: "Bad Gateway".to_string(),
            }
        );

        let err = client().parse_account(HttpResponse::new(500, "")).unwrap_err();
        assert_eq!(
            err,
            HandshakeError::HttpStatus {
                status: 500,
                message: "empty body".to_string(),
            }
        );
    }

    #[test]
    fn non_2xx_body_text_is_truncated() {
        let page = format!("<html><body>{}</body></html>", "é".repeat(500));
        let err = client()
            .parse_request_token(HttpResponse::new(503, page.clone()))
            .unwrap_err();
        let (status, message) = match err {
            HandshakeError::HttpStatus { status, message } => (status, message),
            other => panic!("expected HttpStatus, got {other:?}"),
        };
        assert_eq!(status, 503);
        assert_eq!(message.chars().count(), MAX_ERROR_BODY_CHARS + 3);
        assert!(message.ends_with("..."));
        assert!(page.starts_with(message.trim_end_matches("...")));
    }

    #[test]
    fn parse_validate_login_success() {
        let resp = HttpResponse::new(200, r#"{"success":true,"request_token":"abc"}"#);
        assert!(client().parse_validate_login(resp).is_ok());
    }

    #[test]
    fn parse_validate_login_false_is_rejected() {
        let resp = HttpResponse::new(200, r#"{"success":false}"#);
        let err = client().parse_validate_login(resp).unwrap_err();
        assert_eq!(
            err,
            HandshakeError::Service {
                status_code: None,
                status_message: "validation rejected".to_string(),
            }
        );
    }

    #[test]
    fn parse_validate_login_false_carries_status() {
        let resp = HttpResponse::new(
            200,
            r#"{"success":false,"status_code":30,"status_message":"Invalid username and/or password: You did not provide a valid login."}"#,
        );
        let err = client().parse_validate_login(resp).unwrap_err();
        assert!(matches!(
            err,
            HandshakeError::Service {
                status_code: Some(30),
                ..
            }
        ));
    }

    #[test]
    fn parse_validate_login_missing_success() {
        let resp = HttpResponse::new(200, r#"{"request_token":"abc"}"#);
        let err = client().parse_validate_login(resp).unwrap_err();
        assert_eq!(err, HandshakeError::MissingField { field: "success" });
    }

    #[test]
    fn parse_create_session_success() {
        let resp = HttpResponse::new(200, r#"{"success":true,"session_id":"xyz"}"#);
        let session = client().parse_create_session(resp).unwrap();
        assert_eq!(session.as_str(), "xyz");
    }

    #[test]
    fn parse_create_session_service_error() {
        let resp = HttpResponse::new(200, r#"{"status_code":17,"status_message":"Session denied."}"#);
        let err = client().parse_create_session(resp).unwrap_err();
        assert_eq!(
            err,
            HandshakeError::Service {
                status_code: Some(17),
                status_message: "Session denied.".to_string(),
            }
        );
    }

    #[test]
    fn parse_account_success() {
        let resp = HttpResponse::new(200, r#"{"id":548,"username":"alice"}"#);
        assert_eq!(client().parse_account(resp).unwrap(), UserId(548));
    }

    #[test]
    fn parse_account_ignores_unread_fields() {
        let resp = HttpResponse::new(200, r#"{"id":548,"username":{"display":"alice"}}"#);
        assert_eq!(client().parse_account(resp).unwrap(), UserId(548));
    }

    #[test]
    fn parse_account_rejects_non_integer_id() {
        let resp = HttpResponse::new(200, r#"{"id":"548"}"#);
        let err = client().parse_account(resp).unwrap_err();
        assert_eq!(err, HandshakeError::MissingField { field: "id" });
    }

    #[test]
    fn parse_bad_json() {
        let resp = HttpResponse::new(200, "not json");
        let err = client().parse_create_session(resp).unwrap_err();
        assert!(matches!(err, HandshakeError::Decode(_)));
    }
}
