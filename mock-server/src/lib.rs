use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

/// The single account the mock knows about.
#[derive(Clone, Debug)]
pub struct MockConfig {
    pub api_key: String,
    pub username: String,
    pub password: String,
    pub account_id: u64,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            api_key: "test-api-key".to_string(),
            username: "moviefan".to_string(),
            password: "popcorn".to_string(),
            account_id: 548,
        }
    }
}

impl MockConfig {
    /// Defaults overridden by `TMDB_MOCK_API_KEY`, `TMDB_MOCK_USERNAME`,
    /// `TMDB_MOCK_PASSWORD`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: std::env::var("TMDB_MOCK_API_KEY").unwrap_or(defaults.api_key),
            username: std::env::var("TMDB_MOCK_USERNAME").unwrap_or(defaults.username),
            password: std::env::var("TMDB_MOCK_PASSWORD").unwrap_or(defaults.password),
            account_id: defaults.account_id,
        }
    }
}

#[derive(Debug, Default)]
pub struct Sessions {
    /// Issued request tokens, mapped to whether they passed validation.
    tokens: HashMap<String, bool>,
    sessions: HashSet<String>,
}

#[derive(Clone)]
pub struct AppState {
    config: Arc<MockConfig>,
    db: Arc<RwLock<Sessions>>,
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenBody {
    pub success: bool,
    pub expires_at: String,
    pub request_token: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionBody {
    pub success: bool,
    pub session_id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccountBody {
    pub id: u64,
    pub username: String,
    pub name: String,
    pub include_adult: bool,
    pub iso_639_1: String,
    pub iso_3166_1: String,
}

/// TMDb's error envelope.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusBody {
    pub success: bool,
    pub status_code: i64,
    pub status_message: String,
}

#[derive(Debug, Deserialize)]
pub struct AuthQuery {
    pub api_key: Option<String>,
    pub request_token: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub session_id: Option<String>,
}

/// Failures with their TMDb status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockError {
    AuthenticationFailed,
    InvalidParameters,
    InvalidApiKey,
    SessionDenied,
    InvalidLogin,
    InvalidRequestToken,
}

impl MockError {
    pub fn status_code(self) -> i64 {
        match self {
            MockError::AuthenticationFailed => 3,
            MockError::InvalidParameters => 5,
            MockError::InvalidApiKey => 7,
            MockError::SessionDenied => 17,
            MockError::InvalidLogin => 30,
            MockError::InvalidRequestToken => 33,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            MockError::AuthenticationFailed => {
                "Authentication failed: You do not have permissions to access the service."
            }
            MockError::InvalidParameters => "Invalid parameters: Your request parameters are incorrect.",
            MockError::InvalidApiKey => "Invalid API key: You must be granted a valid key.",
            MockError::SessionDenied => "Session denied.",
            MockError::InvalidLogin => {
                "Invalid username and/or password: You did not provide a valid login."
            }
            MockError::InvalidRequestToken => {
                "Invalid request token: The request token is either expired or invalid."
            }
        }
    }

    fn http_status(self) -> StatusCode {
        match self {
            MockError::InvalidParameters => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for MockError {
    fn into_response(self) -> Response {
        let body = StatusBody {
            success: false,
            status_code: self.status_code(),
            status_message: self.message().to_string(),
        };
        (self.http_status(), Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn app() -> Router {
    app_with(MockConfig::default())
}

pub fn app_with(config: MockConfig) -> Router {
    let state = AppState {
        config: Arc::new(config),
        db: Arc::new(RwLock::new(Sessions::default())),
    };
    Router::new()
        .route("/authentication/token/new", get(new_token))
        .route(
            "/authentication/token/validate_with_login",
            get(validate_with_login),
        )
        .route("/authentication/session/new", get(new_session))
        .route("/account", get(account))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with(listener, MockConfig::default()).await
}

pub async fn run_with(listener: TcpListener, config: MockConfig) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(config)).await
}

fn check_api_key(config: &MockConfig, query: &AuthQuery) -> Result<(), MockError> {
    match query.api_key.as_deref() {
        Some(key) if key == config.api_key => Ok(()),
        _ => Err(MockError::InvalidApiKey),
    }
}

fn required(value: &Option<String>) -> Result<&str, MockError> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or(MockError::InvalidParameters)
}

fn expires_at() -> String {
    "2099-01-01 00:00:00 UTC".to_string()
}

async fn new_token(
    State(state): State<AppState>,
    Query(query): Query<AuthQuery>,
) -> Result<Json<TokenBody>, MockError> {
    check_api_key(&state.config, &query)?;
    let token = Uuid::new_v4().simple().to_string();
    state.db.write().await.tokens.insert(token.clone(), false);
    tracing::debug!("issued request token");
    Ok(Json(TokenBody {
        success: true,
        expires_at: expires_at(),
        request_token: token,
    }))
}

async fn validate_with_login(
    State(state): State<AppState>,
    Query(query): Query<AuthQuery>,
) -> Result<Json<TokenBody>, MockError> {
    check_api_key(&state.config, &query)?;
    let token = required(&query.request_token)?;
    let username = required(&query.username)?;
    let password = required(&query.password)?;

    let mut db = state.db.write().await;
    let validated = db
        .tokens
        .get_mut(token)
        .ok_or(MockError::InvalidRequestToken)?;
    if username != state.config.username || password != state.config.password {
        tracing::debug!(username, "rejected login");
        return Err(MockError::InvalidLogin);
    }
    *validated = true;
    Ok(Json(TokenBody {
        success: true,
        expires_at: expires_at(),
        request_token: token.to_string(),
    }))
}

async fn new_session(
    State(state): State<AppState>,
    Query(query): Query<AuthQuery>,
) -> Result<Json<SessionBody>, MockError> {
    check_api_key(&state.config, &query)?;
    let token = required(&query.request_token)?;

    let mut db = state.db.write().await;
    match db.tokens.get(token) {
        None => return Err(MockError::InvalidRequestToken),
        Some(false) => return Err(MockError::SessionDenied),
        Some(true) => {}
    }
    // A token is good for exactly one session.
    db.tokens.remove(token);
    let session_id = Uuid::new_v4().simple().to_string();
    db.sessions.insert(session_id.clone());
    Ok(Json(SessionBody {
        success: true,
        session_id,
    }))
}

async fn account(
    State(state): State<AppState>,
    Query(query): Query<AuthQuery>,
) -> Result<Json<AccountBody>, MockError> {
    check_api_key(&state.config, &query)?;
    let session_id = required(&query.session_id).map_err(|_| MockError::AuthenticationFailed)?;
    if !state.db.read().await.sessions.contains(session_id) {
        return Err(MockError::AuthenticationFailed);
    }
    Ok(Json(AccountBody {
        id: state.config.account_id,
        username: state.config.username.clone(),
        name: String::new(),
        include_adult: false,
        iso_639_1: "en".to_string(),
        iso_3166_1: "US".to_string(),
    }))
}
