//! The four-step login handshake as an explicit state machine.
//!
//! # Design
//! `Handshake` owns every intermediate artifact (credentials, request token,
//! session id) and threads them forward itself; nothing is shared with the
//! caller until the terminal `Session` is produced. The driver hands each
//! network outcome to `advance`, which either yields the next request or
//! the final `HandshakeResult`. At most one request is in flight and the
//! state only ever moves forward.
//!
//! ```text
//! Idle -> AwaitingToken -> AwaitingValidation -> AwaitingSession
//!      -> AwaitingUserId -> Done | Failed
//! ```

use std::mem;

use crate::client::TmdbClient;
use crate::error::{HandshakeError, HandshakeStep, LoginError, SequenceError};
use crate::http::{HttpRequest, HttpResponse, TransportError};
use crate::types::{Credentials, HandshakeResult, RequestToken, Session, SessionId};

/// Where the handshake is. Non-terminal states name the response awaited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeState {
    Idle,
    AwaitingToken,
    AwaitingValidation { request_token: RequestToken },
    AwaitingSession { request_token: RequestToken },
    AwaitingUserId { session_id: SessionId },
    Done(Session),
    Failed(LoginError),
}

impl HandshakeState {
    /// The step whose response is awaited, if any.
    pub fn step(&self) -> Option<HandshakeStep> {
        match self {
            HandshakeState::AwaitingToken => Some(HandshakeStep::RequestToken),
            HandshakeState::AwaitingValidation { .. } => Some(HandshakeStep::ValidateLogin),
            HandshakeState::AwaitingSession { .. } => Some(HandshakeStep::CreateSession),
            HandshakeState::AwaitingUserId { .. } => Some(HandshakeStep::AccountId),
            HandshakeState::Idle | HandshakeState::Done(_) | HandshakeState::Failed(_) => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, HandshakeState::Done(_) | HandshakeState::Failed(_))
    }

    pub fn request_token(&self) -> Option<&RequestToken> {
        match self {
            HandshakeState::AwaitingValidation { request_token }
            | HandshakeState::AwaitingSession { request_token } => Some(request_token),
            _ => None,
        }
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        match self {
            HandshakeState::AwaitingUserId { session_id } => Some(session_id),
            HandshakeState::Done(session) => Some(&session.session_id),
            _ => None,
        }
    }
}

/// What the driver should do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Execute this request and feed its outcome back into `advance`.
    Send(HttpRequest),
    /// The handshake is over.
    Finished(HandshakeResult),
}

/// One login attempt against one client.
#[derive(Debug)]
pub struct Handshake {
    client: TmdbClient,
    credentials: Option<Credentials>,
    state: HandshakeState,
}

impl Handshake {
    pub fn new(client: TmdbClient, credentials: Credentials) -> Self {
        Self {
            client,
            credentials: Some(credentials),
            state: HandshakeState::Idle,
        }
    }

    pub fn state(&self) -> &HandshakeState {
        &self.state
    }

    /// The step whose response is awaited, if any.
    pub fn step(&self) -> Option<HandshakeStep> {
        self.state.step()
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_terminal()
    }

    /// The terminal result, or `None` while the handshake is still running.
    pub fn into_result(self) -> Option<HandshakeResult> {
        match self.state {
            HandshakeState::Done(session) => Some(Ok(session)),
            HandshakeState::Failed(err) => Some(Err(err)),
            _ => None,
        }
    }

    /// Issue the request-token call.
    pub fn start(&mut self) -> Result<HttpRequest, SequenceError> {
        match self.state {
            HandshakeState::Idle => {}
            HandshakeState::Done(_) | HandshakeState::Failed(_) => {
                return Err(SequenceError::Finished)
            }
            _ => return Err(SequenceError::AlreadyStarted),
        }
        tracing::debug!(step = %HandshakeStep::RequestToken, "starting login handshake");
        self.state = HandshakeState::AwaitingToken;
        Ok(self.client.build_request_token())
    }

    /// Feed the outcome of the in-flight request.
    pub fn advance(
        &mut self,
        outcome: Result<HttpResponse, TransportError>,
    ) -> Result<Step, SequenceError> {
        let state = mem::replace(&mut self.state, HandshakeState::Idle);
        let Some(step) = state.step() else {
            let misuse = match state {
                HandshakeState::Idle => SequenceError::NotStarted,
                _ => SequenceError::Finished,
            };
            self.state = state;
            return Err(misuse);
        };

        let transition = match state {
            HandshakeState::AwaitingValidation { request_token } => {
                self.on_validated(request_token, outcome)
            }
            // The token is spent once the session exists.
            HandshakeState::AwaitingSession { .. } => self.on_session(outcome),
            HandshakeState::AwaitingUserId { session_id } => self.on_account(session_id, outcome),
            // Only `AwaitingToken` is left at this point.
            _ => self.on_request_token(outcome),
        };

        match transition {
            Ok((next, action)) => {
                if let Step::Send(request) = &action {
                    tracing::debug!(
                        step = ?next.step(),
                        url = request.redacted_url(),
                        "advancing login handshake"
                    );
                }
                self.state = next;
                Ok(action)
            }
            Err(e) => Ok(self.fail(step, e)),
        }
    }

    /// Short-circuit to `Failed` with a cancellation reason. No-op once the
    /// handshake is finished.
    pub fn cancel(&mut self) -> Option<HandshakeResult> {
        if self.state.is_terminal() {
            return None;
        }
        let step = self.step().unwrap_or(HandshakeStep::RequestToken);
        match self.fail(step, HandshakeError::Cancelled) {
            Step::Finished(result) => Some(result),
            Step::Send(_) => None,
        }
    }

    fn on_request_token(
        &mut self,
        outcome: Result<HttpResponse, TransportError>,
    ) -> Result<(HandshakeState, Step), HandshakeError> {
        let request_token = self.client.parse_request_token(outcome?)?;
        // Credentials are only needed for validation; drop them right after.
        let credentials = self
            .credentials
            .take()
            .ok_or(HandshakeError::MissingField { field: "credentials" })?;
        let request = self.client.build_validate_login(&request_token, &credentials);
        Ok((
            HandshakeState::AwaitingValidation { request_token },
            Step::Send(request),
        ))
    }

    fn on_validated(
        &self,
        request_token: RequestToken,
        outcome: Result<HttpResponse, TransportError>,
    ) -> Result<(HandshakeState, Step), HandshakeError> {
        self.client.parse_validate_login(outcome?)?;
        let request = self.client.build_create_session(&request_token);
        Ok((
            HandshakeState::AwaitingSession { request_token },
            Step::Send(request),
        ))
    }

    fn on_session(
        &self,
        outcome: Result<HttpResponse, TransportError>,
    ) -> Result<(HandshakeState, Step), HandshakeError> {
        let session_id = self.client.parse_create_session(outcome?)?;
        let request = self.client.build_account(&session_id);
        Ok((HandshakeState::AwaitingUserId { session_id }, Step::Send(request)))
    }

    fn on_account(
        &self,
        session_id: SessionId,
        outcome: Result<HttpResponse, TransportError>,
    ) -> Result<(HandshakeState, Step), HandshakeError> {
        let user_id = self.client.parse_account(outcome?)?;
        let session = Session {
            session_id,
            user_id,
        };
        tracing::info!(user_id = %session.user_id, "login handshake complete");
        Ok((
            HandshakeState::Done(session.clone()),
            Step::Finished(Ok(session)),
        ))
    }

    fn fail(&mut self, step: HandshakeStep, error: HandshakeError) -> Step {
        let err = LoginError::new(step, error);
        tracing::warn!(%step, error = %err, "login handshake failed");
        self.credentials = None;
        self.state = HandshakeState::Failed(err.clone());
        Step::Finished(Err(err))
    }
}
