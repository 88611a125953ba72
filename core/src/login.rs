//! Blocking driver for `Handshake` with a completion callback.
//!
//! `Authenticator` pairs a `TmdbClient` with a host `Transport` and runs the
//! four steps in order, suspending on each round trip. The callback is an
//! `FnOnce`, so it fires exactly once per `login` call whatever the outcome.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::client::TmdbClient;
use crate::error::{HandshakeStep, LoginError, SequenceError};
use crate::handshake::{Handshake, Step};
use crate::http::Transport;
use crate::types::{Credentials, HandshakeResult};

/// Shared flag checked between handshake steps.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Runs login handshakes over a host transport.
#[derive(Debug)]
pub struct Authenticator<T> {
    client: TmdbClient,
    transport: T,
}

impl<T: Transport> Authenticator<T> {
    pub fn new(client: TmdbClient, transport: T) -> Self {
        Self { client, transport }
    }

    pub fn client(&self) -> &TmdbClient {
        &self.client
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Log in and report the outcome through `on_complete`.
    pub fn login<F>(&mut self, username: &str, password: &str, on_complete: F)
    where
        F: FnOnce(HandshakeResult),
    {
        self.login_with_cancel(username, password, &CancelToken::new(), on_complete);
    }

    /// Like `login`, but stops before the next step once `cancel` fires.
    pub fn login_with_cancel<F>(
        &mut self,
        username: &str,
        password: &str,
        cancel: &CancelToken,
        on_complete: F,
    ) where
        F: FnOnce(HandshakeResult),
    {
        let result = match Credentials::new(username, password) {
            Ok(credentials) => self.run(credentials, cancel),
            Err(e) => {
                tracing::debug!("rejected login with empty credentials");
                Err(LoginError::new(HandshakeStep::Credentials, e))
            }
        };
        on_complete(result);
    }

    /// Run the handshake to completion and return its result.
    pub fn authenticate(&mut self, credentials: Credentials) -> HandshakeResult {
        self.run(credentials, &CancelToken::new())
    }

    fn run(&mut self, credentials: Credentials, cancel: &CancelToken) -> HandshakeResult {
        let mut handshake = Handshake::new(self.client.clone(), credentials);
        let mut request = match handshake.start() {
            Ok(request) => request,
            Err(e) => return Err(sequence_bug(handshake.step(), e)),
        };
        loop {
            if cancel.is_cancelled() {
                return match handshake.cancel() {
                    Some(result) => result,
                    None => {
                        let step = handshake.step();
                        handshake
                            .into_result()
                            .unwrap_or_else(|| Err(sequence_bug(step, SequenceError::Finished)))
                    }
                };
            }
            let outcome = self.transport.send(&request);
            match handshake.advance(outcome) {
                Ok(Step::Send(next)) => request = next,
                Ok(Step::Finished(result)) => return result,
                Err(e) => return Err(sequence_bug(handshake.step(), e)),
            }
        }
    }
}

/// The driver above never misuses the machine. If it ever does, report an
/// internal error instead of panicking.
fn sequence_bug(step: Option<HandshakeStep>, e: SequenceError) -> LoginError {
    tracing::error!(error = %e, "login driver misused the handshake");
    LoginError::new(step.unwrap_or(HandshakeStep::RequestToken), e)
}
