/*
[INPUT]:  Auth state machine snapshots
[OUTPUT]: Read-only session projection for consumers (token, message, phase)
[POS]:    Auth layer - consumer-facing session state
[UPDATE]: When consumers need new derived session fields
*/

use chrono::{DateTime, Utc};

use crate::types::AuthToken;

/// Conceptual position of the bootstrap sequence
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthPhase {
    /// No wallet identity yet
    #[default]
    Init,
    /// Identity known, waiting for the engine's session/challenge answer
    AwaitingChallenge,
    /// Engine answered with neither token nor message
    Stalled,
    /// Challenge received, waiting for the wallet signature
    Challenged,
    /// Challenge signed, waiting for the token exchange
    Signed,
    Authenticated,
    /// An action failed; only an explicit retry moves on
    Failed,
}

impl AuthPhase {
    /// Phases that do not progress without outside input
    pub fn is_settled(self) -> bool {
        matches!(
            self,
            AuthPhase::Authenticated | AuthPhase::Failed | AuthPhase::Stalled
        )
    }
}

/// Which action a failure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    Session,
    Signing,
    Exchange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthFailure {
    pub stage: FailureStage,
    pub reason: String,
}

/// Progress of the best-effort refresh token registration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RegistrationState {
    #[default]
    Idle,
    Pending,
    Registered,
    Failed,
}

/// Snapshot published to consumers after every state change
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    pub token: Option<AuthToken>,
    pub message: Option<String>,
    pub phase: AuthPhase,
    pub failure: Option<AuthFailure>,
    pub registration: RegistrationState,
    pub authenticated_at: Option<DateTime<Utc>>,
    /// Number of explicit retries so far
    pub attempt: u32,
}

impl SessionContext {
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.token.as_ref().map(|token| token.access_token.as_str())
    }

    /// Expiry derived from `expires_in`; never acted on
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.token.as_ref()?.expires_at(self.authenticated_at?)
    }

    /// Check if token is past its advertised lifetime
    pub fn is_token_expired(&self) -> bool {
        match self.expires_at() {
            Some(expires_at) => Utc::now() > expires_at,
            None => false,
        }
    }
}
