/*
[INPUT]:  AuthEvent (identity, engine responses, wallet results, retry)
[OUTPUT]: Next Effects to run and a SessionContext projection
[POS]:    Auth layer - level-triggered session bootstrap state machine
[UPDATE]: When guards, failure policy, or bootstrap steps change
*/

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::auth::AuthorizationCode;
use crate::auth::context::{
    AuthFailure, AuthPhase, FailureStage, RegistrationState, SessionContext,
};
use crate::types::{AuthToken, SessionOutcome, SessionResponse, WalletIdentity};

/// Inputs consumed by the machine
///
/// Result events carry the input they answer so late answers to a superseded
/// request can be recognized and dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    IdentityKnown(WalletIdentity),
    SessionFetched {
        identity: WalletIdentity,
        response: SessionResponse,
    },
    SessionFetchFailed {
        identity: WalletIdentity,
        reason: String,
    },
    Signed {
        message: String,
        signature: String,
    },
    SigningFailed {
        message: String,
        reason: String,
    },
    TokenIssued {
        code: AuthorizationCode,
        token: AuthToken,
    },
    TokenExchangeFailed {
        code: AuthorizationCode,
        reason: String,
    },
    SessionRegistered {
        refresh_token: String,
    },
    SessionRegisterFailed {
        refresh_token: String,
        reason: String,
    },
    /// Explicit user request to start over from a fresh challenge
    Retry,
}

/// Side effects the owner must run; each answers with exactly one AuthEvent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchSession(WalletIdentity),
    Sign(String),
    ExchangeCode(AuthorizationCode),
    RegisterSession(String),
}

impl Effect {
    pub fn name(&self) -> &'static str {
        match self {
            Effect::FetchSession(_) => "fetch_session",
            Effect::Sign(_) => "sign",
            Effect::ExchangeCode(_) => "exchange_code",
            Effect::RegisterSession(_) => "register_session",
        }
    }
}

#[derive(Debug, Default)]
struct InFlight {
    session: bool,
    sign: bool,
    exchange: bool,
}

/// Session bootstrap state machine
///
/// Owns `(message, signature, token)`. After every event all four guarded
/// actions are re-evaluated; an action fires when its guard holds, it is not
/// already in flight, and it has not already run for the same input.
///
/// ```text
/// Init ──identity──▶ AwaitingChallenge ──message──▶ Challenged ──signature──▶ Signed
///                          │  │                          │                       │
///                          │  └──empty──▶ Stalled        │ reject                │ exchange error
///                          │ token                       ▼                       ▼
///                          └────────────▶ Authenticated  Failed ◀────────────────┘
///                                              ▲           │ retry
///                                              │           └──▶ AwaitingChallenge
///                                  Signed ─────┘ token
/// ```
#[derive(Debug, Default)]
pub struct AuthStateMachine {
    identity: Option<WalletIdentity>,
    message: Option<String>,
    signature: Option<String>,
    token: Option<AuthToken>,
    authenticated_at: Option<DateTime<Utc>>,
    failure: Option<AuthFailure>,
    in_flight: InFlight,
    session_attempted: bool,
    signed_message: Option<String>,
    exchanged_code: Option<AuthorizationCode>,
    registered_refresh_token: Option<String>,
    registration: RegistrationState,
    attempt: u32,
}

impl AuthStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an event, then return the effects whose guards newly hold
    pub fn handle(&mut self, event: AuthEvent) -> Vec<Effect> {
        self.apply(event);
        self.evaluate()
    }

    pub fn identity(&self) -> Option<&WalletIdentity> {
        self.identity.as_ref()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    pub fn token(&self) -> Option<&AuthToken> {
        self.token.as_ref()
    }

    pub fn failure(&self) -> Option<&AuthFailure> {
        self.failure.as_ref()
    }

    /// Authorization code; defined iff message and signature are set and token is not
    pub fn code(&self) -> Option<AuthorizationCode> {
        if self.token.is_some() {
            return None;
        }
        let (message, signature) = (self.message.as_deref()?, self.signature.as_deref()?);
        AuthorizationCode::encode(message, signature).ok()
    }

    pub fn phase(&self) -> AuthPhase {
        if self.failure.is_some() {
            AuthPhase::Failed
        } else if self.token.is_some() {
            AuthPhase::Authenticated
        } else if self.identity.is_none() {
            AuthPhase::Init
        } else if self.message.is_some() && self.signature.is_some() {
            AuthPhase::Signed
        } else if self.message.is_some() {
            AuthPhase::Challenged
        } else if self.session_attempted && !self.in_flight.session {
            AuthPhase::Stalled
        } else {
            AuthPhase::AwaitingChallenge
        }
    }

    pub fn context(&self) -> SessionContext {
        SessionContext {
            token: self.token.clone(),
            message: self.message.clone(),
            phase: self.phase(),
            failure: self.failure.clone(),
            registration: self.registration,
            authenticated_at: self.authenticated_at,
            attempt: self.attempt,
        }
    }

    fn apply(&mut self, event: AuthEvent) {
        match event {
            AuthEvent::IdentityKnown(identity) => {
                if let Some(current) = &self.identity {
                    if *current != identity {
                        warn!(%current, ignored = %identity, "identity is fixed for the session");
                    }
                    return;
                }
                info!(%identity, "wallet identity known");
                self.identity = Some(identity);
            }
            AuthEvent::SessionFetched { identity, response } => {
                if !self.in_flight.session || self.identity.as_ref() != Some(&identity) {
                    debug!(%identity, "dropping stale session response");
                    return;
                }
                self.in_flight.session = false;
                match response.into_outcome() {
                    SessionOutcome::Token(token) => {
                        info!("engine recognized existing session");
                        self.set_token(token);
                    }
                    SessionOutcome::Challenge(message) => {
                        debug!("challenge received");
                        self.message = Some(message);
                    }
                    SessionOutcome::Empty => {
                        warn!(%identity, "session response carried neither token nor message");
                    }
                }
            }
            AuthEvent::SessionFetchFailed { identity, reason } => {
                if !self.in_flight.session || self.identity.as_ref() != Some(&identity) {
                    debug!(%identity, "dropping stale session failure");
                    return;
                }
                self.in_flight.session = false;
                self.fail(FailureStage::Session, reason);
            }
            AuthEvent::Signed { message, signature } => {
                if !self.answers_sign(&message) {
                    debug!("dropping stale signature");
                    return;
                }
                self.in_flight.sign = false;
                if signature.trim().is_empty() {
                    warn!("wallet returned an empty signature");
                    self.signature = None;
                    self.fail(FailureStage::Signing, "empty signature".to_string());
                    return;
                }
                self.signature = Some(signature);
            }
            AuthEvent::SigningFailed { message, reason } => {
                if !self.answers_sign(&message) {
                    debug!("dropping stale signing failure");
                    return;
                }
                self.in_flight.sign = false;
                self.signature = None;
                self.token = None;
                self.authenticated_at = None;
                self.fail(FailureStage::Signing, reason);
            }
            AuthEvent::TokenIssued { code, token } => {
                if !self.answers_exchange(&code) {
                    debug!("dropping stale token");
                    return;
                }
                self.in_flight.exchange = false;
                info!("authorization code exchanged");
                self.set_token(token);
            }
            AuthEvent::TokenExchangeFailed { code, reason } => {
                if !self.answers_exchange(&code) {
                    debug!("dropping stale exchange failure");
                    return;
                }
                self.in_flight.exchange = false;
                self.fail(FailureStage::Exchange, reason);
            }
            AuthEvent::SessionRegistered { refresh_token } => {
                if self.answers_registration(&refresh_token) {
                    self.registration = RegistrationState::Registered;
                }
            }
            AuthEvent::SessionRegisterFailed { refresh_token, .. } => {
                // the token stays valid; only server-side durability is lost
                if self.answers_registration(&refresh_token) {
                    self.registration = RegistrationState::Failed;
                }
            }
            AuthEvent::Retry => self.retry(),
        }
    }

    /// Re-evaluate every guarded action against the current state
    pub fn evaluate(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();

        if self.failure.is_none() {
            if let Some(identity) = &self.identity {
                if self.message.is_none()
                    && self.signature.is_none()
                    && self.token.is_none()
                    && !self.in_flight.session
                    && !self.session_attempted
                {
                    self.in_flight.session = true;
                    self.session_attempted = true;
                    effects.push(Effect::FetchSession(identity.clone()));
                }
            }

            if let Some(message) = &self.message {
                if self.signature.is_none()
                    && self.token.is_none()
                    && !self.in_flight.sign
                    && self.signed_message.as_ref() != Some(message)
                {
                    self.in_flight.sign = true;
                    self.signed_message = Some(message.clone());
                    effects.push(Effect::Sign(message.clone()));
                }
            }

            if !self.in_flight.exchange {
                if let Some(code) = self.code() {
                    if self.exchanged_code.as_ref() != Some(&code) {
                        self.in_flight.exchange = true;
                        self.exchanged_code = Some(code.clone());
                        effects.push(Effect::ExchangeCode(code));
                    }
                }
            }
        }

        if self.identity.is_some() {
            if let Some(refresh_token) = self.token.as_ref().and_then(AuthToken::refresh_token) {
                if self.registered_refresh_token.as_deref() != Some(refresh_token) {
                    let refresh_token = refresh_token.to_string();
                    self.registered_refresh_token = Some(refresh_token.clone());
                    self.registration = RegistrationState::Pending;
                    effects.push(Effect::RegisterSession(refresh_token));
                }
            }
        }

        effects
    }

    /// Whether a retry would do anything right now
    pub fn can_retry(&self) -> bool {
        matches!(self.phase(), AuthPhase::Failed | AuthPhase::Stalled)
    }

    fn retry(&mut self) {
        if !self.can_retry() {
            debug!(phase = ?self.phase(), "retry ignored");
            return;
        }
        self.attempt += 1;
        info!(attempt = self.attempt, failure = ?self.failure, "retrying from a fresh challenge");
        self.failure = None;
        self.message = None;
        self.signature = None;
        self.session_attempted = false;
        self.signed_message = None;
        self.exchanged_code = None;
    }

    fn set_token(&mut self, token: AuthToken) {
        self.token = Some(token);
        self.authenticated_at = Some(Utc::now());
    }

    fn fail(&mut self, stage: FailureStage, reason: String) {
        warn!(?stage, %reason, "session bootstrap failed");
        self.failure = Some(AuthFailure { stage, reason });
    }

    fn answers_sign(&self, message: &str) -> bool {
        self.in_flight.sign && self.signed_message.as_deref() == Some(message)
    }

    fn answers_exchange(&self, code: &AuthorizationCode) -> bool {
        self.in_flight.exchange && self.exchanged_code.as_ref() == Some(code)
    }

    fn answers_registration(&self, refresh_token: &str) -> bool {
        self.registration == RegistrationState::Pending
            && self.registered_refresh_token.as_deref() == Some(refresh_token)
    }
}
