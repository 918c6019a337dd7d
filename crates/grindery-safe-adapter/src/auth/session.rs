/*
[INPUT]:  SessionApiClient, WalletSigner, wallet identity, retry requests
[OUTPUT]: SessionHandle publishing SessionContext snapshots
[POS]:    Auth layer - drives the state machine and runs its effects
[UPDATE]: When effect execution, cancellation, or timeouts change
*/

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span, debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::auth::context::SessionContext;
use crate::auth::machine::{AuthEvent, AuthStateMachine, Effect};
use crate::auth::WalletSigner;
use crate::http::{AuthError, Result, SessionApiClient};
use crate::types::WalletIdentity;

const DEFAULT_SIGN_TIMEOUT: Duration = Duration::from_secs(120);
const EVENT_BUFFER: usize = 32;

/// Driver configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long the wallet may take to answer a sign request
    pub sign_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sign_timeout: DEFAULT_SIGN_TIMEOUT,
        }
    }
}

/// Cloneable view of a running session
#[derive(Debug, Clone)]
pub struct SessionHandle {
    events: mpsc::Sender<AuthEvent>,
    context: watch::Receiver<SessionContext>,
}

impl SessionHandle {
    /// Current snapshot
    pub fn context(&self) -> SessionContext {
        self.context.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.context.borrow().is_authenticated()
    }

    /// Supply the wallet identity; starts the bootstrap
    pub async fn set_identity(&self, identity: WalletIdentity) -> Result<()> {
        self.send(AuthEvent::IdentityKnown(identity)).await
    }

    /// Start over after a failure or stall
    pub async fn retry(&self) -> Result<()> {
        self.send(AuthEvent::Retry).await
    }

    /// Wait until a snapshot satisfies `predicate`; `None` once the session is gone
    pub async fn wait_for(
        &mut self,
        predicate: impl FnMut(&SessionContext) -> bool,
    ) -> Option<SessionContext> {
        self.context
            .wait_for(predicate)
            .await
            .ok()
            .map(|context| context.clone())
    }

    /// Wait until the session is authenticated, failed or stalled
    ///
    /// Returns the last published snapshot if the session shuts down first.
    pub async fn wait_settled(&mut self) -> SessionContext {
        match self.wait_for(|context| context.phase.is_settled()).await {
            Some(context) => context,
            None => self.context(),
        }
    }

    async fn send(&self, event: AuthEvent) -> Result<()> {
        self.events
            .send(event)
            .await
            .map_err(|_| AuthError::Config("auth session is closed".to_string()))
    }
}

/// A running session bootstrap
///
/// Owns the driver task. Dropping it (or calling [`AuthSession::shutdown`])
/// cancels every in-flight request and signature prompt.
#[derive(Debug)]
pub struct AuthSession {
    handle: SessionHandle,
    shutdown: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl AuthSession {
    /// Spawn the driver; nothing happens until an identity is supplied
    pub fn spawn(
        client: SessionApiClient,
        signer: Arc<dyn WalletSigner>,
        config: SessionConfig,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
        let (context_tx, context_rx) = watch::channel(SessionContext::default());
        let shutdown = CancellationToken::new();

        let driver = Driver {
            machine: AuthStateMachine::new(),
            client,
            signer,
            config,
            context: context_tx,
            events: events_rx,
            shutdown: shutdown.clone(),
            tasks: JoinSet::new(),
        };
        let span = info_span!(
            "auth_session",
            session_id = %Uuid::new_v4(),
            safe = tracing::field::Empty
        );
        let task = tokio::spawn(driver.run().instrument(span));

        Self {
            handle: SessionHandle {
                events: events_tx,
                context: context_rx,
            },
            shutdown,
            task: Some(task),
        }
    }

    /// Spawn the driver and immediately supply the identity
    pub async fn start(
        client: SessionApiClient,
        signer: Arc<dyn WalletSigner>,
        config: SessionConfig,
        identity: WalletIdentity,
    ) -> Result<Self> {
        let session = Self::spawn(client, signer, config);
        session.handle.set_identity(identity).await?;
        Ok(session)
    }

    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// Cancel in-flight work and wait for the driver to exit
    pub async fn shutdown(mut self) {
        self.shutdown.cancel();
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                error!(error = %err, "auth session driver did not exit cleanly");
            }
        }
    }
}

impl Drop for AuthSession {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

struct Driver {
    machine: AuthStateMachine,
    client: SessionApiClient,
    signer: Arc<dyn WalletSigner>,
    config: SessionConfig,
    context: watch::Sender<SessionContext>,
    events: mpsc::Receiver<AuthEvent>,
    shutdown: CancellationToken,
    tasks: JoinSet<AuthEvent>,
}

impl Driver {
    async fn run(mut self) {
        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    debug!(aborted = self.tasks.len(), "auth session cancelled");
                    self.tasks.abort_all();
                    break;
                }
                Some(event) = self.events.recv() => self.dispatch(event),
                Some(joined) = self.tasks.join_next() => match joined {
                    Ok(event) => self.dispatch(event),
                    Err(err) if err.is_cancelled() => {}
                    Err(err) => error!(error = %err, "auth effect task panicked"),
                },
                else => break,
            }
        }
    }

    fn dispatch(&mut self, event: AuthEvent) {
        if let AuthEvent::IdentityKnown(identity) = &event {
            if self.machine.identity().is_none() {
                Span::current().record("safe", tracing::field::display(identity));
            }
        }
        let before = self.machine.phase();
        let effects = self.machine.handle(event);
        let after = self.machine.phase();
        if before != after {
            info!(from = ?before, to = ?after, "auth phase changed");
        }

        let next = self.machine.context();
        self.context.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });

        for effect in effects {
            self.spawn_effect(effect);
        }
    }

    fn spawn_effect(&mut self, effect: Effect) {
        debug!(effect = effect.name(), "running effect");
        let client = self.client.clone();
        let signer = Arc::clone(&self.signer);
        let sign_timeout = self.config.sign_timeout;
        self.tasks.spawn(
            async move { run_effect(effect, &client, signer.as_ref(), sign_timeout).await }
                .in_current_span(),
        );
    }
}

async fn run_effect(
    effect: Effect,
    client: &SessionApiClient,
    signer: &dyn WalletSigner,
    sign_timeout: Duration,
) -> AuthEvent {
    match effect {
        Effect::FetchSession(identity) => {
            match client.fetch_session_or_challenge(&identity).await {
                Ok(response) => AuthEvent::SessionFetched { identity, response },
                Err(err) => {
                    warn!(error = %err, kind = ?err.kind(), "session request failed");
                    AuthEvent::SessionFetchFailed {
                        identity,
                        reason: err.to_string(),
                    }
                }
            }
        }
        Effect::Sign(message) => {
            let result = match tokio::time::timeout(sign_timeout, signer.sign_message(&message)).await
            {
                Ok(result) => result,
                Err(_) => Err(AuthError::Timeout {
                    duration: sign_timeout.as_secs(),
                }),
            };
            match result {
                Ok(signature) => AuthEvent::Signed { message, signature },
                Err(err) => {
                    warn!(error = %err, signer = signer.address(), "signing failed");
                    AuthEvent::SigningFailed {
                        message,
                        reason: err.to_string(),
                    }
                }
            }
        }
        Effect::ExchangeCode(code) => match client.exchange_code_for_token(&code).await {
            Ok(token) => AuthEvent::TokenIssued { code, token },
            Err(err) => {
                warn!(error = %err, kind = ?err.kind(), "token exchange failed");
                AuthEvent::TokenExchangeFailed {
                    code,
                    reason: err.to_string(),
                }
            }
        },
        Effect::RegisterSession(refresh_token) => {
            match client.register_session(&refresh_token).await {
                Ok(()) => {
                    debug!("session registered");
                    AuthEvent::SessionRegistered { refresh_token }
                }
                Err(err) => {
                    warn!(error = %err, "session registration failed");
                    AuthEvent::SessionRegisterFailed {
                        refresh_token,
                        reason: err.to_string(),
                    }
                }
            }
        }
    }
}
