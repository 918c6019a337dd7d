/*
[INPUT]:  EmbedConfig, WalletSigner, shutdown token, retry decision callback
[OUTPUT]: Run outcome: embed view for an authenticated Safe, or why it is not
[POS]:    Composition root - owns the auth session for one run
[UPDATE]: When startup flow, retry handling, or shutdown handling change
*/

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use grindery_safe_adapter::auth::RegistrationState;
use grindery_safe_adapter::{
    AuthPhase, AuthSession, SessionApiClient, SessionContext, WalletSigner,
};

use crate::config::EmbedConfig;
use crate::embed::{self, View};

/// Bound on waiting for the refresh token registration before exiting
const REGISTRATION_GRACE: Duration = Duration::from_secs(10);

/// How a run ended
#[derive(Debug)]
pub enum RunOutcome {
    Authenticated { view: View, context: SessionContext },
    /// Settled without a token and no retry was requested
    NotAuthenticated { view: View, context: SessionContext },
    Cancelled,
}

/// Run one session bootstrap for the configured Safe
///
/// `retry` is asked whenever the session fails or stalls; returning `true`
/// starts over from a fresh challenge.
pub async fn run(
    config: &EmbedConfig,
    signer: Arc<dyn WalletSigner>,
    shutdown: CancellationToken,
    mut retry: impl FnMut(&SessionContext) -> Result<bool>,
) -> Result<RunOutcome> {
    let identity = config.identity();
    let client = SessionApiClient::with_config_and_base_url(
        config.client_config(),
        &config.engine.base_url,
    )
    .context("build engine client")?;

    info!(%identity, engine = %client.base_url(), signer = signer.address(), "starting session");
    let session = AuthSession::start(client, signer, config.session_config(), identity.clone())
        .await
        .context("start auth session")?;
    let mut handle = session.handle();

    let mut attempt = 0;
    let outcome = loop {
        let settled = tokio::select! {
            _ = shutdown.cancelled() => break RunOutcome::Cancelled,
            context = handle.wait_for(|context| {
                context.attempt == attempt && context.phase.is_settled()
            }) => context,
        };
        let Some(context) = settled else {
            warn!("auth session closed before settling");
            break RunOutcome::NotAuthenticated {
                view: View::Waiting,
                context: handle.context(),
            };
        };

        let view = embed::view(&context, &identity, &config.embed)?;
        if context.phase == AuthPhase::Authenticated {
            wait_for_registration(&mut handle, &shutdown).await;
            break RunOutcome::Authenticated { view, context };
        }

        if !retry(&context)? {
            break RunOutcome::NotAuthenticated { view, context };
        }
        attempt = context.attempt + 1;
        handle.retry().await.context("request retry")?;
    };

    session.shutdown().await;
    Ok(outcome)
}

async fn wait_for_registration(
    handle: &mut grindery_safe_adapter::SessionHandle,
    shutdown: &CancellationToken,
) {
    let done = |context: &SessionContext| context.registration != RegistrationState::Pending;
    tokio::select! {
        _ = shutdown.cancelled() => {}
        result = tokio::time::timeout(REGISTRATION_GRACE, handle.wait_for(done)) => {
            match result {
                Ok(Some(context)) if context.registration == RegistrationState::Failed => {
                    warn!("session registration failed; the engine will ask for a new signature next time");
                }
                Ok(_) => {}
                Err(_) => warn!(
                    grace_secs = REGISTRATION_GRACE.as_secs(),
                    "session registration still pending"
                ),
            }
        }
    }
}
