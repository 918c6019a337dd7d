/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, fixtures, and mock helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for grindery-safe-adapter tests

use std::sync::Arc;
use std::time::Duration;

use grindery_safe_adapter::{
    AuthSession, ClientConfig, SessionApiClient, SessionConfig, SessionContext, SessionHandle,
    WalletIdentity, WalletSigner,
};
use wiremock::MockServer;

/// Upper bound for any single wait in a test
pub const TEST_WAIT: Duration = Duration::from_secs(5);

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Identity used by the end-to-end scenarios
pub fn test_identity() -> WalletIdentity {
    WalletIdentity::new(1, "0xABC0000000000000000000000000000000000001")
}

/// Token body as returned by the engine
pub fn token_json() -> serde_json::Value {
    serde_json::json!({
        "access_token": "tok1",
        "refresh_token": "r1",
        "expires_in": 3600,
        "token_type": "bearer",
    })
}

/// Client pointed at the mock server
#[allow(dead_code)]
pub fn client_for(server: &MockServer) -> SessionApiClient {
    SessionApiClient::with_config_and_base_url(ClientConfig::default(), &server.uri())
        .expect("client init")
}

/// Start a session for `test_identity` against the mock server
#[allow(dead_code)]
pub async fn start_session(
    server: &MockServer,
    signer: impl WalletSigner + 'static,
) -> (AuthSession, SessionHandle) {
    let signer: Arc<dyn WalletSigner> = Arc::new(signer);
    let session = AuthSession::start(
        client_for(server),
        signer,
        SessionConfig::default(),
        test_identity(),
    )
    .await
    .expect("session start");
    let handle = session.handle();
    (session, handle)
}

/// Wait for a settled phase, failing the test on timeout
#[allow(dead_code)]
pub async fn settle(handle: &mut SessionHandle) -> SessionContext {
    tokio::time::timeout(TEST_WAIT, handle.wait_settled())
        .await
        .expect("session did not settle in time")
}

/// Wait for a condition, failing the test on timeout
#[allow(dead_code)]
pub async fn wait_until(
    handle: &mut SessionHandle,
    predicate: impl FnMut(&SessionContext) -> bool,
) -> SessionContext {
    tokio::time::timeout(TEST_WAIT, handle.wait_for(predicate))
        .await
        .expect("condition not reached in time")
        .expect("session closed")
}
