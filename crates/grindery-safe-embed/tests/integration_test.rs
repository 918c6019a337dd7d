/*
[INPUT]:  Mock Grindery engine, mock wallet signer
[OUTPUT]: Test results for the embed runner end to end
[POS]:    Integration tests - runner outcomes and retry handling
[UPDATE]: When the run flow or its outcomes change
*/

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use grindery_safe_adapter::auth::{FailureStage, RegistrationState};
use grindery_safe_adapter::{AuthPhase, MockWalletSigner, WalletSigner};
use grindery_safe_embed::{EmbedConfig, RunOutcome, View, run};
use tokio_test::assert_ok;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SAFE: &str = "0xABC0000000000000000000000000000000000001";

fn config_for(server: &MockServer) -> EmbedConfig {
    EmbedConfig::from_yaml_str(&format!(
        r#"
safe:
  chain_id: 1
  address: "{SAFE}"
engine:
  base_url: {}
  timeout_secs: 5
  sign_timeout_secs: 5
"#,
        server.uri()
    ))
    .expect("valid config")
}

fn token_json() -> serde_json::Value {
    serde_json::json!({
        "access_token": "tok1",
        "refresh_token": "r1",
        "expires_in": 3600,
        "token_type": "bearer",
    })
}

async fn mount_challenge(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/oauth/session"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"message": "sign-this-42"})),
        )
        .mount(server)
        .await;
}

async fn mount_token_and_register(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_json()))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/oauth/session-register"))
        .and(body_json(serde_json::json!({"refresh_token": "r1"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(server)
        .await;
}

fn signer(mock: &MockWalletSigner) -> Arc<dyn WalletSigner> {
    Arc::new(mock.clone())
}

fn never_retry(_: &grindery_safe_adapter::SessionContext) -> anyhow::Result<bool> {
    panic!("retry should not be asked for");
}

#[tokio::test]
async fn test_run_yields_embed_url() {
    let server = MockServer::start().await;
    mount_challenge(&server).await;
    mount_token_and_register(&server).await;

    let mock = MockWalletSigner::new("0xowner", "0xSIG");
    let outcome = assert_ok!(
        run(
            &config_for(&server),
            signer(&mock),
            CancellationToken::new(),
            never_retry,
        )
        .await
    );

    let RunOutcome::Authenticated { view, context } = outcome else {
        panic!("expected authenticated outcome, got {outcome:?}");
    };
    assert_eq!(context.access_token(), Some("tok1"));
    assert_eq!(mock.calls(), 1);

    let View::Embed(url) = view else {
        panic!("expected embed view");
    };
    let params: HashMap<_, _> = url.query_pairs().into_owned().collect();
    assert_eq!(params["access_token"], "tok1");
    assert_eq!(params["user_address"], SAFE);
    assert_eq!(params["trigger.input._grinderyChain"], "eip155:1");
}

#[tokio::test]
async fn test_run_waits_for_registration() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/oauth/session"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_json()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/oauth/session-register"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(200)))
        .expect(1)
        .mount(&server)
        .await;

    let mock = MockWalletSigner::new("0xowner", "0xSIG");
    let outcome = run(
        &config_for(&server),
        signer(&mock),
        CancellationToken::new(),
        never_retry,
    )
    .await
    .expect("run");

    assert!(matches!(outcome, RunOutcome::Authenticated { .. }));
    assert_eq!(mock.calls(), 0);
    let requests = server.received_requests().await.expect("recording enabled");
    assert!(
        requests
            .iter()
            .any(|request| request.url.path() == "/oauth/session-register")
    );
}

#[tokio::test]
async fn test_run_retries_failed_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/oauth/session"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_challenge(&server).await;
    mount_token_and_register(&server).await;

    let asked = AtomicUsize::new(0);
    let mock = MockWalletSigner::new("0xowner", "0xSIG");
    let outcome = run(
        &config_for(&server),
        signer(&mock),
        CancellationToken::new(),
        |context| {
            asked.fetch_add(1, Ordering::SeqCst);
            assert_eq!(context.phase, AuthPhase::Failed);
            assert_eq!(
                context.failure.as_ref().map(|failure| failure.stage),
                Some(FailureStage::Session)
            );
            Ok(true)
        },
    )
    .await
    .expect("run");

    assert_eq!(asked.load(Ordering::SeqCst), 1);
    let RunOutcome::Authenticated { context, .. } = outcome else {
        panic!("expected authenticated outcome, got {outcome:?}");
    };
    assert_eq!(context.attempt, 1);
    assert_eq!(context.access_token(), Some("tok1"));
}

#[tokio::test]
async fn test_run_without_retry_reports_waiting() {
    let server = MockServer::start().await;
    mount_challenge(&server).await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let mock = MockWalletSigner::rejecting("0xowner", "user rejected");
    let outcome = run(
        &config_for(&server),
        signer(&mock),
        CancellationToken::new(),
        |_| Ok(false),
    )
    .await
    .expect("run");

    let RunOutcome::NotAuthenticated { view, context } = outcome else {
        panic!("expected not authenticated outcome, got {outcome:?}");
    };
    assert_eq!(view, View::Waiting);
    assert_eq!(context.message.as_deref(), Some("sign-this-42"));
    assert_eq!(context.registration, RegistrationState::Idle);
    assert_eq!(
        context.failure.map(|failure| failure.stage),
        Some(FailureStage::Signing)
    );
    assert_eq!(mock.calls(), 1);
}

#[tokio::test]
async fn test_run_propagates_retry_decision_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/oauth/session"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;

    let mock = MockWalletSigner::new("0xowner", "0xSIG");
    let err = run(
        &config_for(&server),
        signer(&mock),
        CancellationToken::new(),
        |context| {
            assert_eq!(context.phase, AuthPhase::Stalled);
            Err(anyhow::anyhow!("prompt closed"))
        },
    )
    .await
    .unwrap_err();

    assert!(err.to_string().contains("prompt closed"));
}

#[tokio::test]
async fn test_run_cancelled_while_signing() {
    let server = MockServer::start().await;
    mount_challenge(&server).await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_json()))
        .expect(0)
        .mount(&server)
        .await;

    let shutdown = CancellationToken::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.cancel();
    });

    let mock = MockWalletSigner::new("0xowner", "0xSIG").with_delay(Duration::from_secs(30));
    let outcome = tokio::time::timeout(
        Duration::from_secs(5),
        run(&config_for(&server), signer(&mock), shutdown, never_retry),
    )
    .await
    .expect("run returns promptly after cancel")
    .expect("run");

    assert!(matches!(outcome, RunOutcome::Cancelled));
}
