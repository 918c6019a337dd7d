/*
[INPUT]:  Safe address, chain id, and owner private key from the environment
[OUTPUT]: Authenticated session context for the Grindery engine
[POS]:    Examples - session bootstrap demonstration
[UPDATE]: When auth flow changes
*/

use std::sync::Arc;
use std::time::Duration;

use grindery_safe_adapter::auth::RegistrationState;
use grindery_safe_adapter::*;

/// Example: session bootstrap
///
/// 1. Create HTTP client
/// 2. Create the owner wallet signer
/// 3. Start the session for the Safe identity
/// 4. Wait until the engine issued (or restored) a token
/// 5. Wait for the refresh token registration, then shut down
#[tokio::main]
async fn main() {
    println!("=== Grindery Safe Session Example ===\n");

    let (Ok(address), Ok(private_key)) = (
        std::env::var("SAFE_ADDRESS"),
        std::env::var("GRINDERY_SIGNER_KEY"),
    ) else {
        eprintln!("Set SAFE_ADDRESS and GRINDERY_SIGNER_KEY to run this example");
        return;
    };
    let chain_id = std::env::var("SAFE_CHAIN_ID")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(1);

    let client = match SessionApiClient::new() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to create client: {}", e);
            return;
        }
    };
    println!("✓ HTTP client created");

    let signer = match EvmWalletSigner::new(&private_key) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to load signer: {}", e);
            return;
        }
    };
    println!("✓ Signer loaded for owner {}", signer.address());

    let identity = WalletIdentity::new(chain_id, address);
    let session =
        match AuthSession::start(client, Arc::new(signer), SessionConfig::default(), identity).await
        {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Failed to start session: {}", e);
                return;
            }
        };

    let mut handle = session.handle();
    let context = handle.wait_settled().await;
    match context.phase {
        AuthPhase::Authenticated => {
            let token_type = context
                .token
                .as_ref()
                .and_then(|token| token.token_type.clone());
            println!("✓ Authenticated, token type {:?}", token_type);

            // Let the refresh token registration finish before shutting down
            let registered = tokio::time::timeout(
                Duration::from_secs(10),
                handle.wait_for(|context| context.registration != RegistrationState::Pending),
            )
            .await;
            match registered {
                Ok(Some(context)) => println!("✓ Registration {:?}", context.registration),
                Ok(None) => eprintln!("Session closed before registration finished"),
                Err(_) => eprintln!("Registration still pending, giving up"),
            }
        }
        phase => println!("✗ Session ended in {:?}: {:?}", phase, context.failure),
    }

    session.shutdown().await;
}
