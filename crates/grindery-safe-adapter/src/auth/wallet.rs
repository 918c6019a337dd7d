/*
[INPUT]:  Challenge message to sign
[OUTPUT]: Signature string for authentication
[POS]:    Auth layer - wallet integration abstraction
[UPDATE]: When adding new wallet types or changing signature format
*/

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::http::{AuthError, Result};

/// Trait for wallet signing operations
///
/// The trait is async to support hardware wallets and external signers that
/// prompt the user before answering.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    /// Get the address of the signing key
    fn address(&self) -> &str;

    /// Sign a message and return the signature
    ///
    /// For EVM: Returns hex-encoded signature (0x...)
    async fn sign_message(&self, message: &str) -> Result<String>;
}

/// Reject empty challenges before they reach a wallet
pub(crate) fn ensure_signable(message: &str) -> Result<()> {
    if message.is_empty() {
        return Err(AuthError::Signing("refusing to sign an empty message".to_string()));
    }
    Ok(())
}

/// Mock wallet signer for testing
#[derive(Debug, Clone)]
pub struct MockWalletSigner {
    address: String,
    outcome: std::result::Result<String, String>,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

impl MockWalletSigner {
    /// Create a new mock signer with predetermined signature
    pub fn new(address: &str, signature: &str) -> Self {
        Self {
            address: address.to_string(),
            outcome: Ok(signature.to_string()),
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a mock signer that always rejects
    pub fn rejecting(address: &str, reason: &str) -> Self {
        Self {
            outcome: Err(reason.to_string()),
            ..Self::new(address, "")
        }
    }

    /// Wait before answering, like a wallet waiting on user confirmation
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of sign requests received (shared between clones)
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WalletSigner for MockWalletSigner {
    fn address(&self) -> &str {
        &self.address
    }

    async fn sign_message(&self, message: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        ensure_signable(message)?;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.outcome.clone().map_err(AuthError::Signing)
    }
}
