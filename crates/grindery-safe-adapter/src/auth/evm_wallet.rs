/*
[INPUT]:  EVM private key (hex string)
[OUTPUT]: EIP-191 signed messages and checksummed owner address
[POS]:    Auth layer - EVM wallet implementation
[UPDATE]: When signing logic or EVM address formatting changes
*/

use std::str::FromStr;

use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;

use crate::auth::WalletSigner;
use crate::auth::wallet::ensure_signable;
use crate::http::{AuthError, Result};

/// Signer backed by a local EVM key (typically a Safe owner)
pub struct EvmWalletSigner {
    signer: PrivateKeySigner,
    address: String,
}

impl EvmWalletSigner {
    /// Create a new EVM wallet signer from a hex-encoded private key
    ///
    /// Supports both "0x"-prefixed and non-prefixed hex strings.
    pub fn new(private_key_hex: &str) -> Result<Self> {
        let private_key_hex = private_key_hex.trim();
        let private_key_hex = private_key_hex
            .strip_prefix("0x")
            .unwrap_or(private_key_hex);
        let signer = PrivateKeySigner::from_str(private_key_hex)
            .map_err(|e| AuthError::Config(format!("Invalid EVM private key: {e}")))?;

        let address = signer.address().to_checksum(None);

        Ok(Self { signer, address })
    }
}

impl std::fmt::Debug for EvmWalletSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvmWalletSigner")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl WalletSigner for EvmWalletSigner {
    fn address(&self) -> &str {
        &self.address
    }

    async fn sign_message(&self, message: &str) -> Result<String> {
        ensure_signable(message)?;
        let signature = self
            .signer
            .sign_message(message.as_bytes())
            .await
            .map_err(|e| AuthError::Signing(format!("Failed to sign EVM message: {e}")))?;

        // r || s || v
        Ok(format!("0x{}", hex::encode(signature.as_bytes())))
    }
}
