/*
[INPUT]:  Authorization server schema and wallet provider identity
[OUTPUT]: Wallet identity and auth token models
[POS]:    Data layer - core domain models
[UPDATE]: When the token schema or identity shape changes
*/

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// The (chain, address) pair the session is opened for
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WalletIdentity {
    pub chain_id: u64,
    pub address: String,
}

impl WalletIdentity {
    pub fn new(chain_id: u64, address: impl Into<String>) -> Self {
        Self {
            chain_id,
            address: address.into(),
        }
    }

    /// CAIP-2 style chain reference, e.g. `eip155:1`
    pub fn caip_chain(&self) -> String {
        format!("eip155:{}", self.chain_id)
    }
}

impl fmt::Display for WalletIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.address, self.caip_chain())
    }
}

/// Credential set issued by the authorization server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

impl AuthToken {
    /// Refresh token, treating an empty string as absent
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref().filter(|token| !token.is_empty())
    }

    /// Expiry instant given the moment the token was received
    ///
    /// Informational only: nothing refreshes or clears the token on expiry.
    pub fn expires_at(&self, received_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let seconds = i64::try_from(self.expires_in?).ok()?;
        received_at.checked_add_signed(Duration::seconds(seconds))
    }
}
