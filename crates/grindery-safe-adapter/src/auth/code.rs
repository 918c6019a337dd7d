/*
[INPUT]:  Challenge message and its signature
[OUTPUT]: base64url authorization code accepted by POST /oauth/token
[POS]:    Auth layer - authorization code encoding
[UPDATE]: When the engine changes the code payload or signature type tag
*/

use std::fmt;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};

use crate::http::{AuthError, Result};

/// Signature type tag understood by the engine (contract-wallet signatures)
pub const SIGNATURE_TYPE_EIP1271: &str = "eip1271";

/// JSON payload wrapped by the code. Field order is part of the wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodePayload {
    pub message: String,
    pub signature: String,
    #[serde(rename = "type")]
    pub signature_type: String,
}

/// Client-derived proof of a signed challenge
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AuthorizationCode(String);

impl AuthorizationCode {
    /// Encode `{message, signature, type: "eip1271"}` as unpadded base64url
    pub fn encode(message: &str, signature: &str) -> Result<Self> {
        let payload = CodePayload {
            message: message.to_string(),
            signature: signature.to_string(),
            signature_type: SIGNATURE_TYPE_EIP1271.to_string(),
        };
        let json = serde_json::to_vec(&payload)?;
        Ok(Self(URL_SAFE_NO_PAD.encode(json)))
    }

    /// Decode the payload back, mostly useful for diagnostics and tests
    pub fn decode(&self) -> Result<CodePayload> {
        let bytes = URL_SAFE_NO_PAD.decode(&self.0).map_err(|e| {
            AuthError::InvalidResponse(format!("Invalid authorization code base64: {e}"))
        })?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AuthorizationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
