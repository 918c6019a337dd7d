/*
[INPUT]:  Authorization server schema and serde requirements
[OUTPUT]: Typed response structs and their resolved outcomes
[POS]:    Data layer - response type definitions
[UPDATE]: When API schema changes or new types added
*/

use serde::{Deserialize, Serialize};

use super::models::AuthToken;

/// Body of `GET /oauth/session`
///
/// Carries either an existing token (the session cookie was recognized) or a
/// challenge message to sign.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// What a session response means for the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    Token(AuthToken),
    Challenge(String),
    /// Neither token nor message; the caller makes no progress
    Empty,
}

impl SessionResponse {
    /// Resolve the response. A token wins over a message; empty strings count as absent.
    pub fn into_outcome(self) -> SessionOutcome {
        match (self.access_token, self.message) {
            (Some(access_token), _) if !access_token.is_empty() => {
                SessionOutcome::Token(AuthToken {
                    access_token,
                    expires_in: self.expires_in,
                    refresh_token: self.refresh_token,
                    token_type: self.token_type,
                })
            }
            (_, Some(message)) if !message.is_empty() => SessionOutcome::Challenge(message),
            _ => SessionOutcome::Empty,
        }
    }
}
