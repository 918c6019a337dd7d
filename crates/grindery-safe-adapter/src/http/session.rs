/*
[INPUT]:  Wallet identity, authorization codes, refresh tokens
[OUTPUT]: Session/challenge responses, auth tokens, registration acks
[POS]:    HTTP layer - OAuth session endpoints of the Grindery engine
[UPDATE]: When OAuth endpoints or their payloads change
*/

use reqwest::Method;
use tracing::debug;

use crate::auth::AuthorizationCode;
use crate::http::{Result, SessionApiClient};
use crate::types::{
    AuthToken, SessionRegisterRequest, SessionResponse, TokenRequest, WalletIdentity,
};

impl SessionApiClient {
    /// Fetch an existing session token, or a challenge message to sign
    ///
    /// GET /oauth/session?address={address}&chain={chain_id}
    pub async fn fetch_session_or_challenge(
        &self,
        identity: &WalletIdentity,
    ) -> Result<SessionResponse> {
        let chain = identity.chain_id.to_string();
        let builder = self
            .request(Method::GET, "oauth/session")?
            .query(&[("address", identity.address.as_str()), ("chain", chain.as_str())]);
        debug!(address = %identity.address, chain_id = identity.chain_id, "fetching session");
        self.send_json(builder).await
    }

    /// Exchange a signed challenge for a token
    ///
    /// POST /oauth/token
    pub async fn exchange_code_for_token(&self, code: &AuthorizationCode) -> Result<AuthToken> {
        let body = TokenRequest::authorization_code(code.as_str());
        let builder = self.request(Method::POST, "oauth/token")?.json(&body);
        self.send_json(builder).await
    }

    /// Register the refresh token so the engine can restore the session from its cookie
    ///
    /// POST /oauth/session-register
    pub async fn register_session(&self, refresh_token: &str) -> Result<()> {
        let body = SessionRegisterRequest { refresh_token };
        let builder = self
            .request(Method::POST, "oauth/session-register")?
            .json(&body);
        self.send(builder).await?;
        Ok(())
    }
}
