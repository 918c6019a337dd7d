/*
[INPUT]:  SessionContext, Safe identity, embed target configuration
[OUTPUT]: What to show: the embedded integration URL or the waiting indicator
[POS]:    Session consumer - decides what the host renders
[UPDATE]: When embed URL parameters or gating rules change
*/

use std::fmt;

use anyhow::{Context, Result};
use url::Url;

use grindery_safe_adapter::{SessionContext, WalletIdentity};

use crate::config::EmbedTargetConfig;

pub const WAITING_TEXT: &str = "Waiting for Safe...";

/// What the host should display
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Embed(Url),
    Waiting,
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::Embed(url) => write!(f, "{url}"),
            View::Waiting => f.write_str(WAITING_TEXT),
        }
    }
}

/// Gate the embedded integration on an authenticated session
pub fn view(
    context: &SessionContext,
    identity: &WalletIdentity,
    target: &EmbedTargetConfig,
) -> Result<View> {
    match context.access_token() {
        Some(access_token) if !identity.address.is_empty() => {
            Ok(View::Embed(embed_url(target, identity, access_token)?))
        }
        _ => Ok(View::Waiting),
    }
}

/// URL of the embedded integration, pre-bound to the Safe and its token
pub fn embed_url(
    target: &EmbedTargetConfig,
    identity: &WalletIdentity,
    access_token: &str,
) -> Result<Url> {
    let mut url = Url::parse(&target.base_url).context("embed.base_url")?;
    let chain = identity.chain_id.to_string();
    url.query_pairs_mut()
        .append_pair("user_chain", &chain)
        .append_pair("user_address", &identity.address)
        .append_pair("access_token", access_token)
        .append_pair("trigger.input._grinderyContractAddress", &identity.address)
        .append_pair("trigger.input._grinderyChain", &identity.caip_chain())
        .append_pair("trigger.skipAuth", "1")
        .append_pair("action", &target.action)
        .append_pair("create", "1");
    Ok(url)
}
