/*
[INPUT]:  YAML configuration file, signer key environment variable
[OUTPUT]: Parsed and validated embed runner configuration
[POS]:    Configuration layer - session and embed setup
[UPDATE]: When adding new configuration options
*/

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use grindery_safe_adapter::http::ENGINE_URL;
use grindery_safe_adapter::{ClientConfig, SessionConfig, WalletIdentity};

pub const DEFAULT_SIGNER_KEY_ENV: &str = "GRINDERY_SIGNER_KEY";
pub const DEFAULT_EMBED_URL: &str = "https://embed.grindery.io/safe/slack__safe";

/// Top-level configuration for the embed runner
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbedConfig {
    /// The Safe the session is opened for
    pub safe: SafeConfig,
    #[serde(default)]
    pub signer: SignerConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub embed: EmbedTargetConfig,
}

/// Wallet identity of the Safe
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SafeConfig {
    pub chain_id: u64,
    pub address: String,
}

/// Owner key used to sign the engine challenge
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SignerConfig {
    /// Hex private key; prefer the environment variable
    #[serde(default)]
    pub private_key: Option<String>,
    /// Environment variable consulted when `private_key` is absent
    #[serde(default = "default_key_env")]
    pub private_key_env: String,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            private_key: None,
            private_key_env: default_key_env(),
        }
    }
}

/// Grindery engine connection settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    #[serde(default = "default_engine_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_sign_timeout_secs")]
    pub sign_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: default_engine_url(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            sign_timeout_secs: default_sign_timeout_secs(),
        }
    }
}

/// Embedded integration shown to authenticated users
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbedTargetConfig {
    #[serde(default = "default_embed_url")]
    pub base_url: String,
    #[serde(default = "default_action")]
    pub action: String,
}

impl Default for EmbedTargetConfig {
    fn default() -> Self {
        Self {
            base_url: default_embed_url(),
            action: default_action(),
        }
    }
}

fn default_key_env() -> String {
    DEFAULT_SIGNER_KEY_ENV.to_string()
}

fn default_engine_url() -> String {
    ENGINE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_sign_timeout_secs() -> u64 {
    120
}

fn default_embed_url() -> String {
    DEFAULT_EMBED_URL.to_string()
}

fn default_action() -> String {
    "sendChannelMessage".to_string()
}

impl EmbedConfig {
    /// Load configuration from YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        Self::from_yaml_str(&content)
    }

    /// Parse and validate YAML configuration
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content).context("parse config yaml")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.safe.address.trim().is_empty() {
            bail!("safe.address must not be empty");
        }
        if self.engine.timeout_secs == 0
            || self.engine.connect_timeout_secs == 0
            || self.engine.sign_timeout_secs == 0
        {
            bail!("engine timeouts must be greater than zero");
        }
        url::Url::parse(&self.engine.base_url).context("engine.base_url")?;
        url::Url::parse(&self.embed.base_url).context("embed.base_url")?;
        if self.embed.action.trim().is_empty() {
            bail!("embed.action must not be empty");
        }
        Ok(())
    }

    pub fn identity(&self) -> WalletIdentity {
        WalletIdentity::new(self.safe.chain_id, self.safe.address.trim())
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            timeout: Duration::from_secs(self.engine.timeout_secs),
            connect_timeout: Duration::from_secs(self.engine.connect_timeout_secs),
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            sign_timeout: Duration::from_secs(self.engine.sign_timeout_secs),
        }
    }

    /// Signer key from the file, falling back to the configured environment variable
    pub fn resolve_private_key(&self) -> Result<String> {
        if let Some(key) = self.signer.private_key.as_deref() {
            if !key.trim().is_empty() {
                return Ok(key.trim().to_string());
            }
        }
        let env_name = &self.signer.private_key_env;
        std::env::var(env_name)
            .map(|key| key.trim().to_string())
            .with_context(|| format!("no signer.private_key and {env_name} is not set"))
    }
}

/// `<config dir>/grindery-safe/config.yaml`, if the platform has a config dir
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("grindery-safe").join("config.yaml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
safe:
  chain_id: 1
  address: "0xABC0000000000000000000000000000000000001"
"#;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = EmbedConfig::from_yaml_str(MINIMAL).unwrap();

        assert_eq!(config.identity().chain_id, 1);
        assert_eq!(config.engine.base_url, ENGINE_URL);
        assert_eq!(config.engine.timeout_secs, 30);
        assert_eq!(config.embed.base_url, DEFAULT_EMBED_URL);
        assert_eq!(config.embed.action, "sendChannelMessage");
        assert_eq!(config.signer.private_key_env, DEFAULT_SIGNER_KEY_ENV);
        assert_eq!(config.session_config().sign_timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_full_config() {
        let config = EmbedConfig::from_yaml_str(
            r#"
safe:
  chain_id: 100
  address: " 0xdef "
signer:
  private_key: "0x01"
engine:
  base_url: http://localhost:8080
  timeout_secs: 5
  connect_timeout_secs: 2
  sign_timeout_secs: 60
embed:
  base_url: https://embed.example.com/safe/discord__safe
  action: sendMessage
"#,
        )
        .unwrap();

        assert_eq!(config.identity(), WalletIdentity::new(100, "0xdef"));
        assert_eq!(config.client_config().timeout, Duration::from_secs(5));
        assert_eq!(config.client_config().connect_timeout, Duration::from_secs(2));
        assert_eq!(config.resolve_private_key().unwrap(), "0x01");
        assert_eq!(config.embed.action, "sendMessage");
    }

    #[test]
    fn test_rejects_empty_address() {
        let err = EmbedConfig::from_yaml_str("safe:\n  chain_id: 1\n  address: \"\"\n").unwrap_err();
        assert!(err.to_string().contains("safe.address"));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let yaml = format!("{MINIMAL}engine:\n  sign_timeout_secs: 0\n");
        assert!(EmbedConfig::from_yaml_str(&yaml).is_err());
    }

    #[test]
    fn test_rejects_missing_safe() {
        assert!(EmbedConfig::from_yaml_str("engine:\n  timeout_secs: 5\n").is_err());
    }

    #[test]
    fn test_missing_key_names_env_var() {
        let yaml = format!("{MINIMAL}signer:\n  private_key_env: GRINDERY_TEST_UNSET_KEY_VAR\n");
        let config = EmbedConfig::from_yaml_str(&yaml).unwrap();
        let err = config.resolve_private_key().unwrap_err();
        assert!(err.to_string().contains("GRINDERY_TEST_UNSET_KEY_VAR"));
    }
}
