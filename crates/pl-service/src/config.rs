//! Service configuration loaded from TOML.

use pl_anchor::{AnchorError, AnchorKeypair, RpcClient, SignatureAnchor};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Errors raised while loading or applying configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("unknown network {0:?} and no rpc_url configured")]
    UnknownNetwork(String),

    #[error("invalid value for {key}: {value:?}")]
    InvalidOverride { key: &'static str, value: String },

    #[error("failed to load anchor keypair: {0}")]
    Keypair(#[from] AnchorError),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub anchor: AnchorConfig,
    pub query: QueryConfig,
}

/// External anchoring settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorConfig {
    /// Submit anchor transactions; when false every signature is local
    pub enabled: bool,
    /// Network name used to derive the RPC URL
    pub network: String,
    /// Explicit RPC endpoint, overriding the network default
    pub rpc_url: Option<String>,
    /// HTTP timeout for each RPC call
    pub timeout_ms: u64,
    /// Keypair file; a fresh keypair is generated when absent
    pub keypair_file: Option<PathBuf>,
}

impl Default for AnchorConfig {
    fn default() -> Self {
        AnchorConfig {
            enabled: true,
            network: "devnet".to_string(),
            rpc_url: None,
            timeout_ms: 10_000,
            keypair_file: None,
        }
    }
}

/// Query defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    pub default_recent_limit: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        QueryConfig {
            default_recent_limit: pl_store::DEFAULT_RECENT_LIMIT,
        }
    }
}

/// Default RPC endpoint for a well-known network name.
pub fn network_rpc_url(network: &str) -> Option<&'static str> {
    match network {
        "devnet" => Some("https://api.devnet.solana.com"),
        "testnet" => Some("https://api.testnet.solana.com"),
        "mainnet-beta" | "mainnet" => Some("https://api.mainnet-beta.solana.com"),
        "localnet" | "localhost" => Some("http://127.0.0.1:8899"),
        _ => None,
    }
}

impl ServiceConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(contents: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents, path)
    }

    /// Apply `PL_ANCHOR_RPC_URL` and `PL_ANCHOR_ENABLED` overrides.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(url) = lookup("PL_ANCHOR_RPC_URL") {
            self.anchor.rpc_url = Some(url);
        }
        if let Some(value) = lookup("PL_ANCHOR_ENABLED") {
            self.anchor.enabled = match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ConfigError::InvalidOverride {
                        key: "PL_ANCHOR_ENABLED",
                        value,
                    })
                }
            };
        }
        Ok(())
    }
}

impl AnchorConfig {
    /// The RPC endpoint in effect: explicit URL first, then the network default.
    pub fn resolved_rpc_url(&self) -> Result<String, ConfigError> {
        if let Some(url) = &self.rpc_url {
            return Ok(url.clone());
        }
        network_rpc_url(&self.network)
            .map(str::to_string)
            .ok_or_else(|| ConfigError::UnknownNetwork(self.network.clone()))
    }

    /// Build the signature anchor this configuration describes.
    pub fn build_anchor(&self) -> Result<SignatureAnchor, ConfigError> {
        let keypair = match &self.keypair_file {
            Some(path) => AnchorKeypair::load(path)?,
            None => AnchorKeypair::generate(),
        };

        if !self.enabled {
            info!(public_key = %keypair.public_key_base58(), "anchoring disabled; signatures are local");
            return Ok(SignatureAnchor::local_only(keypair));
        }

        let url = self.resolved_rpc_url()?;
        info!(
            network = %self.network,
            rpc_url = %url,
            public_key = %keypair.public_key_base58(),
            "anchoring enabled"
        );
        let client = RpcClient::new(url, Duration::from_millis(self.timeout_ms));
        Ok(SignatureAnchor::new(keypair, Box::new(client)))
    }
}
