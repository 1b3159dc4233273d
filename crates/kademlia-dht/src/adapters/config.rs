use crate::domain::{KademliaConfig, NodeAddress};
use crate::ports::ConfigProvider;

// ============================================================================
// StaticConfigProvider - Hardcoded config for testing/development
// ============================================================================

/// Static configuration provider with hardcoded values.
///
/// Useful for testing and development. For deployments, use `TomlConfigProvider`.
#[derive(Debug, Clone)]
pub struct StaticConfigProvider {
    local_address: NodeAddress,
    bootstrap_nodes: Vec<NodeAddress>,
    config: KademliaConfig,
}

impl StaticConfigProvider {
    /// Create for `local_address` with default config and no bootstrap nodes.
    #[must_use]
    pub fn new(local_address: NodeAddress) -> Self {
        Self {
            local_address,
            bootstrap_nodes: Vec::new(),
            config: KademliaConfig::default(),
        }
    }

    /// Create with specified bootstrap nodes.
    #[must_use]
    pub fn with_bootstrap_nodes(mut self, nodes: Vec<NodeAddress>) -> Self {
        self.bootstrap_nodes = nodes;
        self
    }

    /// Create with specified Kademlia config.
    #[must_use]
    pub fn with_config(mut self, config: KademliaConfig) -> Self {
        self.config = config;
        self
    }
}

impl ConfigProvider for StaticConfigProvider {
    fn get_local_address(&self) -> NodeAddress {
        self.local_address.clone()
    }

    fn get_bootstrap_nodes(&self) -> Vec<NodeAddress> {
        self.bootstrap_nodes.clone()
    }

    fn get_kademlia_config(&self) -> KademliaConfig {
        self.config.clone()
    }
}

// ============================================================================
// TomlConfigProvider - Config file loading (requires "toml-config" feature)
// ============================================================================

#[cfg(feature = "toml-config")]
mod toml_config {
    use super::*;
    use serde::Deserialize;
    use std::fs;
    use std::path::Path;
    use thiserror::Error;

    /// Configuration file structure.
    #[derive(Debug, Deserialize)]
    struct ConfigFile {
        #[serde(default)]
        node: NodeSection,
        #[serde(default)]
        bootstrap: BootstrapSection,
        #[serde(default)]
        kademlia: KademliaSection,
    }

    #[derive(Debug, Deserialize)]
    struct NodeSection {
        #[serde(default = "default_host")]
        host: String,
        #[serde(default = "default_port")]
        port: u16,
    }

    impl Default for NodeSection {
        fn default() -> Self {
            Self {
                host: default_host(),
                port: default_port(),
            }
        }
    }

    fn default_host() -> String {
        "127.0.0.1".to_string()
    }

    fn default_port() -> u16 {
        53
    }

    #[derive(Debug, Deserialize, Default)]
    struct BootstrapSection {
        #[serde(default)]
        nodes: Vec<String>,
    }

    #[derive(Debug, Deserialize, Default)]
    struct KademliaSection {
        k: Option<usize>,
        alpha: Option<usize>,
        max_rounds: Option<usize>,
        rpc_timeout_ms: Option<u64>,
    }

    /// TOML-based configuration provider.
    ///
    /// # Config File Format
    ///
    /// ```toml
    /// [node]
    /// host = "127.0.0.1"
    /// port = 53
    ///
    /// [bootstrap]
    /// nodes = ["10.0.0.1:53", "10.0.0.2:53"]
    ///
    /// [kademlia]
    /// k = 3
    /// alpha = 3
    /// max_rounds = 4
    /// rpc_timeout_ms = 5000
    /// ```
    ///
    /// Missing keys fall back to defaults. `alpha` defaults to `k` and
    /// `max_rounds` to `k + 1`.
    #[derive(Debug, Clone)]
    pub struct TomlConfigProvider {
        local_address: NodeAddress,
        bootstrap_nodes: Vec<NodeAddress>,
        config: KademliaConfig,
    }

    impl TomlConfigProvider {
        /// Load configuration from a TOML file.
        ///
        /// # Errors
        ///
        /// Returns error if file cannot be read, parsed or validated.
        pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
            let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
                path: path.as_ref().display().to_string(),
                error: e.to_string(),
            })?;

            Self::parse(&content)
        }

        /// Parse configuration from a TOML string.
        pub fn parse(content: &str) -> Result<Self, ConfigError> {
            let file: ConfigFile =
                toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;

            let bootstrap_nodes = file
                .bootstrap
                .nodes
                .iter()
                .map(|node| {
                    node.parse::<NodeAddress>()
                        .map_err(|e| ConfigError::Invalid(format!("bootstrap node {node:?}: {e}")))
                })
                .collect::<Result<Vec<_>, _>>()?;

            let kc = file.kademlia;
            let k = kc.k.unwrap_or(KademliaConfig::DEFAULT_K);
            let config = KademliaConfig {
                k,
                alpha: kc.alpha.unwrap_or(k),
                max_rounds: kc.max_rounds.unwrap_or(k + 1),
                rpc_timeout_ms: kc
                    .rpc_timeout_ms
                    .unwrap_or(KademliaConfig::default().rpc_timeout_ms),
            };
            validate(&config)?;

            Ok(Self {
                local_address: NodeAddress::new(file.node.host, file.node.port),
                bootstrap_nodes,
                config,
            })
        }
    }

    /// Reject parameters under which a lookup cannot make progress.
    fn validate(config: &KademliaConfig) -> Result<(), ConfigError> {
        for (name, value) in [
            ("k", config.k),
            ("alpha", config.alpha),
            ("max_rounds", config.max_rounds),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{name} must be at least 1")));
            }
        }
        Ok(())
    }

    impl ConfigProvider for TomlConfigProvider {
        fn get_local_address(&self) -> NodeAddress {
            self.local_address.clone()
        }

        fn get_bootstrap_nodes(&self) -> Vec<NodeAddress> {
            self.bootstrap_nodes.clone()
        }

        fn get_kademlia_config(&self) -> KademliaConfig {
            self.config.clone()
        }
    }

    /// Errors that can occur during config loading.
    #[derive(Debug, Clone, Error, PartialEq, Eq)]
    pub enum ConfigError {
        /// File I/O error.
        #[error("failed to read {path}: {error}")]
        Io {
            /// Path of the file that failed to load.
            path: String,
            /// Error message from the I/O operation.
            error: String,
        },
        /// TOML parsing error.
        #[error("failed to parse config: {0}")]
        Parse(String),
        /// Parsed, but a value is out of range or malformed.
        #[error("invalid config: {0}")]
        Invalid(String),
    }
}

#[cfg(feature = "toml-config")]
pub use toml_config::{ConfigError, TomlConfigProvider};
