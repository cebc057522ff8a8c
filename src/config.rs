use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Root configuration structure, deserialized from `.license-fetchr/config.toml`.
///
/// Every section is optional; missing keys fall back to [`Config::default`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub forge: ForgeConfig,
    pub registry: RegistryConfig,
    pub dispatch: DispatchConfig,
    /// Fork → upstream `owner/repo` mapping. Replaces the built-in table when set.
    pub remap: HashMap<String, String>,
}

/// Code-forge (GitHub) endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ForgeConfig {
    /// Host that identifiers must reference to be treated as forge repositories.
    pub host: String,
    /// Base URL of the REST API.
    pub api_url: String,
}

/// Package registry (pkg.go.dev) endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Number of concurrent workers; bounds outbound requests.
    pub workers: usize,
    /// Per-request timeout.
    pub timeout_secs: u64,
    /// Optional deadline for the whole run. The run is cancelled when it elapses.
    pub deadline_secs: Option<u64>,
    pub user_agent: String,
}

impl Default for ForgeConfig {
    fn default() -> Self {
        Self {
            host: "github.com".to_string(),
            api_url: "https://api.github.com".to_string(),
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: "https://pkg.go.dev".to_string(),
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            workers: 12,
            timeout_secs: 10,
            deadline_secs: None,
            user_agent: format!("license-fetchr/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for Config {
    /// Built-in configuration used when no config file is found.
    ///
    /// The remap table collapses the pixie-labs forks onto their upstreams.
    fn default() -> Self {
        let remap = [
            ("pixie-labs/aes-min", "cmcqueen/aes-min"),
            ("pixie-labs/arrow", "apache/arrow"),
            ("pixie-labs/bcc", "iovisor/bcc"),
            ("pixie-labs/bpftrace", "iovisor/bpftrace"),
            ("pixie-labs/cpplint", "cpplint/cpplint"),
            ("pixie-labs/dnsparser", "packetzero/dnsparser"),
            ("pixie-labs/ELFIO", "serge1/ELFIO"),
            ("pixie-labs/grpc", "grpc/grpc"),
            ("pixie-labs/kuberesolver", "sercand/kuberesolver"),
            ("pixie-labs/libpypa", "vinzenz/libpypa"),
            ("pixie-labs/protobuf", "protocolbuffers/protobuf"),
            ("pixie-labs/tdigest", "derrickburns/tdigest"),
            ("pixie-labs/threadstacks", "thoughtspot/threadstacks"),
        ]
        .into_iter()
        .map(|(fork, upstream)| (fork.to_string(), upstream.to_string()))
        .collect();

        Config {
            forge: ForgeConfig::default(),
            registry: RegistryConfig::default(),
            dispatch: DispatchConfig::default(),
            remap,
        }
    }
}

impl DispatchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_secs.map(Duration::from_secs)
    }
}

/// Load the configuration, searching in order:
///
/// 1. `config_override` — path passed via `--config`
/// 2. `<project_path>/.license-fetchr/config.toml`
/// 3. `~/.config/license-fetchr/config.toml`
/// 4. Built-in [`Config::default`]
pub fn load_config(project_path: &Path, config_override: Option<&Path>) -> Result<Config> {
    if let Some(path) = config_override {
        return read_config(path);
    }

    let project_config = project_path.join(".license-fetchr").join("config.toml");
    if project_config.exists() {
        return read_config(&project_config);
    }

    if let Some(home) = dirs::home_dir() {
        let home_config = home
            .join(".config")
            .join("license-fetchr")
            .join("config.toml");
        if home_config.exists() {
            return read_config(&home_config);
        }
    }

    Ok(Config::default())
}

fn read_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config: Config = toml::from_str(&content)
        .with_context(|| format!("parsing config {}", path.display()))?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
}
