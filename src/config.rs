use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::trace;

/// Storage backend configuration
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    /// In-memory storage (no persistence)
    #[serde(rename = "none")]
    None,

    /// SQLite database (default for most deployments)
    Sqlite {
        /// Path to the SQLite database file
        #[serde(default = "default_sqlite_path")]
        path: PathBuf,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Sqlite {
            path: default_sqlite_path(),
        }
    }
}

fn default_sqlite_path() -> PathBuf {
    PathBuf::from("./healthchecks.db")
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub probe: ProbeConfig,

    #[serde(default)]
    pub runtime: RuntimeConfig,
}

/// HTTP front door settings
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ServerConfig {
    #[serde(default = "crate::util::get_bind_addr")]
    pub bind_addr: SocketAddr,

    #[serde(default = "default_true")]
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: crate::util::get_bind_addr(),
            enable_cors: true,
        }
    }
}

/// Outbound probe settings
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ProbeConfig {
    /// Request timeout in seconds; a probe that exceeds it counts as an exception
    #[serde(default = "default_probe_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_probe_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Actor runtime settings
#[derive(Debug, Clone, serde::Deserialize)]
pub struct RuntimeConfig {
    /// Bounded mailbox size per actor instance
    #[serde(default = "default_mailbox_capacity")]
    pub mailbox_capacity: usize,

    /// Seconds an idle instance stays resident; `null` disables passivation
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: Option<u64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: default_mailbox_capacity(),
            idle_timeout_secs: default_idle_timeout(),
        }
    }
}

impl RuntimeConfig {
    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout_secs.map(Duration::from_secs)
    }
}

fn default_true() -> bool {
    true
}

fn default_probe_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("edge-healthchecks/{}", env!("CARGO_PKG_VERSION"))
}

fn default_mailbox_capacity() -> usize {
    64
}

fn default_idle_timeout() -> Option<u64> {
    Some(300)
}

/// Read a JSON or TOML configuration file (chosen by extension)
pub fn read_config_file(path: impl AsRef<Path>) -> anyhow::Result<Config> {
    let path = path.as_ref();
    let file_content = std::fs::read_to_string(path)?;

    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

    let config = if is_toml {
        toml::from_str(&file_content)
            .map_err(|e| anyhow::anyhow!("Invalid configuration file provided: {e}"))?
    } else {
        serde_json::from_str(&file_content)
            .map_err(|e| anyhow::anyhow!("Invalid configuration file provided: {e}"))?
    };

    trace!("loaded config: {config:?}");
    Ok(config)
}
