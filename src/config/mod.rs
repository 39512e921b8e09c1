//! Configuration management.
//!
//! Settings are layered: built-in defaults, then an optional TOML file,
//! then `ARXIV_MCP_*` environment variables (`__` separates nested keys,
//! e.g. `ARXIV_MCP_SERVER__PORT=9000`). CLI flags are applied on top by
//! the binary.
//!
//! ```toml
//! max_results = 50
//!
//! [server]
//! host = "0.0.0.0"
//! port = 8000
//!
//! [storage]
//! path = "~/.arxiv-mcp-server/papers"
//!
//! [arxiv]
//! api_url = "http://export.arxiv.org/api/query"
//! pdf_url = "https://arxiv.org/pdf"
//! request_timeout_secs = 60
//!
//! [events]
//! capacity = 1024
//! keep_alive_secs = 30
//! delivery = "shared"   # or "broadcast"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::events::DeliveryMode;
use crate::sources::{ARXIV_API_URL, ARXIV_PDF_URL};

/// File name looked up in the working directory when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "arxiv-mcp-server.toml";

/// Prefix of environment overrides
pub const ENV_PREFIX: &str = "ARXIV_MCP";

/// Ceiling on search results
pub const MAX_RESULTS_CEILING: usize = 50;

pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

pub const DEFAULT_KEEP_ALIVE_SECS: u64 = 30;

/// Application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app_name: String,
    pub app_version: String,
    /// Upper bound applied to every search's `max_results`
    pub max_results: usize,
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub arxiv: ArxivConfig,
    pub events: EventsConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_name: env!("CARGO_PKG_NAME").to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            max_results: MAX_RESULTS_CEILING,
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            arxiv: ArxivConfig::default(),
            events: EventsConfig::default(),
        }
    }
}

/// HTTP listener
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl ServerConfig {
    /// `host:port` for binding
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Where converted papers are kept
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

fn default_storage_path() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".arxiv-mcp-server").join("papers"))
        .unwrap_or_else(|| PathBuf::from("./papers"))
}

/// Expand a leading `~/` to the home directory
pub fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

/// arXiv endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArxivConfig {
    pub api_url: String,
    pub pdf_url: String,
    pub request_timeout_secs: u64,
}

impl Default for ArxivConfig {
    fn default() -> Self {
        Self {
            api_url: ARXIV_API_URL.to_string(),
            pdf_url: ARXIV_PDF_URL.to_string(),
            request_timeout_secs: 60,
        }
    }
}

impl ArxivConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// SSE event relay tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Events buffered before the oldest is dropped
    pub capacity: usize,
    /// Idle seconds before a stream sends a ping
    pub keep_alive_secs: u64,
    pub delivery: DeliveryMode,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_EVENT_CAPACITY,
            keep_alive_secs: DEFAULT_KEEP_ALIVE_SECS,
            delivery: DeliveryMode::default(),
        }
    }
}

impl EventsConfig {
    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs.max(1))
    }
}

/// Load settings. An explicit `path` must exist; otherwise
/// [`DEFAULT_CONFIG_FILE`] is read when present.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, config::ConfigError> {
    let file = match path {
        Some(path) => config::File::from(path).required(true),
        None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
    };

    let settings: Settings = config::Config::builder()
        .add_source(file)
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()?;

    Ok(Settings {
        storage: StorageConfig {
            path: expand_home(&settings.storage.path),
        },
        ..settings
    })
}
