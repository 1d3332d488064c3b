//! Server configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/burstshots/config.toml` by default. Every section and key is
//! optional; a missing file means defaults throughout.
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1:5000"
//!
//! [google]
//! client_secret_path = "client_secret.json"
//! token_dir = "token.json"
//! identity = "user"
//!
//! [logging]
//! format = "compact"
//! level = "info"
//! ```

use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::Level;

use burstshots_core::{TracingConfig, TracingOutputFormat};
use burstshots_photos::google::{GoogleConfig, OAuthCredentials};

use crate::error::{ServerError, ServerResult};

/// Configuration for the burstshots server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener settings.
    pub server: ServerSettings,

    /// Google Photos settings.
    pub google: GoogleSettings,

    /// Log output settings.
    pub logging: LoggingSettings,
}

/// Listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Address the HTTP server binds to.
    pub bind: SocketAddr,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from((Ipv4Addr::LOCALHOST, 5000)),
        }
    }
}

/// Google Photos settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleSettings {
    /// OAuth client secret JSON downloaded from the Cloud Console.
    pub client_secret_path: PathBuf,

    /// Directory holding one token file per identity.
    pub token_dir: PathBuf,

    /// Identity the tokens are stored under.
    pub identity: String,

    /// OAuth scopes to request.
    pub scopes: Vec<String>,

    /// Timeout in seconds for token and search calls.
    pub timeout_secs: u64,

    /// Ports tried for the OAuth callback listener, inclusive.
    pub loopback_port_range: (u16, u16),

    /// Sent as the first product in the User-Agent header.
    pub application_name: String,

    /// Photos Library API base URL.
    pub api_base_url: String,
}

impl Default for GoogleSettings {
    fn default() -> Self {
        Self {
            client_secret_path: PathBuf::from("client_secret.json"),
            token_dir: PathBuf::from(GoogleConfig::DEFAULT_TOKEN_DIR),
            identity: GoogleConfig::DEFAULT_IDENTITY.to_string(),
            scopes: vec![GoogleConfig::DEFAULT_SCOPE.to_string()],
            timeout_secs: GoogleConfig::DEFAULT_TIMEOUT_SECS,
            loopback_port_range: (8080, 8090),
            application_name: "PhotoManagerWeb".to_string(),
            api_base_url: GoogleConfig::DEFAULT_API_BASE_URL.to_string(),
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Output format: `pretty`, `compact` or `json`.
    pub format: TracingOutputFormat,

    /// Default level when `RUST_LOG` is not set.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            format: TracingOutputFormat::Compact,
            level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from the default path, or defaults if absent.
    pub fn load() -> ServerResult<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> ServerResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ServerError::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| {
            ServerError::config(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("burstshots")
            .join("config.toml")
    }

    /// Builds the tracing setup; `debug` overrides the configured level and format.
    pub fn tracing_config(&self, debug: bool) -> ServerResult<TracingConfig> {
        if debug {
            return Ok(TracingConfig::debug());
        }

        let level: Level = self.logging.level.parse().map_err(|_| {
            ServerError::config(format!("invalid log level '{}'", self.logging.level))
        })?;
        Ok(TracingConfig::server()
            .with_level(level)
            .with_format(self.logging.format))
    }
}

impl GoogleSettings {
    /// Reads the client secret file and builds the library configuration.
    pub fn to_provider_config(&self) -> ServerResult<GoogleConfig> {
        let credentials = OAuthCredentials::from_file(&self.client_secret_path).map_err(|e| {
            ServerError::config(format!("{}: {}", self.client_secret_path.display(), e))
        })?;

        let config = GoogleConfig::new(credentials)
            .with_identity(&self.identity)
            .with_token_dir(&self.token_dir)
            .with_scopes(self.scopes.clone())
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_loopback_port_range(self.loopback_port_range.0, self.loopback_port_range.1)
            .with_user_agent(format!(
                "{} burstshots/{}",
                self.application_name,
                env!("CARGO_PKG_VERSION")
            ))
            .with_api_base_url(&self.api_base_url);

        config.validate().map_err(ServerError::config)?;
        Ok(config)
    }

    /// Name the library reports, e.g. `google:user`.
    pub fn provider_name(&self) -> String {
        format!("google:{}", self.identity)
    }
}
