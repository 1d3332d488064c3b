//! Google Photos configuration: OAuth client credentials and provider settings.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// OAuth 2.0 credentials for Google API access.
///
/// Users must provide their own OAuth client ID and secret, as Google
/// requires registered applications for API access.
#[derive(Debug, Clone)]
pub struct OAuthCredentials {
    /// The OAuth 2.0 client ID from Google Cloud Console.
    pub client_id: String,
    /// The OAuth 2.0 client secret from Google Cloud Console.
    pub client_secret: String,
}

/// Structure of Google's OAuth credentials JSON file.
///
/// Supports multiple formats:
/// 1. Google Cloud Console format with "installed" or "web" section
/// 2. Flat format with client_id and client_secret at root level (e.g., from gcloud)
#[derive(Debug, Deserialize)]
pub struct GoogleCredentialsFile {
    /// Credentials for installed (desktop) applications.
    pub installed: Option<NestedCredentials>,
    /// Credentials for web applications.
    pub web: Option<NestedCredentials>,
    /// Direct client_id (flat format).
    pub client_id: Option<String>,
    /// Direct client_secret (flat format).
    pub client_secret: Option<String>,
}

/// OAuth credentials within a nested section of the credentials JSON file.
#[derive(Debug, Deserialize)]
pub struct NestedCredentials {
    /// The OAuth 2.0 client ID.
    pub client_id: String,
    /// The OAuth 2.0 client secret.
    pub client_secret: String,
    /// The project ID (optional, present in the JSON but not used).
    #[serde(default)]
    #[allow(dead_code)]
    pub project_id: Option<String>,
}

impl OAuthCredentials {
    /// Creates new OAuth credentials.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Loads OAuth credentials from a Google Cloud Console JSON file.
    ///
    /// The file should be the JSON downloaded from the Google Cloud Console
    /// OAuth 2.0 credentials page. It contains either an "installed" or "web"
    /// section with the client_id and client_secret.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| format!("failed to read credentials file: {}", e))?;
        Self::from_json(&content)
    }

    /// Parses OAuth credentials from a Google credentials JSON string.
    ///
    /// Supports multiple formats:
    /// 1. Google Cloud Console format: `{"installed": {"client_id": "...", "client_secret": "..."}}`
    /// 2. Flat format: `{"client_id": "...", "client_secret": "..."}`
    pub fn from_json(json: &str) -> Result<Self, String> {
        let file: GoogleCredentialsFile = serde_json::from_str(json)
            .map_err(|e| format!("failed to parse credentials JSON: {}", e))?;

        // Try nested format first (installed or web section)
        if let Some(creds) = file.installed.or(file.web) {
            return Ok(Self::new(creds.client_id, creds.client_secret));
        }

        // Try flat format (client_id and client_secret at root level)
        if let (Some(client_id), Some(client_secret)) = (file.client_id, file.client_secret) {
            return Ok(Self::new(client_id, client_secret));
        }

        Err("credentials file must contain 'installed'/'web' section or 'client_id'/'client_secret' at root level".to_string())
    }

    /// Validates that the credentials appear to be correctly formatted.
    ///
    /// This checks that:
    /// - Client ID ends with `.apps.googleusercontent.com`
    /// - Client secret is non-empty
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.client_id.is_empty() {
            return Err("client_id is required");
        }
        if !self.client_id.ends_with(".apps.googleusercontent.com") {
            return Err("client_id should end with .apps.googleusercontent.com");
        }
        if self.client_secret.is_empty() {
            return Err("client_secret is required");
        }
        Ok(())
    }
}

/// Configuration for the Google Photos library.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    /// Identity the tokens are stored under.
    ///
    /// Each identity gets its own token file. Defaults to `"user"`.
    pub identity: String,

    /// OAuth credentials for API access.
    pub credentials: OAuthCredentials,

    /// Path to the OAuth token file.
    ///
    /// Defaults to `token.json/google-tokens-{identity}.json` relative to
    /// the working directory.
    pub token_path: PathBuf,

    /// Request timeout for token and search calls.
    pub timeout: Duration,

    /// User agent string for API requests.
    pub user_agent: String,

    /// Port range for the loopback OAuth server.
    ///
    /// The OAuth flow will try to bind to ports in this range.
    /// Defaults to (8080, 8090).
    pub loopback_port_range: (u16, u16),

    /// OAuth scopes to request.
    ///
    /// Defaults to `["https://www.googleapis.com/auth/photoslibrary.readonly"]`.
    pub scopes: Vec<String>,

    /// Base URL of the Photos Library API, without a trailing slash.
    pub api_base_url: String,
}

impl GoogleConfig {
    /// Default timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Default OAuth scope for read-only library access.
    pub const DEFAULT_SCOPE: &'static str =
        "https://www.googleapis.com/auth/photoslibrary.readonly";

    /// Default identity name.
    pub const DEFAULT_IDENTITY: &'static str = "user";

    /// Default directory holding token files.
    pub const DEFAULT_TOKEN_DIR: &'static str = "token.json";

    /// Default Photos Library API base URL.
    pub const DEFAULT_API_BASE_URL: &'static str = "https://photoslibrary.googleapis.com";

    /// Creates a new Google configuration with the given credentials.
    pub fn new(credentials: OAuthCredentials) -> Self {
        Self {
            identity: Self::DEFAULT_IDENTITY.to_string(),
            credentials,
            token_path: Self::default_token_path(
                Path::new(Self::DEFAULT_TOKEN_DIR),
                Self::DEFAULT_IDENTITY,
            ),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("burstshots/{}", env!("CARGO_PKG_VERSION")),
            loopback_port_range: (8080, 8090),
            scopes: vec![Self::DEFAULT_SCOPE.to_string()],
            api_base_url: Self::DEFAULT_API_BASE_URL.to_string(),
        }
    }

    /// Returns the token file path for an identity inside `token_dir`.
    pub fn default_token_path(token_dir: &Path, identity: &str) -> PathBuf {
        token_dir.join(format!("google-tokens-{}.json", identity))
    }

    /// Sets the identity.
    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        let identity = identity.into();
        // Follow the identity if the token path is still derived from the old one
        if let Some(dir) = self.token_path.parent().map(Path::to_path_buf)
            && self.token_path == Self::default_token_path(&dir, &self.identity)
        {
            self.token_path = Self::default_token_path(&dir, &identity);
        }
        self.identity = identity;
        self
    }

    /// Stores tokens in `token_dir`, keeping the per-identity file name.
    pub fn with_token_dir(mut self, token_dir: impl AsRef<Path>) -> Self {
        self.token_path = Self::default_token_path(token_dir.as_ref(), &self.identity);
        self
    }

    /// Returns the provider name for this identity (e.g. `"google:user"`).
    pub fn provider_name(&self) -> String {
        format!("google:{}", self.identity)
    }

    /// Sets the token storage path.
    pub fn with_token_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_path = path.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the user agent string.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Sets the loopback port range for OAuth.
    pub fn with_loopback_port_range(mut self, start: u16, end: u16) -> Self {
        self.loopback_port_range = (start, end);
        self
    }

    /// Sets the OAuth scopes.
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Sets the API base URL. A trailing slash is dropped.
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        self.credentials
            .validate()
            .map_err(|e| format!("invalid credentials: {}", e))?;

        if self.identity.trim().is_empty() {
            return Err("identity must not be empty".to_string());
        }

        if self.scopes.is_empty() {
            return Err("at least one OAuth scope is required".to_string());
        }

        if self.loopback_port_range.0 > self.loopback_port_range.1 {
            return Err("invalid loopback port range".to_string());
        }

        url::Url::parse(&self.api_base_url)
            .map_err(|e| format!("invalid API base URL '{}': {}", self.api_base_url, e))?;

        Ok(())
    }
}
