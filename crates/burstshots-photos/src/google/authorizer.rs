//! Credential acquisition for one Google identity.
//!
//! [`GoogleAuthorizer::authorize`] hands out an access token for the
//! configured scopes, trying in order:
//!
//! 1. the stored token, if it is unexpired and covers the scopes
//! 2. a refresh-token grant, if a refresh token is stored
//! 3. the interactive PKCE flow in the browser
//!
//! Steps 2 and 3 run under a mutex so concurrent requests never start two
//! consent flows for the same identity.

use std::path::Path;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{PhotosError, PhotosResult};

use super::config::GoogleConfig;
use super::oauth::OAuthClient;
use super::tokens::{TokenInfo, TokenStorage};

/// Obtains and caches OAuth tokens for one identity.
#[derive(Debug)]
pub struct GoogleAuthorizer {
    scopes: Vec<String>,
    loopback_port_range: (u16, u16),
    token_storage: TokenStorage,
    oauth_client: OAuthClient,
    flow_lock: Mutex<()>,
}

impl GoogleAuthorizer {
    /// Creates an authorizer and loads any stored tokens.
    ///
    /// An unreadable token file is logged and treated as absent; the next
    /// authorization overwrites it.
    pub fn new(config: &GoogleConfig) -> PhotosResult<Self> {
        config.validate().map_err(PhotosError::configuration)?;

        let token_storage = TokenStorage::new(&config.token_path);
        if let Err(e) = token_storage.load() {
            warn!("ignoring stored tokens: {}", e);
        }

        let oauth_client = OAuthClient::new(
            config.credentials.clone(),
            config.timeout,
            &config.user_agent,
        )?;

        Ok(Self {
            scopes: config.scopes.clone(),
            loopback_port_range: config.loopback_port_range,
            token_storage,
            oauth_client,
            flow_lock: Mutex::new(()),
        })
    }

    /// Overrides the OAuth token endpoint.
    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.oauth_client = self.oauth_client.with_token_url(url);
        self
    }

    /// Returns a token valid for the configured scopes.
    ///
    /// # Errors
    ///
    /// Fails when the interactive flow fails or the token file cannot be
    /// written. A failed refresh falls through to the interactive flow.
    pub async fn authorize(&self) -> PhotosResult<TokenInfo> {
        if let Some(tokens) = self.usable_token() {
            return Ok(tokens);
        }

        let _guard = self.flow_lock.lock().await;

        // Another request may have finished a flow while we waited
        if let Some(tokens) = self.usable_token() {
            return Ok(tokens);
        }

        if let Some(tokens) = self.refresh().await? {
            return Ok(tokens);
        }

        self.authorize_interactive().await
    }

    /// Discards stored tokens and runs the interactive flow.
    pub async fn reauthorize(&self) -> PhotosResult<TokenInfo> {
        let _guard = self.flow_lock.lock().await;
        self.token_storage.clear()?;
        self.authorize_interactive().await
    }

    /// Returns true if a stored token can be used without any network call.
    pub fn has_valid_token(&self) -> bool {
        self.usable_token().is_some()
    }

    /// Path of the token file.
    pub fn token_path(&self) -> &Path {
        self.token_storage.path()
    }

    fn usable_token(&self) -> Option<TokenInfo> {
        self.token_storage.usable(&self.scopes)
    }

    /// `Ok(None)` means refreshing is not possible and consent is needed.
    async fn refresh(&self) -> PhotosResult<Option<TokenInfo>> {
        let Some(refresh_token) = self.token_storage.refresh_token(&self.scopes) else {
            return Ok(None);
        };

        debug!("refreshing expired access token");
        match self.oauth_client.refresh_token(&refresh_token).await {
            Ok((access_token, expires_in)) => self
                .token_storage
                .update_access_token(access_token, expires_in)
                .map(Some),
            Err(e) => {
                warn!("token refresh failed: {}", e);
                Ok(None)
            }
        }
    }

    async fn authorize_interactive(&self) -> PhotosResult<TokenInfo> {
        info!(
            "authorization required, tokens will be stored in {:?}",
            self.token_storage.path()
        );
        let tokens = self
            .oauth_client
            .authorize(&self.scopes, self.loopback_port_range)
            .await?;
        self.token_storage.set(tokens.clone())?;
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::google::config::OAuthCredentials;
    use chrono::{Duration, Utc};
    use wiremock::matchers::{body_string_contains, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(dir: &tempfile::TempDir) -> GoogleConfig {
        GoogleConfig::new(OAuthCredentials::new(
            "test-client.apps.googleusercontent.com",
            "test-secret",
        ))
        .with_token_dir(dir.path())
    }

    fn store(config: &GoogleConfig, tokens: TokenInfo) {
        TokenStorage::new(&config.token_path).set(tokens).unwrap();
    }

    #[test]
    fn invalid_config_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir).with_scopes(Vec::new());
        let err = GoogleAuthorizer::new(&config).unwrap_err();
        assert_eq!(err.code(), crate::PhotosErrorCode::ConfigurationError);
    }

    #[tokio::test]
    async fn cached_token_is_returned() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir);
        store(
            &config,
            TokenInfo::new("cached", None, Some(3600), config.scopes.clone()),
        );

        let authorizer = GoogleAuthorizer::new(&config).unwrap();
        assert!(authorizer.has_valid_token());
        let tokens = authorizer.authorize().await.unwrap();
        assert_eq!(tokens.access_token, "cached");
    }

    #[test]
    fn token_with_other_scopes_is_not_usable() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir);
        store(
            &config,
            TokenInfo::new("cached", None, None, vec!["other".to_string()]),
        );

        let authorizer = GoogleAuthorizer::new(&config).unwrap();
        assert!(!authorizer.has_valid_token());
    }

    #[test]
    fn corrupt_token_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir);
        std::fs::write(&config.token_path, "not json").unwrap();

        let authorizer = GoogleAuthorizer::new(&config).unwrap();
        assert!(!authorizer.has_valid_token());
        assert_eq!(authorizer.token_path(), config.token_path.as_path());
    }

    #[tokio::test]
    async fn expired_token_is_refreshed_and_persisted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("refresh_token=stored-refresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "refreshed",
                "expires_in": 3599
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir);
        let mut expired = TokenInfo::new(
            "stale",
            Some("stored-refresh".to_string()),
            Some(3600),
            config.scopes.clone(),
        );
        expired.expires_at = Some(Utc::now() - Duration::hours(1));
        store(&config, expired);

        let authorizer = GoogleAuthorizer::new(&config)
            .unwrap()
            .with_token_url(server.uri());
        assert!(!authorizer.has_valid_token());

        let tokens = authorizer.authorize().await.unwrap();
        assert_eq!(tokens.access_token, "refreshed");
        assert_eq!(tokens.refresh_token.as_deref(), Some("stored-refresh"));

        let reloaded = TokenStorage::new(&config.token_path);
        reloaded.load().unwrap();
        assert_eq!(reloaded.get().unwrap().access_token, "refreshed");
    }
}
