//! Google Photos library implementation.
//!
//! This module implements the [`PhotoLibrary`] trait for Google Photos.

use tracing::debug;

use burstshots_core::{SearchRequest, SearchResponse};

use crate::error::PhotosResult;
use crate::library::{BoxFuture, PhotoLibrary};

use super::authorizer::GoogleAuthorizer;
use super::client::GooglePhotosClient;
use super::config::GoogleConfig;

/// Google Photos library.
///
/// Each search authorizes first (usually a cached token) and then issues a
/// single `mediaItems:search` call.
#[derive(Debug)]
pub struct GooglePhotosProvider {
    name: String,
    authorizer: GoogleAuthorizer,
    client: GooglePhotosClient,
}

impl GooglePhotosProvider {
    /// Creates a new Google Photos provider with the given configuration.
    ///
    /// Stored tokens are loaded but no authorization is attempted yet.
    pub fn new(config: GoogleConfig) -> PhotosResult<Self> {
        let authorizer = GoogleAuthorizer::new(&config)?;
        let client =
            GooglePhotosClient::new(config.timeout, &config.user_agent, &config.api_base_url)?;

        Ok(Self::from_parts(config.provider_name(), authorizer, client))
    }

    /// Assembles a provider from an authorizer and a client.
    pub fn from_parts(
        name: impl Into<String>,
        authorizer: GoogleAuthorizer,
        client: GooglePhotosClient,
    ) -> Self {
        Self {
            name: name.into(),
            authorizer,
            client,
        }
    }

    /// Returns the authorizer, for running the consent flow ahead of time.
    pub fn authorizer(&self) -> &GoogleAuthorizer {
        &self.authorizer
    }
}

impl PhotoLibrary for GooglePhotosProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn search(&self, request: SearchRequest) -> BoxFuture<'_, PhotosResult<SearchResponse>> {
        Box::pin(async move {
            let tokens = self
                .authorizer
                .authorize()
                .await
                .map_err(|e| e.with_provider(&self.name))?;

            debug!(
                "searching {} (page token: {})",
                self.name,
                request.page_token.is_some()
            );
            self.client
                .search(&tokens.access_token, &request)
                .await
                .map_err(|e| e.with_provider(&self.name))
        })
    }

    fn is_authenticated(&self) -> bool {
        self.authorizer.has_valid_token()
    }
}
