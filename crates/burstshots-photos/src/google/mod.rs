//! Google Photos library implementation.
//!
//! [`GooglePhotosProvider`] searches a Google Photos library through the
//! Photos Library API.
//!
//! # Authorization
//!
//! Google requires installed applications to bring their own OAuth client,
//! loaded from a client-secret JSON file. On first use:
//!
//! 1. A callback server is bound on `127.0.0.1` within a port range
//! 2. The browser opens Google's consent page with a PKCE challenge
//! 3. Google redirects back with an authorization code
//! 4. The code is exchanged for tokens, stored per identity
//!
//! Later requests reuse the stored token and refresh it when it expires.
//!
//! # Example
//!
//! ```ignore
//! use burstshots_photos::google::{GoogleConfig, GooglePhotosProvider, OAuthCredentials};
//!
//! let credentials = OAuthCredentials::from_file("client_secret.json")?;
//! let config = GoogleConfig::new(credentials).with_token_dir("token.json");
//! let provider = GooglePhotosProvider::new(config)?;
//!
//! let response = provider.search(SearchRequest::backward_from(start_date, None)).await?;
//! ```

mod authorizer;
mod client;
mod config;
mod oauth;
mod provider;
mod tokens;

pub use authorizer::GoogleAuthorizer;
pub use client::GooglePhotosClient;
pub use config::{GoogleConfig, OAuthCredentials};
pub use oauth::{OAuthClient, PkceFlow};
pub use provider::GooglePhotosProvider;
pub use tokens::{TokenInfo, TokenStorage};
