//! Burst page web server.
//!
//! This crate provides the burstshots server:
//! - `GET /` renders burst groups from one page of a photo library search
//! - TOML configuration with command-line overrides
//! - `serve` and `auth` commands for the binary
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use burstshots_photos::{ErrorLibrary, PhotosError};
//! use burstshots_server::{AppState, build_router};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let library = Arc::new(ErrorLibrary::new("none", PhotosError::configuration("unset")));
//!     let app = build_router(AppState::new(library));
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:5000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use burstshots_photos::PhotoLibrary;

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod handler;
pub mod signals;

pub use config::{GoogleSettings, LoggingSettings, ServerConfig, ServerSettings};
pub use error::{ServerError, ServerResult};
pub use signals::Shutdown;

/// Application state shared across HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// The library every request searches.
    pub library: Arc<dyn PhotoLibrary>,
}

impl AppState {
    /// Creates new application state.
    pub fn new(library: Arc<dyn PhotoLibrary>) -> Self {
        Self { library }
    }
}

/// Builds the application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handler::burst_page))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
