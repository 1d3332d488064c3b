//! The `serve` command.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info, warn};

use burstshots_photos::google::GooglePhotosProvider;
use burstshots_photos::{ErrorLibrary, PhotoLibrary, PhotosError};

use crate::config::{GoogleSettings, ServerConfig};
use crate::error::{ServerError, ServerResult};
use crate::signals::Shutdown;
use crate::{AppState, build_router};

/// Runs the HTTP server until a termination signal arrives.
pub async fn run(config: &ServerConfig) -> ServerResult<()> {
    let library = open_library(&config.google);
    let app = build_router(AppState::new(library));

    let listener = TcpListener::bind(config.server.bind).await?;
    info!(
        "burstshots v{} listening on http://{}",
        env!("CARGO_PKG_VERSION"),
        listener.local_addr()?
    );

    let shutdown = Shutdown::new();
    shutdown.spawn_listener();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.wait())
        .await?;

    info!("server stopped");
    Ok(())
}

/// Builds the Google Photos library.
///
/// A library that cannot be built is replaced by one that fails every
/// search with the same error, so the server still starts and each request
/// answers 500.
pub fn open_library(settings: &GoogleSettings) -> Arc<dyn PhotoLibrary> {
    let provider = settings
        .to_provider_config()
        .and_then(|config| GooglePhotosProvider::new(config).map_err(ServerError::from));

    match provider {
        Ok(provider) => {
            if !provider.is_authenticated() {
                warn!(
                    "{} has no usable token; the first request will start authorization \
                     (or run `burstshots auth`)",
                    provider.name()
                );
            }
            Arc::new(provider)
        }
        Err(e) => {
            error!("photo library unavailable: {}", e);
            Arc::new(ErrorLibrary::new(
                settings.provider_name(),
                PhotosError::configuration(e.to_string()),
            ))
        }
    }
}
