//! PhotoLibrary trait definition.
//!
//! [`PhotoLibrary`] is the seam between the burst page and the remote
//! photo service. An implementation owns its credentials: `search` obtains
//! whatever authorization it needs before issuing the call, and fails as a
//! whole if it cannot.

use std::future::Future;
use std::pin::Pin;

use burstshots_core::{SearchRequest, SearchResponse};

use crate::error::{PhotosError, PhotosResult};

/// A boxed future for async trait methods.
///
/// Boxed futures keep the trait object safe so the server can hold an
/// `Arc<dyn PhotoLibrary>`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A searchable photo library.
///
/// # Example Implementation
///
/// ```ignore
/// impl PhotoLibrary for GooglePhotosProvider {
///     fn name(&self) -> &str { "google:user" }
///
///     fn search(&self, request: SearchRequest) -> BoxFuture<'_, PhotosResult<SearchResponse>> {
///         Box::pin(async move {
///             let token = self.authorizer.authorize().await?;
///             self.client.search(&token.access_token, &request).await
///         })
///     }
///
///     fn is_authenticated(&self) -> bool { self.authorizer.has_valid_token() }
/// }
/// ```
pub trait PhotoLibrary: Send + Sync {
    /// Returns the name of this library (e.g., "google:user").
    fn name(&self) -> &str;

    /// Runs one media search.
    ///
    /// Exactly one remote search call is made per invocation. Pagination is
    /// left to the caller through the request's page token.
    ///
    /// # Errors
    ///
    /// Returns `PhotosError` when authorization fails or the search call
    /// fails. There is no retry.
    fn search(&self, request: SearchRequest) -> BoxFuture<'_, PhotosResult<SearchResponse>>;

    /// Returns true if a usable access token is currently held.
    fn is_authenticated(&self) -> bool;
}

/// A library that always returns an error.
///
/// Installed when the real library cannot be constructed at startup, so
/// every request fails with the startup error instead of the server
/// refusing to run.
#[derive(Debug)]
pub struct ErrorLibrary {
    name: String,
    error: PhotosError,
}

impl ErrorLibrary {
    /// Creates a new error library.
    pub fn new(name: impl Into<String>, error: PhotosError) -> Self {
        Self {
            name: name.into(),
            error,
        }
    }
}

impl PhotoLibrary for ErrorLibrary {
    fn name(&self) -> &str {
        &self.name
    }

    fn search(&self, _request: SearchRequest) -> BoxFuture<'_, PhotosResult<SearchResponse>> {
        let error =
            PhotosError::new(self.error.code(), self.error.message()).with_provider(&self.name);
        Box::pin(async move { Err(error) })
    }

    fn is_authenticated(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PhotosErrorCode;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn error_library_returns_error() {
        let library = ErrorLibrary::new(
            "google:user",
            PhotosError::configuration("client secret file not found"),
        );

        assert_eq!(library.name(), "google:user");
        assert!(!library.is_authenticated());

        let request =
            SearchRequest::backward_from(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), None);
        let err = library.search(request).await.unwrap_err();
        assert_eq!(err.code(), PhotosErrorCode::ConfigurationError);
        assert_eq!(err.provider(), Some("google:user"));
        assert!(err.message().contains("client secret"));
    }
}
