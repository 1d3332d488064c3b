//! Photo library access for the burst page.
//!
//! - [`PhotoLibrary`] - The seam the page handler searches through
//! - [`google`] - Google Photos: OAuth authorization, token storage and the
//!   `mediaItems:search` client
//! - [`PhotosError`] - Error type for authorization and search failures
//!
//! # Example
//!
//! ```ignore
//! use burstshots_photos::PhotoLibrary;
//!
//! async fn first_page(library: &dyn PhotoLibrary, start: NaiveDate) -> PhotosResult<SearchResponse> {
//!     library.search(SearchRequest::backward_from(start, None)).await
//! }
//! ```

pub mod error;
pub mod google;
pub mod library;

pub use error::{PhotosError, PhotosErrorCode, PhotosResult};
pub use library::{BoxFuture, ErrorLibrary, PhotoLibrary};
