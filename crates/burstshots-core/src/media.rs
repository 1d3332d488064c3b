//! Media items as returned by the photo library.
//!
//! A [`MediaItem`] is read-only data owned by the remote service. Only the
//! fields the burst page needs are kept: the creation time, the base image
//! URL used to build thumbnails, and the permalink.

use serde::{Deserialize, Serialize};

/// A photo or video returned by a media search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    /// Service-assigned identifier.
    pub id: String,

    /// Creation timestamp exactly as the service reported it
    /// (RFC 3339, e.g. `2020-01-01T10:00:00Z`).
    ///
    /// `None` when the item carries no creation metadata.
    pub creation_time: Option<String>,

    /// Base URL of the image bytes. Size parameters are appended to it.
    pub base_url: String,

    /// Permalink to the item in the photo library web UI.
    pub product_url: String,

    /// Original file name, if known.
    pub filename: Option<String>,

    /// MIME type, if known.
    pub mime_type: Option<String>,
}

impl MediaItem {
    /// Creates a media item with the required URLs and no metadata.
    pub fn new(
        id: impl Into<String>,
        base_url: impl Into<String>,
        product_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            creation_time: None,
            base_url: base_url.into(),
            product_url: product_url.into(),
            filename: None,
            mime_type: None,
        }
    }

    /// Builder method to set the creation time.
    pub fn with_creation_time(mut self, creation_time: impl Into<String>) -> Self {
        self.creation_time = Some(creation_time.into());
        self
    }

    /// Builder method to set the file name.
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Builder method to set the MIME type.
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}
