//! Represents a single inbound upload and the response returned for it.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A file extracted from an inbound request, consumed by exactly one
/// pipeline invocation.
#[derive(Clone, Debug)]
pub struct UploadRequest {
    /// Uploaded filename, used verbatim as the object name.
    pub filename: String,

    /// Full file body.
    pub content: Bytes,

    /// Declared MIME type of the part. Empty means the store default applies.
    pub content_type: String,
}

/// JSON body returned on a successful upload.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct UploadResponse {
    pub message: String,
    pub url: String,
}

impl UploadResponse {
    pub fn success(url: String) -> Self {
        Self {
            message: "upload success".into(),
            url,
        }
    }
}
