//! Shared state handed to every request handler.

use crate::{models::bucket::BucketRef, services::storage_service::StorageService};
use std::sync::Arc;

/// Immutable for the life of the process; clones share everything.
#[derive(Clone)]
pub struct AppState {
    pub bucket: Arc<BucketRef>,
    pub storage: StorageService,
}

impl AppState {
    pub fn new(bucket: BucketRef, storage: StorageService) -> Self {
        Self {
            bucket: Arc::new(bucket),
            storage,
        }
    }
}
