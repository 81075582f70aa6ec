//! Core data models for the uploader.
//!
//! `BucketRef` is resolved once at startup and shared read-only; the upload
//! types live for a single request.

pub mod bucket;
pub mod upload;
