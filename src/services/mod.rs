//! Upload pipeline services: the object store writer and public URL naming.

pub mod storage_service;
pub mod url_builder;
