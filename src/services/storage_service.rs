//! src/services/storage_service.rs
//!
//! StorageService — writes one fully buffered upload into the configured
//! bucket. The remote store is reached through [`StoreClient`], which hands out
//! one [`WriteStream`] per object. An object is only committed when its stream
//! closes successfully; a failed write aborts the stream instead. The whole
//! open/write/commit sequence runs under a single deadline.

use crate::models::bucket::BucketRef;
use bytes::Bytes;
use futures::future::BoxFuture;
use object_store::{
    Attribute, Attributes, ObjectStore, buffered::BufWriter, gcp::GoogleCloudStorageBuilder,
    memory::InMemory, path::Path,
};
use std::{io, sync::Arc, time::Duration};
use thiserror::Error;
use tokio::{io::AsyncWriteExt, time::timeout};
use tracing::{debug, warn};

/// Budget for open + write + commit, measured from the first store call.
pub const DEFAULT_UPLOAD_DEADLINE: Duration = Duration::from_secs(50);

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to open `{bucket}/{object}`: {source}")]
    Open {
        bucket: String,
        object: String,
        #[source]
        source: io::Error,
    },
    #[error("write failed: {0}")]
    Write(#[source] io::Error),
    /// The object may or may not be visible remotely.
    #[error("commit failed: {0}")]
    Commit(#[source] io::Error),
    #[error("upload timed out after {0:?}")]
    Timeout(Duration),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Opens write streams against a remote bucket.
///
/// Implementations are shared by every in-flight upload and must not need
/// locking to do so.
pub trait StoreClient: Send + Sync {
    fn open(&self, bucket: &str, object_name: &str) -> io::Result<Box<dyn WriteStream>>;
}

/// A single object write. Nothing becomes visible until `close` succeeds.
pub trait WriteStream: Send {
    /// Must be called before the first `write`.
    fn set_content_type(&mut self, content_type: &str);

    fn write(&mut self, bytes: Bytes) -> BoxFuture<'_, io::Result<()>>;

    /// Commit the object.
    fn close(self: Box<Self>) -> BoxFuture<'static, io::Result<()>>;

    /// Discard everything written so far without committing.
    fn abort(self: Box<Self>) -> BoxFuture<'static, io::Result<()>>;
}

/// [`StoreClient`] backed by an `object_store` bucket handle.
///
/// The handle is built once for the configured bucket and reused, so
/// connections are pooled across uploads.
#[derive(Clone)]
pub struct ObjectStoreClient {
    bucket: String,
    store: Arc<dyn ObjectStore>,
}

impl ObjectStoreClient {
    pub fn new(bucket: &BucketRef, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            bucket: bucket.name().to_string(),
            store,
        }
    }

    /// Google Cloud Storage, with credentials taken from the ambient
    /// environment (`GOOGLE_APPLICATION_CREDENTIALS`, `GOOGLE_SERVICE_ACCOUNT`, ...).
    pub fn gcs(bucket: &BucketRef) -> object_store::Result<Self> {
        let store = GoogleCloudStorageBuilder::from_env()
            .with_bucket_name(bucket.name())
            .build()?;
        Ok(Self::new(bucket, Arc::new(store)))
    }

    /// Process-local store. Objects are lost on exit.
    pub fn in_memory(bucket: &BucketRef) -> Self {
        Self::new(bucket, Arc::new(InMemory::new()))
    }

    #[cfg(test)]
    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }
}

impl StoreClient for ObjectStoreClient {
    fn open(&self, bucket: &str, object_name: &str) -> io::Result<Box<dyn WriteStream>> {
        if bucket != self.bucket {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("client is bound to bucket `{}`", self.bucket),
            ));
        }

        Ok(Box::new(ObjectWriteStream {
            store: Arc::clone(&self.store),
            path: object_path(object_name)?,
            attributes: Attributes::new(),
            writer: None,
        }))
    }
}

/// Parse `object_name` into a store path without rewriting it.
///
/// Names the store cannot hold verbatim (`.` or `..` segments, empty
/// segments, a leading or trailing `/`) are refused rather than altered.
fn object_path(object_name: &str) -> io::Result<Path> {
    let path = Path::parse(object_name)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;
    if path.as_ref() != object_name {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("object name `{}` cannot be stored verbatim", object_name),
        ));
    }
    Ok(path)
}

/// Streams into `object_store`'s buffered writer, which switches to a
/// multipart upload once the payload outgrows its buffer.
struct ObjectWriteStream {
    store: Arc<dyn ObjectStore>,
    path: Path,
    attributes: Attributes,
    /// Created on first use so attributes set beforehand are applied.
    writer: Option<BufWriter>,
}

impl ObjectWriteStream {
    fn writer(&mut self) -> &mut BufWriter {
        let Self {
            store,
            path,
            attributes,
            writer,
        } = self;
        writer.get_or_insert_with(|| {
            BufWriter::new(Arc::clone(store), path.clone()).with_attributes(attributes.clone())
        })
    }
}

impl WriteStream for ObjectWriteStream {
    fn set_content_type(&mut self, content_type: &str) {
        self.attributes
            .insert(Attribute::ContentType, content_type.to_string().into());
    }

    fn write(&mut self, bytes: Bytes) -> BoxFuture<'_, io::Result<()>> {
        Box::pin(async move { self.writer().write_all(&bytes).await })
    }

    fn close(mut self: Box<Self>) -> BoxFuture<'static, io::Result<()>> {
        Box::pin(async move { self.writer().shutdown().await })
    }

    fn abort(self: Box<Self>) -> BoxFuture<'static, io::Result<()>> {
        let Self { writer, .. } = *self;
        Box::pin(async move {
            match writer {
                Some(mut writer) => writer.abort().await.map_err(io::Error::other),
                None => Ok(()),
            }
        })
    }
}

/// StorageService performs the bounded write of one object.
///
/// Cloning is cheap; every clone shares the same client.
#[derive(Clone)]
pub struct StorageService {
    client: Arc<dyn StoreClient>,
    deadline: Duration,
}

impl StorageService {
    pub fn new(client: Arc<dyn StoreClient>, deadline: Duration) -> Self {
        Self { client, deadline }
    }

    /// Write `bytes` to `bucket/object_name` and commit it.
    ///
    /// An empty `content_type` leaves the store default in place. If the
    /// deadline expires the in-flight operation is dropped; whatever the store
    /// already received is not cleaned up.
    pub async fn write(
        &self,
        bucket: &BucketRef,
        object_name: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> StorageResult<()> {
        let attempt = self.write_and_commit(bucket, object_name, bytes, content_type);
        match timeout(self.deadline, attempt).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    bucket = %bucket,
                    object = object_name,
                    deadline = ?self.deadline,
                    "store deadline exceeded, write cancelled"
                );
                Err(StorageError::Timeout(self.deadline))
            }
        }
    }

    async fn write_and_commit(
        &self,
        bucket: &BucketRef,
        object_name: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> StorageResult<()> {
        let mut stream =
            self.client
                .open(bucket.name(), object_name)
                .map_err(|source| StorageError::Open {
                    bucket: bucket.name().to_string(),
                    object: object_name.to_string(),
                    source,
                })?;

        if !content_type.is_empty() {
            stream.set_content_type(content_type);
        }

        let len = bytes.len();
        let written = stream.write(bytes).await;
        if let Err(err) = written {
            if let Err(abort_err) = stream.abort().await {
                debug!("abort after failed write of {} also failed: {}", object_name, abort_err);
            }
            return Err(StorageError::Write(err));
        }
        debug!("wrote {} bytes to {}/{}, committing", len, bucket, object_name);

        stream.close().await.map_err(StorageError::Commit)
    }
}
