//! Object store helpers keyed by [`S3Uri`].
//!
//! A [`Bucket`] pairs the store with the one bucket it serves. Locations in
//! any other bucket are rejected rather than resolved against the wrong one.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use monitor_structs::S3Uri;
use object_store::{ObjectStore, ObjectStoreExt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{MonitorError, Result, local_io};

/// An object store bound to a named bucket.
#[derive(Clone)]
pub struct Bucket {
    name: String,
    store: Arc<dyn ObjectStore>,
}

impl Bucket {
    #[must_use]
    pub fn new(name: impl Into<String>, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            name: name.into(),
            store,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Store path of `uri`, which must live in this bucket.
    fn path(&self, uri: &S3Uri) -> Result<object_store::path::Path> {
        if uri.bucket() != self.name {
            return Err(MonitorError::ForeignBucket {
                uri: uri.to_string(),
                bucket: self.name.clone(),
            });
        }
        Ok(uri.object_path())
    }
}

impl core::fmt::Debug for Bucket {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Bucket").field("name", &self.name).finish_non_exhaustive()
    }
}

/// A listed object and when it was last written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub uri: S3Uri,
    pub last_modified: DateTime<Utc>,
}

/// Lists every object under `prefix` with its modification time, sorted by key.
///
/// # Errors
///
/// Returns `ForeignBucket` for a prefix outside the bucket, or a storage error.
pub async fn list_stored(bucket: &Bucket, prefix: &S3Uri) -> Result<Vec<StoredObject>> {
    let path = bucket.path(prefix)?;
    let objects: Vec<_> = bucket.store.list(Some(&path)).try_collect().await?;

    let mut stored: Vec<StoredObject> = objects
        .into_iter()
        .map(|meta| StoredObject {
            uri: S3Uri::new(prefix.bucket(), meta.location.as_ref()),
            last_modified: meta.last_modified,
        })
        .collect();
    stored.sort_by(|a, b| a.uri.cmp(&b.uri));

    debug!(prefix = %prefix, objects = stored.len(), "Listed objects");
    Ok(stored)
}

/// Lists every object under `prefix`, sorted by key.
///
/// # Errors
///
/// Returns `ForeignBucket` for a prefix outside the bucket, or a storage error.
pub async fn list_objects(bucket: &Bucket, prefix: &S3Uri) -> Result<Vec<S3Uri>> {
    Ok(list_stored(bucket, prefix)
        .await?
        .into_iter()
        .map(|object| object.uri)
        .collect())
}

/// Downloads an object as bytes.
///
/// # Errors
///
/// Returns an error if the object is missing, outside the bucket, or cannot
/// be read.
pub async fn get_bytes(bucket: &Bucket, uri: &S3Uri) -> Result<bytes::Bytes> {
    let path = bucket.path(uri)?;
    let bytes = bucket.store.get(&path).await?.bytes().await?;
    Ok(bytes)
}

/// Downloads an object as UTF-8 text.
///
/// # Errors
///
/// Returns an error if the object cannot be read or is not UTF-8.
pub async fn get_text(bucket: &Bucket, uri: &S3Uri) -> Result<String> {
    let bytes = get_bytes(bucket, uri).await?;
    String::from_utf8(bytes.to_vec()).map_err(|e| MonitorError::malformed(uri, e))
}

/// Downloads and parses a JSON document.
///
/// # Errors
///
/// Returns `MalformedArtifact` if the document does not parse.
pub async fn get_json<T: DeserializeOwned>(bucket: &Bucket, uri: &S3Uri) -> Result<T> {
    let bytes = get_bytes(bucket, uri).await?;
    serde_json::from_slice(&bytes).map_err(|e| MonitorError::malformed(uri, e))
}

/// Uploads bytes to `uri`, replacing any existing object.
///
/// # Errors
///
/// Returns an error if `uri` is outside the bucket or the upload fails.
pub async fn put_bytes(bucket: &Bucket, uri: &S3Uri, data: bytes::Bytes) -> Result<()> {
    debug!(uri = %uri, bytes = data.len(), "Uploading object");
    let path = bucket.path(uri)?;
    bucket.store.put(&path, data.into()).await?;
    Ok(())
}

/// Uploads a value as pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if the upload fails.
pub async fn put_json<T: Serialize + Sync>(
    bucket: &Bucket,
    uri: &S3Uri,
    value: &T,
) -> Result<()> {
    let json = serde_json::to_vec_pretty(value).map_err(|e| MonitorError::malformed(uri, e))?;
    put_bytes(bucket, uri, json.into()).await
}

/// Uploads a local file to `uri`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or uploaded.
pub async fn upload_file(bucket: &Bucket, local: &Path, uri: &S3Uri) -> Result<()> {
    let data = tokio::fs::read(local)
        .await
        .map_err(local_io(local))?;
    put_bytes(bucket, uri, data.into()).await
}

/// Downloads every object under `prefix` into `local_dir`, keeping the
/// relative key layout.
///
/// # Errors
///
/// Returns an error if listing, downloading or writing fails.
pub async fn download_prefix(
    bucket: &Bucket,
    prefix: &S3Uri,
    local_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    for uri in list_objects(bucket, prefix).await? {
        let relative = uri
            .key()
            .strip_prefix(prefix.key())
            .unwrap_or(uri.key())
            .trim_start_matches('/');
        let target = local_dir.join(relative);

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(local_io(parent))?;
        }

        let data = get_bytes(bucket, &uri).await?;
        tokio::fs::write(&target, &data)
            .await
            .map_err(local_io(&target))?;
        written.push(target);
    }

    Ok(written)
}
