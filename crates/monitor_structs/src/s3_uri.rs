//! `s3://bucket/key` locations.

use core::fmt;
use core::str::FromStr;

use object_store::path::Path as ObjectStorePath;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

const SCHEME: &str = "s3://";

/// Errors produced when parsing an S3 URI.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum S3UriError {
    #[error("S3 URI must start with s3://: {0}")]
    MissingScheme(String),

    #[error("S3 URI has no bucket: {0}")]
    MissingBucket(String),
}

/// A bucket plus a slash-separated key (or key prefix).
///
/// Keys are normalized: leading, trailing and repeated slashes are dropped,
/// so `s3://b/a//b/` and `s3://b/a/b` are the same location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct S3Uri {
    bucket: String,
    key: String,
}

impl S3Uri {
    /// Creates a URI from a bucket and key.
    pub fn new(bucket: impl Into<String>, key: impl AsRef<str>) -> Self {
        Self {
            bucket: bucket.into(),
            key: normalize_key(key.as_ref()),
        }
    }

    /// Returns the bucket name.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Returns the normalized key, empty for the bucket root.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Appends one or more slash-separated segments to the key.
    #[must_use]
    pub fn join(&self, segment: impl AsRef<str>) -> Self {
        let segment = normalize_key(segment.as_ref());
        if segment.is_empty() {
            return self.clone();
        }

        let key = if self.key.is_empty() {
            segment
        } else {
            format!("{}/{segment}", self.key)
        };

        Self {
            bucket: self.bucket.clone(),
            key,
        }
    }

    /// Returns the final key segment, if any.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.key.rsplit('/').next().filter(|s| !s.is_empty())
    }

    /// Converts the key into an object store path for the bucket's store.
    #[must_use]
    pub fn object_path(&self) -> ObjectStorePath {
        ObjectStorePath::from(self.key.as_str())
    }
}

fn normalize_key(key: &str) -> String {
    key.split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

impl fmt::Display for S3Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.key.is_empty() {
            write!(f, "{SCHEME}{}", self.bucket)
        } else {
            write!(f, "{SCHEME}{}/{}", self.bucket, self.key)
        }
    }
}

impl FromStr for S3Uri {
    type Err = S3UriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .trim()
            .strip_prefix(SCHEME)
            .ok_or_else(|| S3UriError::MissingScheme(s.to_string()))?;

        let (bucket, key) = rest.split_once('/').unwrap_or((rest, ""));
        if bucket.is_empty() {
            return Err(S3UriError::MissingBucket(s.to_string()));
        }

        Ok(Self::new(bucket, key))
    }
}

impl Serialize for S3Uri {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for S3Uri {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
