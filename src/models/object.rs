//! Addresses and listings for objects held in an object-storage service.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque bucket + key identifier of a stored blob.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectRef {
    /// Bucket name.
    pub bucket: String,

    /// Object key (path-like identifier within the bucket).
    pub key: String,
}

impl ObjectRef {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Same key, different bucket.
    pub fn in_bucket(&self, bucket: impl Into<String>) -> Self {
        Self::new(bucket, self.key.clone())
    }

    /// Last path segment of the key, usable as a local file name.
    pub fn file_name(&self) -> &str {
        self.key
            .rsplit('/')
            .find(|segment| !segment.is_empty())
            .unwrap_or("object")
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

/// One entry of a bucket listing.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ObjectSummary {
    pub key: String,
    pub size: i64,
}

/// What the storage service reported back after an upload.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct UploadReceipt {
    pub object: ObjectRef,
    pub etag: Option<String>,
    pub size: u64,
}
