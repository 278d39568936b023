//! Storage-trigger event payload delivered to function handlers.
//!
//! Only the fields the handlers read are modelled; everything else in the
//! notification (event time, principal, request ids) is ignored on decode.

use serde::{Deserialize, Serialize};

use super::object::ObjectRef;

/// A batch of object-created notifications.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct S3Event {
    #[serde(rename = "Records", default)]
    pub records: Vec<S3EventRecord>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct S3EventRecord {
    pub s3: S3Entity,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct S3Entity {
    pub bucket: S3Bucket,
    pub object: S3Object,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct S3Bucket {
    pub name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct S3Object {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
}

impl S3EventRecord {
    /// Build a record pointing at `bucket`/`key`.
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            s3: S3Entity {
                bucket: S3Bucket { name: bucket.into() },
                object: S3Object {
                    key: key.into(),
                    size: None,
                },
            },
        }
    }

    /// The object this record refers to.
    pub fn object_ref(&self) -> ObjectRef {
        ObjectRef::new(&self.s3.bucket.name, &self.s3.object.key)
    }
}
