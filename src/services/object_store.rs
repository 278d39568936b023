//! src/services/object_store.rs
//!
//! Download / upload / list against an object-storage service. The
//! `ObjectStore` trait is the seam handlers are written against; the S3
//! implementation lives here too.

use crate::models::object::{ObjectRef, ObjectSummary, UploadReceipt};
use async_trait::async_trait;
use aws_sdk_s3::{error::DisplayErrorContext, primitives::ByteStream};
use base64::{Engine as _, engine::general_purpose};
use bytes::Bytes;
use std::{io, path::Path};
use thiserror::Error;
use tokio::{fs, io::AsyncWriteExt};
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("object `{0}` not found")]
    NotFound(ObjectRef),
    #[error("{op} failed for `{target}`: {message}")]
    Backend {
        op: &'static str,
        target: String,
        message: String,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type ObjectStoreResult<T> = Result<T, ObjectStoreError>;

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch `object` into `dest`, returning the number of bytes written.
    async fn download(&self, object: &ObjectRef, dest: &Path) -> ObjectStoreResult<u64>;

    /// Store the contents of `src` under `object`.
    async fn upload(&self, src: &Path, object: &ObjectRef) -> ObjectStoreResult<UploadReceipt>;

    /// Every object in `bucket`, in the order the service returns them.
    async fn list(&self, bucket: &str) -> ObjectStoreResult<Vec<ObjectSummary>>;
}

/// Base64 of the MD5 digest, the form the `Content-MD5` header expects.
pub fn content_md5(payload: &[u8]) -> String {
    general_purpose::STANDARD.encode(md5::compute(payload).0)
}

/// Upload a local file, then list the destination bucket and return its keys.
pub async fn upload_and_list<S>(
    store: &S,
    local_file: &Path,
    object: &ObjectRef,
) -> ObjectStoreResult<Vec<String>>
where
    S: ObjectStore + ?Sized,
{
    let receipt = store.upload(local_file, object).await?;
    info!(
        object = %receipt.object,
        size = receipt.size,
        etag = receipt.etag.as_deref().unwrap_or(""),
        "uploaded file"
    );

    let keys = store
        .list(&object.bucket)
        .await?
        .into_iter()
        .map(|summary| summary.key)
        .collect();
    Ok(keys)
}

/// `ObjectStore` backed by Amazon S3.
#[derive(Clone)]
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
}

impl S3ObjectStore {
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }

    /// Build a client from the ambient AWS configuration (env, profile,
    /// instance role).
    pub async fn from_env() -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(aws_sdk_s3::Client::new(&config))
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn download(&self, object: &ObjectRef, dest: &Path) -> ObjectStoreResult<u64> {
        let output = self
            .client
            .get_object()
            .bucket(&object.bucket)
            .key(&object.key)
            .send()
            .await
            .map_err(|err| {
                let service_err = err.as_service_error();
                if service_err.is_some_and(|e| e.is_no_such_key()) {
                    ObjectStoreError::NotFound(object.clone())
                } else {
                    backend("GetObject", object, DisplayErrorContext(&err))
                }
            })?;

        let written = write_body(output.body, dest).await?;
        debug!(object = %object, path = %dest.display(), bytes = written, "downloaded object");
        Ok(written)
    }

    async fn upload(&self, src: &Path, object: &ObjectRef) -> ObjectStoreResult<UploadReceipt> {
        let payload = Bytes::from(fs::read(src).await?);
        let size = payload.len() as u64;
        let checksum = content_md5(&payload);

        let output = self
            .client
            .put_object()
            .bucket(&object.bucket)
            .key(&object.key)
            .content_md5(checksum)
            .body(ByteStream::from(payload))
            .send()
            .await
            .map_err(|err| backend("PutObject", object, DisplayErrorContext(&err)))?;

        Ok(UploadReceipt {
            object: object.clone(),
            etag: output.e_tag().map(|tag| tag.trim_matches('"').to_string()),
            size,
        })
    }

    async fn list(&self, bucket: &str) -> ObjectStoreResult<Vec<ObjectSummary>> {
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .into_paginator()
            .send();

        let mut summaries = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|err| ObjectStoreError::Backend {
                op: "ListObjectsV2",
                target: bucket.to_string(),
                message: DisplayErrorContext(&err).to_string(),
            })?;
            for entry in page.contents() {
                if let Some(key) = entry.key() {
                    summaries.push(ObjectSummary {
                        key: key.to_string(),
                        size: entry.size().unwrap_or_default(),
                    });
                }
            }
        }
        Ok(summaries)
    }
}

/// Stream an object body into `dest` chunk by chunk.
async fn write_body(body: ByteStream, dest: &Path) -> io::Result<u64> {
    let reader = body.into_async_read();
    tokio::pin!(reader);
    let mut file = fs::File::create(dest).await?;
    let written = tokio::io::copy(&mut reader, &mut file).await?;
    file.flush().await?;
    Ok(written)
}

fn backend(op: &'static str, object: &ObjectRef, err: impl std::fmt::Display) -> ObjectStoreError {
    ObjectStoreError::Backend {
        op,
        target: object.to_string(),
        message: err.to_string(),
    }
}
