use async_trait::async_trait;
use serverless_kit::{
    models::object::{ObjectRef, ObjectSummary, UploadReceipt},
    services::object_store::{ObjectStore, ObjectStoreError, ObjectStoreResult},
};
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::Mutex,
};

/// Object store held in memory that remembers where each download went.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<BTreeMap<ObjectRef, Vec<u8>>>,
    downloads: Mutex<Vec<PathBuf>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, object: ObjectRef, bytes: Vec<u8>) {
        self.objects.lock().unwrap().insert(object, bytes);
    }

    pub fn get(&self, object: &ObjectRef) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(object).cloned()
    }

    pub fn download_paths(&self) -> Vec<PathBuf> {
        self.downloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn download(&self, object: &ObjectRef, dest: &Path) -> ObjectStoreResult<u64> {
        let bytes = self
            .get(object)
            .ok_or_else(|| ObjectStoreError::NotFound(object.clone()))?;
        tokio::fs::write(dest, &bytes).await?;
        self.downloads.lock().unwrap().push(dest.to_path_buf());
        Ok(bytes.len() as u64)
    }

    async fn upload(&self, src: &Path, object: &ObjectRef) -> ObjectStoreResult<UploadReceipt> {
        let bytes = tokio::fs::read(src).await?;
        let size = bytes.len() as u64;
        let etag = format!("{:x}", md5::compute(&bytes));
        self.put(object.clone(), bytes);
        Ok(UploadReceipt {
            object: object.clone(),
            etag: Some(etag),
            size,
        })
    }

    async fn list(&self, bucket: &str) -> ObjectStoreResult<Vec<ObjectSummary>> {
        Ok(self
            .objects
            .lock()
            .unwrap()
            .iter()
            .filter(|(object, _)| object.bucket == bucket)
            .map(|(object, bytes)| ObjectSummary {
                key: object.key.clone(),
                size: bytes.len() as i64,
            })
            .collect())
    }
}
