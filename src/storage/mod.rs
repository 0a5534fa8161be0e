pub mod azure;

use std::sync::Arc;

use anyhow::{Result, bail};
use async_trait::async_trait;
use dyn_clone::DynClone;

use crate::config::{Config, MAX_BATCH_SIZE};

/// One sub-response of a batch call, in submission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubResponse {
    pub status: u16,
    pub error_code: Option<String>,
}

impl SubResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A single delete sub-operation queued into a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOp {
    pub container: String,
    pub blob: String,
}

/// An ordered collection of delete sub-operations for one storage account.
///
/// A batch holds at most [`MAX_BATCH_SIZE`] operations. Sub-responses of a
/// submitted batch correspond to operations by position.
#[derive(Debug, Clone, Default)]
pub struct BlobBatch {
    ops: Vec<DeleteOp>,
}

impl BlobBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a delete sub-operation. Fails on blank names or a full batch;
    /// a failed add leaves the batch unchanged.
    pub fn add_delete(&mut self, container: &str, blob: &str) -> Result<()> {
        if container.trim().is_empty() {
            bail!("container name must not be blank");
        }
        if blob.trim().is_empty() {
            bail!("blob name must not be blank");
        }
        if self.ops.len() >= MAX_BATCH_SIZE as usize {
            bail!("batch is full: at most {} sub-operations", MAX_BATCH_SIZE);
        }

        self.ops.push(DeleteOp {
            container: container.to_string(),
            blob: blob.to_string(),
        });
        Ok(())
    }

    pub fn ops(&self) -> &[DeleteOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

#[async_trait]
pub trait BlobStorageTrait: DynClone {
    /// The storage account this client is bound to.
    fn account(&self) -> &str;

    /// Submit a batch of deletes and return one sub-response per queued
    /// operation, in submission order.
    async fn delete_batch(&self, batch: BlobBatch) -> Result<Vec<SubResponse>>;

    async fn container_exists(&self, container: &str) -> Result<bool>;

    async fn blob_exists(&self, container: &str, blob: &str) -> Result<bool>;

    /// Create a snapshot of a blob, returning the snapshot identifier.
    async fn create_snapshot(&self, container: &str, blob: &str) -> Result<String>;
}

pub type BlobStorage = Box<dyn BlobStorageTrait + Send + Sync>;

dyn_clone::clone_trait_object!(BlobStorageTrait);

/// Builds a storage client for one account; replaceable in tests.
pub type StorageFactory = Arc<dyn Fn(&str, &Config) -> Result<BlobStorage> + Send + Sync>;

pub fn create_storage(account: &str, config: &Config) -> Result<BlobStorage> {
    let storage = azure::AzureBlobStorage::new(account, config.credential.clone())?;
    Ok(Box::new(storage))
}
