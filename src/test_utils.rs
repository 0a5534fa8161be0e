use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use async_trait::async_trait;

use crate::config::{Config, InputSource};
use crate::storage::{BlobBatch, BlobStorageTrait, DeleteOp, SubResponse};
use crate::types::BlobDeleteRequest;

pub fn init_dummy_tracing_subscriber() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("dummy=trace")
        .try_init();
}

pub fn make_request(
    account: &str,
    container: &str,
    blob: &str,
    line_number: u64,
) -> BlobDeleteRequest {
    BlobDeleteRequest::new(
        account,
        container,
        blob,
        line_number,
        format!("{account},{container},{blob}"),
    )
}

pub fn make_test_config(content: &str) -> Config {
    Config {
        input: InputSource::Inline(content.to_string()),
        csv_has_header: false,
        ..Default::default()
    }
}

#[derive(Debug, Default)]
pub struct MockStorageState {
    pub delete_batches: Vec<Vec<DeleteOp>>,
    pub container_exists_calls: Vec<String>,
    pub blob_exists_calls: Vec<(String, String)>,
    pub snapshot_calls: Vec<(String, String)>,
}

/// In-memory storage double that records every call and answers from a
/// configurable per-blob response table.
#[derive(Clone)]
pub struct MockStorage {
    account: String,
    state: Arc<Mutex<MockStorageState>>,
    // blob name -> (status, error code); unlisted blobs succeed with 202.
    sub_response_overrides: Arc<HashMap<String, (u16, Option<String>)>>,
    fail_batch: bool,
    truncate_responses_to: Option<usize>,
    missing_containers: Arc<Vec<String>>,
    missing_blobs: Arc<Vec<String>>,
}

impl MockStorage {
    pub fn new(account: &str) -> Self {
        Self {
            account: account.to_string(),
            state: Arc::new(Mutex::new(MockStorageState::default())),
            sub_response_overrides: Arc::new(HashMap::new()),
            fail_batch: false,
            truncate_responses_to: None,
            missing_containers: Arc::new(Vec::new()),
            missing_blobs: Arc::new(Vec::new()),
        }
    }

    pub fn with_sub_response(mut self, blob: &str, status: u16, error_code: Option<&str>) -> Self {
        let mut overrides = (*self.sub_response_overrides).clone();
        overrides.insert(blob.to_string(), (status, error_code.map(str::to_string)));
        self.sub_response_overrides = Arc::new(overrides);
        self
    }

    pub fn with_failing_batch(mut self) -> Self {
        self.fail_batch = true;
        self
    }

    pub fn with_truncated_responses(mut self, keep: usize) -> Self {
        self.truncate_responses_to = Some(keep);
        self
    }

    pub fn with_missing_container(mut self, container: &str) -> Self {
        let mut missing = (*self.missing_containers).clone();
        missing.push(container.to_string());
        self.missing_containers = Arc::new(missing);
        self
    }

    pub fn with_missing_blob(mut self, blob: &str) -> Self {
        let mut missing = (*self.missing_blobs).clone();
        missing.push(blob.to_string());
        self.missing_blobs = Arc::new(missing);
        self
    }

    pub fn boxed(&self) -> crate::storage::BlobStorage {
        Box::new(self.clone())
    }

    pub fn delete_batches(&self) -> Vec<Vec<DeleteOp>> {
        self.state.lock().unwrap().delete_batches.clone()
    }

    pub fn snapshot_calls(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().snapshot_calls.clone()
    }

    pub fn blob_exists_calls(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().blob_exists_calls.clone()
    }

    pub fn container_exists_calls(&self) -> Vec<String> {
        self.state.lock().unwrap().container_exists_calls.clone()
    }
}

#[async_trait]
impl BlobStorageTrait for MockStorage {
    fn account(&self) -> &str {
        &self.account
    }

    async fn delete_batch(&self, batch: BlobBatch) -> Result<Vec<SubResponse>> {
        self.state
            .lock()
            .unwrap()
            .delete_batches
            .push(batch.ops().to_vec());

        if self.fail_batch {
            return Err(anyhow!("connection reset by peer"));
        }

        let mut sub_responses: Vec<SubResponse> = batch
            .ops()
            .iter()
            .map(|op| match self.sub_response_overrides.get(&op.blob) {
                Some((status, error_code)) => SubResponse {
                    status: *status,
                    error_code: error_code.clone(),
                },
                None => SubResponse {
                    status: 202,
                    error_code: None,
                },
            })
            .collect();

        if let Some(keep) = self.truncate_responses_to {
            sub_responses.truncate(keep);
        }

        Ok(sub_responses)
    }

    async fn container_exists(&self, container: &str) -> Result<bool> {
        self.state
            .lock()
            .unwrap()
            .container_exists_calls
            .push(container.to_string());
        Ok(!self.missing_containers.contains(&container.to_string()))
    }

    async fn blob_exists(&self, container: &str, blob: &str) -> Result<bool> {
        self.state
            .lock()
            .unwrap()
            .blob_exists_calls
            .push((container.to_string(), blob.to_string()));
        Ok(!self.missing_blobs.contains(&blob.to_string()))
    }

    async fn create_snapshot(&self, container: &str, blob: &str) -> Result<String> {
        self.state
            .lock()
            .unwrap()
            .snapshot_calls
            .push((container.to_string(), blob.to_string()));
        Ok("2026-01-01T00:00:00.0000000Z".to_string())
    }
}
