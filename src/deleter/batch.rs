use tracing::{error, info, warn};

use crate::storage::{BlobBatch, BlobStorage};
use crate::types::{BlobDeleteRequest, DeletionSummary};

/// Executes one chunk of delete requests as a single batch call against one
/// storage account.
///
/// Per-request failures (unqueueable requests, failed sub-responses) are
/// recorded in the returned summary instead of failing the chunk; only the
/// summary tells the two outcomes apart.
pub struct BatchDeleter {
    storage: BlobStorage,
}

impl BatchDeleter {
    pub fn new(storage: BlobStorage) -> Self {
        Self { storage }
    }

    pub async fn execute(
        &self,
        requests: &[BlobDeleteRequest],
        snapshot_before_delete: bool,
    ) -> DeletionSummary {
        let mut summary = DeletionSummary::default();
        let mut batch = BlobBatch::new();
        let mut submitted: Vec<&BlobDeleteRequest> = Vec::with_capacity(requests.len());

        for request in requests {
            if snapshot_before_delete {
                self.create_snapshot_best_effort(request).await;
            }

            match batch.add_delete(&request.container, &request.blob) {
                Ok(()) => submitted.push(request),
                Err(e) => {
                    error!(
                        account = request.account,
                        container = request.container,
                        blob = request.blob,
                        line_number = request.line_number,
                        error = %e,
                        "request could not be queued."
                    );
                    summary.record_failure(format!(
                        "Failed to queue delete of blob {} from container {} ({}): {}",
                        request.blob,
                        request.container,
                        request.line_context(),
                        e
                    ));
                }
            }
        }

        if submitted.is_empty() {
            return summary;
        }

        let sub_responses = match self.storage.delete_batch(batch).await {
            Ok(sub_responses) => sub_responses,
            Err(e) => {
                error!(
                    account = self.storage.account(),
                    submitted = submitted.len(),
                    error = %e,
                    "batch submission failed."
                );
                for request in &submitted {
                    summary.record_failure(format!(
                        "Failed to delete blob {} from container {} ({}): batch submission error: {}",
                        request.blob,
                        request.container,
                        request.line_context(),
                        e
                    ));
                }
                return summary;
            }
        };

        if sub_responses.len() != submitted.len() {
            warn!(
                account = self.storage.account(),
                submitted = submitted.len(),
                returned = sub_responses.len(),
                "sub-response count does not match the submitted batch."
            );
        }

        for (request, sub_response) in submitted.iter().zip(sub_responses.iter()) {
            if sub_response.is_success() {
                info!(
                    account = request.account,
                    container = request.container,
                    blob = request.blob,
                    "blob deleted."
                );
                summary.record_success(format!(
                    "Deleted blob {} from container {} ({})",
                    request.blob,
                    request.container,
                    request.line_context()
                ));
            } else {
                let error_code = sub_response.error_code.as_deref().unwrap_or("unknown");
                error!(
                    account = request.account,
                    container = request.container,
                    blob = request.blob,
                    status = sub_response.status,
                    error_code = error_code,
                    "blob delete failed."
                );
                summary.record_failure(format!(
                    "Failed to delete blob {} from container {} ({}): status {} {}",
                    request.blob,
                    request.container,
                    request.line_context(),
                    sub_response.status,
                    error_code
                ));
            }
        }

        summary
    }

    /// Snapshot a blob before its delete is queued. Never blocks the delete:
    /// a missing container or blob is a warning, any other snapshot failure
    /// is traced and the delete proceeds.
    async fn create_snapshot_best_effort(&self, request: &BlobDeleteRequest) {
        if let Err(e) = self.try_create_snapshot(request).await {
            error!(
                account = request.account,
                container = request.container,
                blob = request.blob,
                error = %e,
                "snapshot failed, proceeding with delete."
            );
        }
    }

    async fn try_create_snapshot(&self, request: &BlobDeleteRequest) -> anyhow::Result<()> {
        if !self.storage.container_exists(&request.container).await? {
            warn!(
                account = request.account,
                container = request.container,
                "container not found, skipping snapshot."
            );
            return Ok(());
        }

        if !self
            .storage
            .blob_exists(&request.container, &request.blob)
            .await?
        {
            warn!(
                account = request.account,
                container = request.container,
                blob = request.blob,
                "blob not found, skipping snapshot."
            );
            return Ok(());
        }

        let snapshot = self
            .storage
            .create_snapshot(&request.container, &request.blob)
            .await?;
        info!(
            account = request.account,
            container = request.container,
            blob = request.blob,
            snapshot = snapshot,
            "snapshot created."
        );
        Ok(())
    }
}
