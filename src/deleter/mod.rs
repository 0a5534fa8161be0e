pub mod batch;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::{debug, info};

use crate::storage::BlobStorage;
use crate::types::token::PipelineCancellationToken;
use crate::types::{BlobDeleteRequest, DeletionSummary};

pub use batch::BatchDeleter;

/// One worker of an account's pool.
///
/// Workers of the same account share the request list and a cursor; each
/// claims the next unprocessed chunk with a single atomic add, so chunks
/// never overlap and every request is claimed exactly once across the pool.
pub struct AccountWorker {
    worker_index: u16,
    account: String,
    storage: BlobStorage,
    requests: Arc<Vec<BlobDeleteRequest>>,
    next_index: Arc<AtomicUsize>,
    batch_size: usize,
    snapshot_before_delete: bool,
    cancellation_token: PipelineCancellationToken,
}

impl AccountWorker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        worker_index: u16,
        account: impl Into<String>,
        storage: BlobStorage,
        requests: Arc<Vec<BlobDeleteRequest>>,
        next_index: Arc<AtomicUsize>,
        batch_size: usize,
        snapshot_before_delete: bool,
        cancellation_token: PipelineCancellationToken,
    ) -> Self {
        Self {
            worker_index,
            account: account.into(),
            storage,
            requests,
            next_index,
            batch_size,
            snapshot_before_delete,
            cancellation_token,
        }
    }

    pub async fn run(self) -> DeletionSummary {
        info!(
            account = self.account,
            worker_index = self.worker_index,
            "delete worker started."
        );

        let deleter = BatchDeleter::new(self.storage);
        let mut summary = DeletionSummary::default();

        loop {
            if self.cancellation_token.is_cancelled() {
                info!(
                    account = self.account,
                    worker_index = self.worker_index,
                    "delete worker cancelled."
                );
                break;
            }

            let start = self.next_index.fetch_add(self.batch_size, Ordering::SeqCst);
            if start >= self.requests.len() {
                break;
            }
            let end = (start + self.batch_size).min(self.requests.len());

            debug!(
                account = self.account,
                worker_index = self.worker_index,
                start = start,
                end = end,
                "processing chunk."
            );

            let chunk_summary = deleter
                .execute(&self.requests[start..end], self.snapshot_before_delete)
                .await;
            summary = summary.merge(chunk_summary);
        }

        info!(
            account = self.account,
            worker_index = self.worker_index,
            success_count = summary.success_count,
            failure_count = summary.failure_count,
            "delete worker finished."
        );

        summary
    }
}
