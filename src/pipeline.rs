use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::config::{Config, MAX_BATCH_SIZE};
use crate::deleter::AccountWorker;
use crate::reader::DeleteRequestReader;
use crate::storage::{self, StorageFactory};
use crate::types::error::BlobRmError;
use crate::types::token::PipelineCancellationToken;
use crate::types::{BlobDeleteRequest, DeletionSummary};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(120);

/// Orchestrates one deletion run: reads the work list, groups requests by
/// storage account, and drives per-account worker pools under one global
/// concurrency ceiling.
pub struct DeletionPipeline {
    config: Config,
    cancellation_token: PipelineCancellationToken,
    storage_factory: StorageFactory,
}

impl DeletionPipeline {
    pub fn new(config: Config, cancellation_token: PipelineCancellationToken) -> Self {
        Self {
            config,
            cancellation_token,
            storage_factory: Arc::new(storage::create_storage),
        }
    }

    #[cfg(test)]
    fn with_storage_factory(mut self, storage_factory: StorageFactory) -> Self {
        self.storage_factory = storage_factory;
        self
    }

    /// Read the configured work list and delete everything it names.
    pub async fn run(&self) -> Result<DeletionSummary> {
        let reader = DeleteRequestReader::new(
            self.config.input.clone(),
            self.config.csv_separator.clone(),
            self.config.csv_has_header,
        );
        let source = reader.source_description();
        let requests = reader
            .read_all()
            .map_err(|e| BlobRmError::Source(format!("{source}: {e:#}")))?;

        info!(source = source, requests = requests.len(), "work list read.");

        self.execute(requests).await
    }

    /// Delete an already-built request list.
    ///
    /// The config is validated here as well, so a `Config` built directly
    /// (bypassing the CLI) is rejected before any client is constructed.
    pub async fn execute(&self, requests: Vec<BlobDeleteRequest>) -> Result<DeletionSummary> {
        self.validate_config()?;

        if requests.is_empty() {
            warn!("work list is empty, nothing to delete.");
            return Ok(DeletionSummary::default());
        }

        let batch_size = self.config.batch_size as usize;
        let worker_size = self.config.worker_size as usize;
        let groups = group_requests_by_account(requests);

        info!(
            accounts = groups.len(),
            batch_size = batch_size,
            worker_size = worker_size,
            "starting deletion."
        );

        // One permit pool for the whole run; a worker holds its permit for
        // its entire lifetime, so at most `worker_size` workers run at once
        // across all accounts.
        let permits = Arc::new(Semaphore::new(worker_size));
        let mut join_set: JoinSet<DeletionSummary> = JoinSet::new();

        for (account, account_requests) in groups {
            let storage_template = (self.storage_factory)(&account, &self.config)
                .map_err(|e| BlobRmError::AccountSetup {
                    account: account.clone(),
                    message: format!("{e:#}"),
                })?;

            let request_count = account_requests.len();
            let worker_count = worker_size.min(request_count.div_ceil(batch_size).max(1));
            let shared_requests = Arc::new(account_requests);
            let next_index = Arc::new(AtomicUsize::new(0));

            info!(
                account = account,
                requests = request_count,
                workers = worker_count,
                "account pool starting."
            );

            for worker_index in 0..worker_count {
                let worker = AccountWorker::new(
                    worker_index as u16,
                    account.clone(),
                    storage_template.clone(),
                    shared_requests.clone(),
                    next_index.clone(),
                    batch_size,
                    self.config.snapshot_before_delete,
                    self.cancellation_token.clone(),
                );
                let permits = permits.clone();
                join_set.spawn(async move {
                    match permits.acquire_owned().await {
                        Ok(_permit) => worker.run().await,
                        // Only possible if the semaphore is closed, which
                        // this pipeline never does.
                        Err(e) => {
                            error!(error = %e, "worker permit pool closed.");
                            DeletionSummary::default()
                        }
                    }
                });
            }
        }

        let summary = self.join_workers(&mut join_set).await;

        info!(
            success_count = summary.success_count,
            failure_count = summary.failure_count,
            "deletion finished."
        );

        Ok(summary)
    }

    fn validate_config(&self) -> Result<()> {
        if self.config.batch_size == 0 || self.config.batch_size > MAX_BATCH_SIZE {
            return Err(BlobRmError::InvalidConfig(format!(
                "batch size must be between 1 and {}, got {}",
                MAX_BATCH_SIZE, self.config.batch_size
            ))
            .into());
        }
        if self.config.worker_size == 0 {
            return Err(
                BlobRmError::InvalidConfig("worker count must be at least 1, got 0".to_string())
                    .into(),
            );
        }
        Ok(())
    }

    /// Fold worker results. A worker that fails to join contributes nothing;
    /// once cancelled, all stragglers share one fixed grace period, measured
    /// from when the cancellation is first observed, before they are aborted.
    async fn join_workers(&self, join_set: &mut JoinSet<DeletionSummary>) -> DeletionSummary {
        let mut summary = DeletionSummary::default();
        let mut shutdown_deadline: Option<Instant> = None;

        loop {
            let joined = if self.cancellation_token.is_cancelled() {
                let deadline = *shutdown_deadline
                    .get_or_insert_with(|| Instant::now() + SHUTDOWN_GRACE);
                match tokio::time::timeout_at(deadline, join_set.join_next()).await {
                    Ok(joined) => joined,
                    Err(_) => {
                        warn!(
                            remaining = join_set.len(),
                            "shutdown grace period expired, aborting remaining workers."
                        );
                        join_set.abort_all();
                        while join_set.join_next().await.is_some() {}
                        break;
                    }
                }
            } else {
                join_set.join_next().await
            };

            match joined {
                Some(Ok(worker_summary)) => summary = summary.merge(worker_summary),
                Some(Err(e)) => {
                    error!(error = %e, "delete worker did not complete.");
                }
                None => break,
            }
        }

        summary
    }
}

/// Group requests by storage account, preserving first-seen account order
/// and the source order of each account's requests.
fn group_requests_by_account(
    requests: Vec<BlobDeleteRequest>,
) -> Vec<(String, Vec<BlobDeleteRequest>)> {
    let mut groups: Vec<(String, Vec<BlobDeleteRequest>)> = Vec::new();

    for request in requests {
        match groups.iter_mut().find(|(account, _)| *account == request.account) {
            Some((_, group)) => group.push(request),
            None => groups.push((request.account.clone(), vec![request])),
        }
    }

    groups
}
