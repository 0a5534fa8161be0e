/*!
# Overview
blobrm-rs is a fast Azure Blob Storage batch deletion tool.
It reads a delimited work list of (storage account, container, blob) entries,
groups the entries by storage account, and deletes them through the Blob
Batch API under a bounded worker pool, optionally snapshotting each blob
before deletion.

## Features
- **High Performance**: Parallel deletion using the Blob Batch API (up to 256 blobs per request)
- **Account Partitioning**: One authenticated client per storage account, accounts processed concurrently
- **Lock-Free Scheduling**: Workers claim contiguous chunks through a single atomic cursor per account
- **Snapshot Support**: Optional best-effort point-in-time snapshot before each deletion
- **Library-First**: All CLI features available as a Rust library

## As a Library
The blobrm CLI is a thin wrapper over the blobrm-rs library.
All CLI features are available in the library.

Example usage
=============

```toml
[dependencies]
blobrm-rs = "0.1"
tokio = { version = "1", features = ["full"] }
```

```no_run
use blobrm_rs::config::{Config, InputSource};
use blobrm_rs::pipeline::DeletionPipeline;
use blobrm_rs::types::token::create_pipeline_cancellation_token;

#[tokio::main]
async fn main() {
    let mut config = Config::default();
    config.input = InputSource::Inline("account1,container1,blob1.dat".to_string());
    config.csv_has_header = false;

    let cancellation_token = create_pipeline_cancellation_token();
    let pipeline = DeletionPipeline::new(config, cancellation_token);

    match pipeline.run().await {
        Ok(summary) => {
            println!(
                "deleted: {}, failed: {}",
                summary.success_count, summary.failure_count
            );
        }
        Err(e) => eprintln!("{e:#}"),
    }
}
```
*/

pub mod config;
pub mod deleter;
pub mod pipeline;
pub mod reader;
pub mod storage;
pub mod types;

#[cfg(test)]
mod test_utils;

pub use config::{CLIArgs, Config};
pub use pipeline::DeletionPipeline;
pub use types::error::{BlobRmError, exit_code_from_error, is_cancelled_error};
pub use types::token::{PipelineCancellationToken, create_pipeline_cancellation_token};
pub use types::{BlobDeleteRequest, DeletionSummary};
