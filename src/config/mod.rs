pub mod args;

pub use args::CLIArgs;

use std::path::PathBuf;

use crate::types::Credential;

/// Maximum delete sub-operations per Blob Batch API call (service limit).
pub const MAX_BATCH_SIZE: u16 = 256;

/// Where the work list comes from.
#[derive(Debug, Clone)]
pub enum InputSource {
    /// Delimited text file on disk.
    File(PathBuf),
    /// Inline delimited text supplied directly (e.g. via `--input-data`).
    Inline(String),
}

/// Main configuration for the blobrm-rs deletion pipeline.
///
/// Holds all settings needed to configure and run a
/// [`DeletionPipeline`](crate::DeletionPipeline): the input work list,
/// its parsing options, batch size, worker pool size, the
/// snapshot-before-delete flag, and the credential attached to outbound
/// Blob service requests.
///
/// # Quick Start
///
/// ```
/// use blobrm_rs::config::{Config, InputSource};
///
/// let mut config = Config::default();
/// config.input = InputSource::Inline("account1,container1,blob.dat".into());
/// config.csv_has_header = false;
/// assert_eq!(config.batch_size, 255);
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub input: InputSource,
    /// Literal field separator for the work list (quoted in full, not a regex).
    pub csv_separator: String,
    /// Skip the first line of the work list.
    pub csv_has_header: bool,
    /// Delete sub-operations per batch call, 1..=256.
    pub batch_size: u16,
    /// Global worker pool ceiling for the whole run.
    pub worker_size: u16,
    /// Create a best-effort snapshot of each blob before deleting it.
    pub snapshot_before_delete: bool,
    pub credential: Credential,
    pub tracing_config: Option<TracingConfig>,
}

impl Default for Config {
    /// Create a `Config` with the production defaults: comma separator,
    /// header row expected, batch size 255, worker count = available
    /// parallelism, snapshots off, anonymous credential.
    ///
    /// The `input` defaults to inline empty content. Set it before running
    /// a pipeline.
    fn default() -> Self {
        Config {
            input: InputSource::Inline(String::new()),
            csv_separator: ",".to_string(),
            csv_has_header: true,
            batch_size: 255,
            worker_size: default_worker_size(),
            snapshot_before_delete: false,
            credential: Credential::Anonymous,
            tracing_config: None,
        }
    }
}

/// Default worker count: the host's available parallelism, or 1 if unknown.
pub fn default_worker_size() -> u16 {
    std::thread::available_parallelism()
        .map(|n| n.get().min(u16::MAX as usize) as u16)
        .unwrap_or(1)
}

/// Tracing (logging) configuration.
///
/// Supports verbosity levels, JSON format, color control, and span event
/// tracing for the CLI binary's subscriber.
#[derive(Debug, Clone, Copy)]
pub struct TracingConfig {
    pub tracing_level: log::Level,
    pub json_tracing: bool,
    pub span_events_tracing: bool,
    pub disable_color_tracing: bool,
}
