use std::path::PathBuf;

use clap::Parser;
use clap_verbosity_flag::{Verbosity, WarnLevel};

use crate::config::{Config, InputSource, MAX_BATCH_SIZE, TracingConfig, default_worker_size};
use crate::types::{BearerToken, Credential, SasToken};

// ---------------------------------------------------------------------------
// Default constants
// ---------------------------------------------------------------------------

const DEFAULT_BATCH_SIZE: u16 = 255;
const DEFAULT_CSV_SEPARATOR: &str = ",";
const DEFAULT_SNAPSHOT_BEFORE_DELETE: bool = false;
const DEFAULT_JSON_TRACING: bool = false;
const DEFAULT_SPAN_EVENTS_TRACING: bool = false;
const DEFAULT_DISABLE_COLOR_TRACING: bool = false;

// ---------------------------------------------------------------------------
// Error messages
// ---------------------------------------------------------------------------

const ERROR_MESSAGE_NO_INPUT: &str =
    "Either --input-file or --input-data must be specified.";
const ERROR_MESSAGE_BATCH_SIZE_ZERO: &str = "Batch size must be at least 1.";
const ERROR_MESSAGE_BATCH_SIZE_TOO_LARGE: &str =
    "Batch size must be at most 256 (Blob Batch API limit).";
const ERROR_MESSAGE_WORKER_SIZE_ZERO: &str = "Worker count must be at least 1.";
const ERROR_MESSAGE_EMPTY_SEPARATOR: &str = "CSV separator must not be empty.";

// ---------------------------------------------------------------------------
// CLIArgs (clap-derived argument struct)
// ---------------------------------------------------------------------------

/// blobrm - Fast Azure Blob Storage batch deletion tool.
///
/// Deletes the blobs listed in a delimited work list
/// (storage account, container, blob per line) through the Blob Batch API,
/// grouped by storage account and executed under a bounded worker pool.
///
/// Example:
///   blobrm --input-file blobs.csv
///   blobrm --input-data 'account1,container1,old.dat' --csv-no-header
///   blobrm --input-file blobs.csv --snapshot-before-delete -vv
#[derive(Parser, Clone, Debug)]
#[command(name = "blobrm", version, about, long_about = None)]
pub struct CLIArgs {
    // -----------------------------------------------------------------------
    // Input options
    // -----------------------------------------------------------------------
    /// Path to the delimited work list file.
    #[arg(short = 'f', long, env, conflicts_with = "input_data", help_heading = "Input")]
    pub input_file: Option<PathBuf>,

    /// Inline work list content (mutually exclusive with --input-file).
    /// Backslash escapes \n, \r, \t and \\ are unescaped.
    #[arg(short = 'd', long, env, help_heading = "Input")]
    pub input_data: Option<String>,

    /// Literal field separator of the work list.
    #[arg(long, env, default_value = DEFAULT_CSV_SEPARATOR, help_heading = "Input")]
    pub csv_separator: String,

    /// The work list has no header row.
    #[arg(long, env, default_value_t = false, help_heading = "Input")]
    pub csv_no_header: bool,

    // -----------------------------------------------------------------------
    // Deletion options
    // -----------------------------------------------------------------------
    /// Delete sub-operations per batch call (1-256).
    #[arg(short = 'b', long, env, default_value_t = DEFAULT_BATCH_SIZE, help_heading = "Deletion")]
    pub batch_size: u16,

    /// Worker pool size for the whole run (default: available parallelism).
    #[arg(short = 't', long, env, default_value_t = default_worker_size(), help_heading = "Deletion")]
    pub workers: u16,

    /// Create a best-effort snapshot of each blob before deleting it.
    #[arg(short = 's', long, env, default_value_t = DEFAULT_SNAPSHOT_BEFORE_DELETE, help_heading = "Deletion")]
    pub snapshot_before_delete: bool,

    // -----------------------------------------------------------------------
    // Credential options
    // -----------------------------------------------------------------------
    /// Shared Access Signature token appended to outbound requests.
    #[arg(long, env = "AZURE_STORAGE_SAS_TOKEN", conflicts_with = "bearer_token", help_heading = "Credentials")]
    pub sas_token: Option<String>,

    /// OAuth bearer token sent in the Authorization header.
    #[arg(long, env = "AZURE_STORAGE_BEARER_TOKEN", help_heading = "Credentials")]
    pub bearer_token: Option<String>,

    // -----------------------------------------------------------------------
    // Tracing options
    // -----------------------------------------------------------------------
    /// Output traces as JSON.
    #[arg(long, env, default_value_t = DEFAULT_JSON_TRACING, help_heading = "Tracing")]
    pub json_tracing: bool,

    /// Emit span open/close events.
    #[arg(long, env, default_value_t = DEFAULT_SPAN_EVENTS_TRACING, help_heading = "Tracing")]
    pub span_events_tracing: bool,

    /// Disable ANSI colors in trace output.
    #[arg(long, env, default_value_t = DEFAULT_DISABLE_COLOR_TRACING, help_heading = "Tracing")]
    pub disable_color_tracing: bool,

    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,
}

/// Parse CLI arguments from an explicit argument vector (library usage).
pub fn parse_from_args<I, T>(args: I) -> Result<CLIArgs, String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    CLIArgs::try_parse_from(args).map_err(|e| e.to_string())
}

impl TryFrom<CLIArgs> for Config {
    type Error = String;

    fn try_from(args: CLIArgs) -> Result<Self, Self::Error> {
        if args.batch_size == 0 {
            return Err(ERROR_MESSAGE_BATCH_SIZE_ZERO.to_string());
        }
        if args.batch_size > MAX_BATCH_SIZE {
            return Err(ERROR_MESSAGE_BATCH_SIZE_TOO_LARGE.to_string());
        }
        if args.workers == 0 {
            return Err(ERROR_MESSAGE_WORKER_SIZE_ZERO.to_string());
        }
        if args.csv_separator.is_empty() {
            return Err(ERROR_MESSAGE_EMPTY_SEPARATOR.to_string());
        }

        let input = match (args.input_file, args.input_data) {
            (Some(path), None) => InputSource::File(path),
            (None, Some(data)) => InputSource::Inline(unescape_inline_content(&data)),
            // Both set is rejected by clap's conflicts_with.
            _ => return Err(ERROR_MESSAGE_NO_INPUT.to_string()),
        };

        let credential = if let Some(token) = args.sas_token {
            Credential::Sas(SasToken { token })
        } else if let Some(token) = args.bearer_token {
            Credential::Bearer(BearerToken { token })
        } else {
            Credential::Anonymous
        };

        let tracing_config = args.verbosity.log_level().map(|level| TracingConfig {
            tracing_level: level,
            json_tracing: args.json_tracing,
            span_events_tracing: args.span_events_tracing,
            disable_color_tracing: args.disable_color_tracing,
        });

        Ok(Config {
            input,
            csv_separator: args.csv_separator,
            csv_has_header: !args.csv_no_header,
            batch_size: args.batch_size,
            worker_size: args.workers,
            snapshot_before_delete: args.snapshot_before_delete,
            credential,
            tracing_config,
        })
    }
}

/// Unescape backslash sequences (`\n`, `\r`, `\t`, `\\`) in inline work list
/// content so multi-line lists can be passed on the command line.
fn unescape_inline_content(raw: &str) -> String {
    let mut unescaped = String::with_capacity(raw.len());
    let mut escaping = false;

    for current in raw.chars() {
        if escaping {
            match current {
                'n' => unescaped.push('\n'),
                'r' => unescaped.push('\r'),
                't' => unescaped.push('\t'),
                '\\' => unescaped.push('\\'),
                other => {
                    unescaped.push('\\');
                    unescaped.push(other);
                }
            }
            escaping = false;
        } else if current == '\\' {
            escaping = true;
        } else {
            unescaped.push(current);
        }
    }

    if escaping {
        unescaped.push('\\');
    }

    unescaped
}
