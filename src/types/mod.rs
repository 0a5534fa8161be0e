use std::fmt;
use std::fmt::{Debug, Formatter};

use zeroize::{Zeroize, ZeroizeOnDrop};

pub mod error;
pub mod token;

/// A single blob to be deleted.
///
/// Created exclusively by the request reader while parsing the input;
/// immutable afterwards, so it is always safe to read concurrently.
/// `line_number` and `raw_line` are carried for diagnostics only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobDeleteRequest {
    pub account: String,
    pub container: String,
    pub blob: String,
    pub line_number: u64,
    pub raw_line: String,
}

impl BlobDeleteRequest {
    pub fn new(
        account: impl Into<String>,
        container: impl Into<String>,
        blob: impl Into<String>,
        line_number: u64,
        raw_line: impl Into<String>,
    ) -> Self {
        Self {
            account: account.into(),
            container: container.into(),
            blob: blob.into(),
            line_number,
            raw_line: raw_line.into(),
        }
    }

    /// Diagnostic context for log and failure messages.
    pub fn line_context(&self) -> String {
        format!("line {}: {}", self.line_number, self.raw_line)
    }
}

/// Aggregated outcome of one run, one worker, or one chunk.
///
/// Counts never exceed the number of requests queued into the batches that
/// contributed to this summary. `merge` is associative and commutative in
/// the counts; message ordering is only preserved within one worker's own
/// sequential chunk processing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionSummary {
    pub success_count: u64,
    pub failure_count: u64,
    pub success_messages: Vec<String>,
    pub failure_messages: Vec<String>,
}

impl DeletionSummary {
    pub fn record_success(&mut self, message: String) {
        self.success_count += 1;
        self.success_messages.push(message);
    }

    pub fn record_failure(&mut self, message: String) {
        self.failure_count += 1;
        self.failure_messages.push(message);
    }

    /// Fold another summary into this one, returning the combined summary.
    pub fn merge(mut self, other: DeletionSummary) -> DeletionSummary {
        self.success_count += other.success_count;
        self.failure_count += other.failure_count;
        self.success_messages.extend(other.success_messages);
        self.failure_messages.extend(other.failure_messages);
        self
    }
}

/// Credential attached to outbound Blob service requests.
///
/// Only the credential *values* live here; how they were obtained is the
/// caller's concern. Secret material is securely cleared from memory on
/// drop via the zeroize crate.
#[derive(Debug, Clone)]
pub enum Credential {
    /// Shared Access Signature query string (with or without a leading `?`).
    Sas(SasToken),
    /// OAuth bearer token for the storage resource.
    Bearer(BearerToken),
    /// No credential (local emulators, public containers).
    Anonymous,
}

/// SAS token with secure memory clearing and redacted Debug output.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SasToken {
    pub token: String,
}

impl Debug for SasToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("SasToken")
            .field("token", &"** redacted **")
            .finish()
    }
}

/// Bearer token with secure memory clearing and redacted Debug output.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct BearerToken {
    pub token: String,
}

impl Debug for BearerToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerToken")
            .field("token", &"** redacted **")
            .finish()
    }
}
