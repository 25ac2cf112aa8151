//! Append-only request log side channel.
//!
//! Every request that reaches the gate chain, accepted or rejected, leaves
//! one line in the request log, and rate-limit blocks leave a second,
//! distinct line naming the resolved client identity. This module only
//! produces line content and hands it to a [`LogSink`]; the sink itself
//! (file, tracing pipeline, test buffer) is an external collaborator.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use parking_lot::Mutex;
use tracing::{info, warn};

use super::context::RequestContext;

/// Timestamp format matching `%Y-%m-%d %H:%M:%S.micros`.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// One line per request: `<timestamp> - User: <user-or-Anonymous> - Path: <path>`.
pub fn access_line(ctx: &RequestContext) -> String {
    format!(
        "{} - User: {} - Path: {}",
        ctx.received_at.format(TIMESTAMP_FORMAT),
        ctx.user_label(),
        ctx.path
    )
}

/// Distinct line for a rate-limit block, including the resolved client identity.
pub fn rate_limit_block_line(ctx: &RequestContext) -> String {
    format!(
        "{} - Rate limit exceeded - Client: {} - Path: {}",
        ctx.received_at.format(TIMESTAMP_FORMAT),
        ctx.identity,
        ctx.path
    )
}

/// Destination for request log lines.
///
/// `append` must not fail the request: sink errors are swallowed (logged at
/// worst) because the log is a side channel, not part of the decision path.
pub trait LogSink: Send + Sync {
    /// Append one line.
    fn append(&self, line: &str);
}

/// Sink routing lines through the tracing pipeline under the
/// `request_log` target. The default when no log file is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn append(&self, line: &str) {
        info!(target: "request_log", "{line}");
    }
}

/// Sink appending lines to a file, one per call.
#[derive(Debug)]
pub struct FileSink {
    file: Mutex<File>,
}

impl FileSink {
    /// Open (creating if needed) the log file in append mode.
    pub fn open(path: &Path) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl LogSink for FileSink {
    fn append(&self, line: &str) {
        let mut file = self.file.lock();
        if let Err(e) = writeln!(file, "{line}") {
            warn!(error = %e, "Failed to append to request log");
        }
    }
}
