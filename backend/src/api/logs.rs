//! Pipeline log broadcasting.
//!
//! Every pipeline stage reports through a [`JobLog`], which tags its entries
//! with the run's job id and hands them to [`LOG_BROADCASTER`]. Entries are
//! echoed to stderr (stdout stays free for command output) and fanned out to
//! connected clients of `GET /api/logs` via Server-Sent Events.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Buffered entries per slow subscriber before it starts lagging.
const CHANNEL_CAPACITY: usize = 256;

/// Log level for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl LogLevel {
    fn prefix(&self) -> &'static str {
        match self {
            LogLevel::Info => "   ",
            LogLevel::Success => "   ✓",
            LogLevel::Warning => "   ⚠️",
            LogLevel::Error => "   ❌",
        }
    }
}

/// A single log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    /// Upload the entry belongs to, when it came from an HTTP request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self { level, message: message.into(), job_id: None }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Error, message)
    }

    pub fn for_job(mut self, job_id: impl Into<String>) -> Self {
        self.job_id = Some(job_id.into());
        self
    }
}

/// Global log broadcaster
pub static LOG_BROADCASTER: Lazy<LogBroadcaster> = Lazy::new(LogBroadcaster::new);

/// Echoes log entries to stderr and broadcasts them to SSE subscribers
pub struct LogBroadcaster {
    sender: broadcast::Sender<LogEntry>,
    echo: AtomicBool,
}

impl LogBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender, echo: AtomicBool::new(true) }
    }

    /// Turn the stderr echo on or off (`--quiet`).
    pub fn set_echo(&self, echo: bool) {
        self.echo.store(echo, Ordering::Relaxed);
    }

    pub fn log(&self, entry: LogEntry) {
        if self.echo.load(Ordering::Relaxed) {
            eprintln!("{} {}", entry.level.prefix(), entry.message);
        }
        // No subscribers is not an error
        let _ = self.sender.send(entry);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.sender.subscribe()
    }
}

impl Default for LogBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// Logger for one processing run.
///
/// Every entry it sends carries the run's job id, so SSE clients can pick
/// out the lines of their own upload.
#[derive(Debug, Clone)]
pub struct JobLog {
    job_id: String,
}

impl JobLog {
    /// A logger with a fresh job id.
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4().to_string())
    }

    pub fn with_id(job_id: impl Into<String>) -> Self {
        Self { job_id: job_id.into() }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn info(&self, msg: impl Into<String>) {
        self.send(LogEntry::info(msg));
    }

    pub fn success(&self, msg: impl Into<String>) {
        self.send(LogEntry::success(msg));
    }

    pub fn warning(&self, msg: impl Into<String>) {
        self.send(LogEntry::warning(msg));
    }

    pub fn error(&self, msg: impl Into<String>) {
        self.send(LogEntry::error(msg));
    }

    fn send(&self, entry: LogEntry) {
        LOG_BROADCASTER.log(entry.for_job(self.job_id.clone()));
    }
}

impl Default for JobLog {
    fn default() -> Self {
        Self::new()
    }
}
