//! HTTP API module.
//!
//! This module provides the HTTP server, the preview payloads and the log
//! stream for the metre backend.

pub mod logs;
pub mod server;
pub mod types;

pub use logs::*;
pub use server::{router, start_server};
pub use types::*;
