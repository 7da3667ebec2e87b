//! Shared utilities for folio.
//!
//! This crate provides common utilities used across the folio workspace:
//! - Logging setup with tracing
//! - Path utilities (slash-normalized keys, safe joins, project discovery)
//! - RAII-based timing for operation measurement

pub mod log;
pub mod path;
pub mod timing;

pub use log::{LogConfig, LogLevel};
pub use timing::TimingGuard;
