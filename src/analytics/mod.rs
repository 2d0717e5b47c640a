//! Refresh analytics: the JSONL refresh log and its reporter.

pub mod logger;
pub mod reporter;
