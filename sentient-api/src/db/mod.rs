//! Database access for sentient-api
//!
//! SQLite via sqlx: mood check-in entries, completed-session records, and
//! the inspiration chunks used to enrich generation prompts.

pub mod chunks;
pub mod entries;
pub mod init;
pub mod sessions;
