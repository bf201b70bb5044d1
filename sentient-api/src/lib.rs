//! # Sentient API service (sentient-api)
//!
//! Orchestration service for the guided-meditation pipeline.
//!
//! **Purpose:** validate mood transitions, request six-phase meditation
//! scripts from a generative text model, synthesize per-phase narration,
//! persist audio artifacts behind signed URLs, and store mood entries and
//! completed-session records.
//!
//! **Architecture:** axum HTTP service over reqwest upstream clients
//! (text + speech model, object storage) and a SQLite store via sqlx.

pub mod api;
pub mod clients;
pub mod config;
pub mod db;
pub mod error;
pub mod generate;
pub mod narration;

pub use error::{ApiError, Result};
