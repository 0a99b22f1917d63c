//! # makerscope
//!
//! Catalog ingestion and maker scoring pipeline: scheduled batch jobs pull
//! catalog pages from an external affiliate API, normalize items into a
//! relational entity graph in SQLite, merge them idempotently, and maintain
//! a derived popularity score per maker.

pub mod batch;
pub mod config;
pub mod db;
pub mod error;
pub mod scheduler;
pub mod services;
pub mod time;

pub use error::{Error, Result};
