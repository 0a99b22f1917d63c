//! Storage layer: per-entity repositories over a shared `SqlitePool`

pub mod curated;
pub mod genres;
pub mod init;
pub mod makers;
pub mod scores;
pub mod series;
pub mod works;

pub use init::{init_database, initialize_schema};
