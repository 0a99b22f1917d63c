//! External-facing clients and pure engines

pub mod catalog_client;
pub mod normalizer;
pub mod scoring;
