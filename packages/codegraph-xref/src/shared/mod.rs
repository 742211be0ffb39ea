//! Helpers shared by ingestion and queries

pub mod paths;
pub mod rows;
