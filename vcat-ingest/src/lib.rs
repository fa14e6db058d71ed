//! vcat-ingest library interface
//!
//! Exposes the ingestion pipeline for integration testing.

pub mod error;
pub mod pipeline;
pub mod retry;
pub mod store;
pub mod transform;
pub mod vpic_client;
pub mod xml;

pub use error::IngestError;
pub use pipeline::{run_ingestion, IngestStats};
pub use retry::{with_retry, RetryPolicy};
pub use store::{CatalogStore, SqliteCatalogStore};
pub use vpic_client::VpicClient;
