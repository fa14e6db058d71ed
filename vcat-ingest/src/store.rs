//! Persistence collaborator for the ingestion pipeline
//!
//! The pipeline only ever calls one operation: upsert a make together
//! with its vehicle types. The trait keeps that seam narrow so tests can
//! substitute failing stores.

use crate::error::{datastore_retryable, IngestError};
use async_trait::async_trait;
use sqlx::SqlitePool;
use vcat_common::db::{makes, Make, VehicleType};

/// Upsert-capable catalog store
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Create the make with its vehicle types if absent, or update the
    /// make's name if present. Existing makes keep their type list.
    async fn upsert_make_with_vehicle_types(
        &self,
        make: &Make,
        vehicle_types: &[VehicleType],
    ) -> Result<(), IngestError>;
}

/// Production store backed by the shared SQLite pool
pub struct SqliteCatalogStore {
    pool: SqlitePool,
}

impl SqliteCatalogStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogStore for SqliteCatalogStore {
    async fn upsert_make_with_vehicle_types(
        &self,
        make: &Make,
        vehicle_types: &[VehicleType],
    ) -> Result<(), IngestError> {
        makes::upsert_make_with_vehicle_types(&self.pool, make, vehicle_types)
            .await
            .map_err(|e| {
                let message = e.to_string();
                let retryable = datastore_retryable(&message);
                IngestError::datastore(
                    format!("Failed to upsert make {}: {}", make.make_id, message),
                    retryable,
                )
            })
    }
}
