//! Ingestion orchestration
//!
//! Drives one full catalog run: fetch the make list (fatal on failure),
//! then for each make fetch its vehicle types and upsert the pair,
//! recording per-make failures without stopping the run.

use crate::error::IngestError;
use crate::retry::{with_retry, RetryPolicy};
use crate::store::CatalogStore;
use crate::transform::{
    transform_make, transform_vehicle_type, validate_make_data, validate_vehicle_type_data,
};
use crate::vpic_client::VpicClient;
use crate::xml::{parse_xml, XmlNode};
use serde::Serialize;
use tracing::{error, info, warn};
use vcat_common::db::{Make, VehicleType};

/// Progress log cadence, in processed makes
const PROGRESS_INTERVAL: usize = 100;

/// Detailed failures reported in the summary; the rest are only counted
const SUMMARY_ERROR_CAP: usize = 10;

/// One recorded per-make failure
#[derive(Debug, Clone, Serialize)]
pub struct MakeFailure {
    pub make_id: i64,
    pub error: String,
}

/// Counters for one ingestion run; never persisted
#[derive(Debug, Default)]
pub struct IngestStats {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub errors: Vec<MakeFailure>,
}

/// Fetch, validate, and transform the full make list.
///
/// Entries that fail the shape check or transformation are skipped with
/// a warning; a fetch failure after retries propagates and is fatal for
/// the run.
pub async fn fetch_all_makes(
    client: &VpicClient,
    policy: &RetryPolicy,
) -> Result<Vec<Make>, IngestError> {
    info!("Fetching all makes from catalog API");

    let url = client.all_makes_url();
    let body = with_retry(policy, "Fetch all makes", || client.fetch_with_timeout(&url)).await?;

    let tree = parse_xml(&body)?;
    let results = match extract_results(&tree, "AllVehicleMakes") {
        Some(results) => results,
        None => {
            warn!("No makes found in API response");
            return Ok(Vec::new());
        }
    };

    let mut valid_makes = Vec::new();
    for raw in results.as_sequence() {
        if !validate_make_data(raw) {
            warn!(raw_data = ?raw, "Skipping invalid make data");
            continue;
        }
        match transform_make(raw) {
            Ok(make) => valid_makes.push(make),
            Err(err) => {
                warn!(error = %err, "Skipping make due to transformation error");
            }
        }
    }

    info!(count = valid_makes.len(), "Fetched valid makes");
    Ok(valid_makes)
}

/// Fetch the vehicle types for one make.
///
/// A missing result set decodes to an empty list; invalid entries are
/// skipped silently. A fetch failure after retries propagates and fails
/// this make only.
pub async fn fetch_vehicle_types(
    client: &VpicClient,
    policy: &RetryPolicy,
    make_id: i64,
) -> Result<Vec<VehicleType>, IngestError> {
    let url = client.vehicle_types_url(make_id);
    let label = format!("Fetch vehicle types for make {}", make_id);
    let body = with_retry(policy, &label, || client.fetch_with_timeout(&url)).await?;

    let tree = parse_xml(&body)?;
    let results = match extract_results(&tree, "VehicleTypesForMakeIds") {
        Some(results) => results,
        None => return Ok(Vec::new()),
    };

    let mut valid_types = Vec::new();
    for raw in results.as_sequence() {
        if !validate_vehicle_type_data(raw) {
            continue;
        }
        if let Ok(vt) = transform_vehicle_type(raw) {
            valid_types.push(vt);
        }
    }

    Ok(valid_types)
}

/// Run one full ingestion pass.
///
/// Returns `Err` only when the make list itself cannot be obtained;
/// per-make failures are recorded in the returned stats and the run
/// continues.
pub async fn run_ingestion<S: CatalogStore>(
    client: &VpicClient,
    store: &S,
    policy: &RetryPolicy,
) -> Result<IngestStats, IngestError> {
    info!("Starting catalog ingestion");

    let makes = fetch_all_makes(client, policy).await?;

    let mut stats = IngestStats {
        total: makes.len(),
        ..Default::default()
    };

    for (i, make) in makes.iter().enumerate() {
        match process_make(client, store, policy, make).await {
            Ok(()) => stats.successful += 1,
            Err(err) => {
                stats.failed += 1;
                let message = err.to_string();
                error!(make_id = make.make_id, error = %message, "Failed to process make");
                stats.errors.push(MakeFailure {
                    make_id: make.make_id,
                    error: message,
                });
            }
        }

        if (i + 1) % PROGRESS_INTERVAL == 0 {
            info!(
                processed = i + 1,
                total = stats.total,
                successful = stats.successful,
                failed = stats.failed,
                "Ingestion progress"
            );
        }
    }

    log_summary(&stats);
    Ok(stats)
}

async fn process_make<S: CatalogStore>(
    client: &VpicClient,
    store: &S,
    policy: &RetryPolicy,
    make: &Make,
) -> Result<(), IngestError> {
    let vehicle_types = fetch_vehicle_types(client, policy, make.make_id).await?;

    let label = format!("Upsert make {}", make.make_id);
    with_retry(policy, &label, || {
        store.upsert_make_with_vehicle_types(make, &vehicle_types)
    })
    .await
}

/// Emit the run summary: `warn` when anything failed, `info` otherwise.
/// At most [`SUMMARY_ERROR_CAP`] failures are detailed; the rest are counted.
fn log_summary(stats: &IngestStats) {
    if stats.failed > 0 {
        let detailed = &stats.errors[..stats.errors.len().min(SUMMARY_ERROR_CAP)];
        let additional_failures = stats.errors.len().saturating_sub(SUMMARY_ERROR_CAP);
        // Serialized so the JSON log line stays machine-readable, not a
        // Debug rendering.
        let failed_makes = serde_json::to_value(detailed).unwrap_or_default();
        warn!(
            total = stats.total,
            successful = stats.successful,
            failed = stats.failed,
            failed_makes = %failed_makes,
            additional_failures,
            "Ingestion completed"
        );
    } else {
        info!(
            total = stats.total,
            successful = stats.successful,
            failed = stats.failed,
            "Ingestion completed"
        );
    }
}

/// Unwrap the feed's `Response.Results.<key>` envelope
fn extract_results<'a>(tree: &'a XmlNode, key: &str) -> Option<&'a XmlNode> {
    tree.get("Response")?.get("Results")?.get(key)
}
