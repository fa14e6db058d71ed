//! End-to-end ingestion tests against a local stub of the catalog feed

use async_trait::async_trait;
use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use sqlx::SqlitePool;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use vcat_common::db::init::create_tables;
use vcat_common::db::{makes, Make, VehicleType};
use vcat_ingest::{
    run_ingestion, CatalogStore, IngestError, RetryPolicy, SqliteCatalogStore, VpicClient,
};

const TWO_MAKES_XML: &str = "<Response><Count>2</Count><Results>\
    <AllVehicleMakes><Make_ID>440</Make_ID><Make_Name> ASTON MARTIN </Make_Name></AllVehicleMakes>\
    <AllVehicleMakes><Make_ID>441</Make_ID><Make_Name>TESLA</Make_Name></AllVehicleMakes>\
    </Results></Response>";

const ONE_VALID_ONE_INVALID_XML: &str = "<Response><Count>2</Count><Results>\
    <AllVehicleMakes><Make_ID>440</Make_ID><Make_Name>ASTON MARTIN</Make_Name></AllVehicleMakes>\
    <AllVehicleMakes><Make_ID>441</Make_ID></AllVehicleMakes>\
    </Results></Response>";

const SINGLE_MAKE_XML: &str = "<Response><Count>1</Count><Results>\
    <AllVehicleMakes><Make_ID>440</Make_ID><Make_Name>ASTON MARTIN</Make_Name></AllVehicleMakes>\
    </Results></Response>";

const TYPES_XML: &str = "<Response><Count>2</Count><Results>\
    <VehicleTypesForMakeIds><VehicleTypeId>2</VehicleTypeId><VehicleTypeName>Passenger Car</VehicleTypeName></VehicleTypesForMakeIds>\
    <VehicleTypesForMakeIds><VehicleTypeId>7</VehicleTypeId><VehicleTypeName>Multipurpose Passenger Vehicle (MPV)</VehicleTypeName></VehicleTypesForMakeIds>\
    </Results></Response>";

const NO_TYPES_XML: &str = "<Response><Count>0</Count><Results></Results></Response>";

fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(1),
    }
}

async fn spawn_stub(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn stub_feed(makes_xml: &'static str, types_xml: &'static str) -> Router {
    Router::new()
        .route("/getallmakes", get(move || async move { makes_xml }))
        .route(
            "/GetVehicleTypesForMakeId/:id",
            get(move |Path(_id): Path<i64>| async move { types_xml }),
        )
}

async fn test_pool() -> SqlitePool {
    let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
    create_tables(&pool).await.unwrap();
    pool
}

#[tokio::test]
async fn ingests_makes_with_vehicle_types_end_to_end() {
    let base_url = spawn_stub(stub_feed(TWO_MAKES_XML, TYPES_XML)).await;
    let client = VpicClient::new(base_url).unwrap();
    let pool = test_pool().await;
    let store = SqliteCatalogStore::new(pool.clone());

    let stats = run_ingestion(&client, &store, &fast_policy()).await.unwrap();

    assert_eq!(stats.total, 2);
    assert_eq!(stats.successful, 2);
    assert_eq!(stats.failed, 0);
    assert!(stats.errors.is_empty());

    let aston = makes::get_make_by_make_id(&pool, 440).await.unwrap().unwrap();
    assert_eq!(aston.make_name, "ASTON MARTIN");
    assert_eq!(aston.vehicle_types.len(), 2);
    assert_eq!(aston.vehicle_types[0].type_id, 2);

    assert_eq!(makes::count_makes(&pool).await.unwrap(), 2);
}

#[tokio::test]
async fn shape_invalid_entry_is_skipped_and_not_counted() {
    let base_url = spawn_stub(stub_feed(ONE_VALID_ONE_INVALID_XML, NO_TYPES_XML)).await;
    let client = VpicClient::new(base_url).unwrap();
    let pool = test_pool().await;
    let store = SqliteCatalogStore::new(pool.clone());

    let stats = run_ingestion(&client, &store, &fast_policy()).await.unwrap();

    // The invalid entry never reaches the stats
    assert_eq!(stats.total, 1);
    assert_eq!(stats.successful, 1);
    assert_eq!(stats.failed, 0);

    assert!(makes::get_make_by_make_id(&pool, 440).await.unwrap().is_some());
    assert!(makes::get_make_by_make_id(&pool, 441).await.unwrap().is_none());
}

#[tokio::test]
async fn singleton_make_element_is_handled_like_a_list() {
    let base_url = spawn_stub(stub_feed(SINGLE_MAKE_XML, NO_TYPES_XML)).await;
    let client = VpicClient::new(base_url).unwrap();
    let pool = test_pool().await;
    let store = SqliteCatalogStore::new(pool.clone());

    let stats = run_ingestion(&client, &store, &fast_policy()).await.unwrap();

    assert_eq!(stats.total, 1);
    assert_eq!(stats.successful, 1);

    let aston = makes::get_make_by_make_id(&pool, 440).await.unwrap().unwrap();
    assert!(aston.vehicle_types.is_empty());
}

/// Store that fails one configured make and records the rest
struct FlakyStore {
    fail_make_id: i64,
    upserted: Mutex<Vec<i64>>,
}

#[async_trait]
impl CatalogStore for FlakyStore {
    async fn upsert_make_with_vehicle_types(
        &self,
        make: &Make,
        _vehicle_types: &[VehicleType],
    ) -> Result<(), IngestError> {
        if make.make_id == self.fail_make_id {
            return Err(IngestError::datastore(
                format!("Failed to upsert make {}: constraint violation", make.make_id),
                false,
            ));
        }
        self.upserted.lock().await.push(make.make_id);
        Ok(())
    }
}

#[tokio::test]
async fn store_failure_is_recorded_and_the_run_continues() {
    let base_url = spawn_stub(stub_feed(TWO_MAKES_XML, TYPES_XML)).await;
    let client = VpicClient::new(base_url).unwrap();
    let store = FlakyStore {
        fail_make_id: 440,
        upserted: Mutex::new(Vec::new()),
    };

    let stats = run_ingestion(&client, &store, &fast_policy()).await.unwrap();

    assert_eq!(stats.total, 2);
    assert_eq!(stats.successful, 1);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.errors.len(), 1);
    assert_eq!(stats.errors[0].make_id, 440);
    assert!(stats.errors[0].error.contains("constraint violation"));

    // The failure on 440 must not stop 441 from being processed
    assert_eq!(*store.upserted.lock().await, vec![441]);
}

#[tokio::test]
async fn make_list_fetch_failure_is_fatal_after_exhausting_retries() {
    let attempts = Arc::new(AtomicU32::new(0));
    let counter = attempts.clone();

    let app = Router::new().route(
        "/getallmakes",
        get(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                (StatusCode::SERVICE_UNAVAILABLE, "upstream down")
            }
        }),
    );

    let base_url = spawn_stub(app).await;
    let client = VpicClient::new(base_url).unwrap();
    let pool = test_pool().await;
    let store = SqliteCatalogStore::new(pool);

    let err = run_ingestion(&client, &store, &fast_policy()).await.unwrap_err();

    match err {
        IngestError::Network { status, retryable, .. } => {
            assert_eq!(status, Some(503));
            assert!(retryable);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    // 503 is retryable, so the policy burned every attempt
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn per_make_fetch_failure_fails_only_that_make() {
    let app = Router::new()
        .route("/getallmakes", get(|| async { TWO_MAKES_XML }))
        .route(
            "/GetVehicleTypesForMakeId/:id",
            get(|Path(id): Path<i64>| async move {
                if id == 440 {
                    // Client error: not retryable, fails the make at once
                    (StatusCode::BAD_REQUEST, "bad make").into_response()
                } else {
                    TYPES_XML.into_response()
                }
            }),
        );

    let base_url = spawn_stub(app).await;
    let client = VpicClient::new(base_url).unwrap();
    let pool = test_pool().await;
    let store = SqliteCatalogStore::new(pool.clone());

    let stats = run_ingestion(&client, &store, &fast_policy()).await.unwrap();

    assert_eq!(stats.successful, 1);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.errors[0].make_id, 440);
    assert!(makes::get_make_by_make_id(&pool, 441).await.unwrap().is_some());
    assert!(makes::get_make_by_make_id(&pool, 440).await.unwrap().is_none());
}
