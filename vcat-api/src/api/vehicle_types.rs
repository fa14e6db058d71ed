//! Vehicle type query endpoints
//!
//! Catalog-wide vehicle type listings joined with their makes, plus the
//! per-make listing under the make resource.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use vcat_common::db::{makes, vehicle_types, VehicleType, VehicleTypeWithMake};

use super::makes::{check_page, CountResponse, PaginationQuery, SearchQuery};
use crate::{ApiError, ApiResult, AppState};

/// GET /api/vehicle-types?skip=&take=
///
/// Vehicle types ordered by name, each joined with its make.
pub async fn list_vehicle_types(
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> ApiResult<Json<Vec<VehicleTypeWithMake>>> {
    check_page(query.skip, query.take)?;
    let result = vehicle_types::list_vehicle_types(&state.db, query.skip, query.take).await?;
    Ok(Json(result))
}

/// GET /api/vehicle-types/search?name=&skip=&take=
pub async fn search_vehicle_types(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<VehicleTypeWithMake>>> {
    check_page(query.skip, query.take)?;
    let result =
        vehicle_types::search_vehicle_types(&state.db, &query.name, query.skip, query.take)
            .await?;
    Ok(Json(result))
}

/// GET /api/vehicle-types/count
pub async fn count_vehicle_types(State(state): State<AppState>) -> ApiResult<Json<CountResponse>> {
    let count = vehicle_types::count_vehicle_types(&state.db).await?;
    Ok(Json(CountResponse { count }))
}

/// GET /api/makes/{make_id}/vehicle-types
///
/// The vehicle types for one make; 404 when the make is absent.
pub async fn vehicle_types_for_make(
    State(state): State<AppState>,
    Path(make_id): Path<i64>,
) -> ApiResult<Json<Vec<VehicleType>>> {
    match makes::get_make_by_make_id(&state.db, make_id).await? {
        Some(make) => Ok(Json(make.vehicle_types)),
        None => Err(ApiError::NotFound(format!(
            "Make with makeId {} not found",
            make_id
        ))),
    }
}

/// Build vehicle type query routes
pub fn vehicle_types_routes() -> Router<AppState> {
    Router::new()
        .route("/api/vehicle-types", get(list_vehicle_types))
        .route("/api/vehicle-types/count", get(count_vehicle_types))
        .route("/api/vehicle-types/search", get(search_vehicle_types))
        .route("/api/makes/:make_id/vehicle-types", get(vehicle_types_for_make))
}
