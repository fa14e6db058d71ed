//! Catalog query endpoints
//!
//! Pagination, substring search, count, and lookup by the make's
//! natural key. Responses carry each make's vehicle types.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use vcat_common::db::{makes, MakeWithVehicleTypes};

use crate::{ApiError, ApiResult, AppState};

/// Pagination query parameters
#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    /// Rows to skip from the start of the ordered listing
    #[serde(default)]
    pub skip: i64,
    /// Maximum rows to return; unlimited when absent
    pub take: Option<i64>,
}

/// Search query parameters
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Case-insensitive name substring
    pub name: String,
    #[serde(default)]
    pub skip: i64,
    pub take: Option<i64>,
}

/// Count response
#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: i64,
}

pub(crate) fn check_page(skip: i64, take: Option<i64>) -> ApiResult<()> {
    if skip < 0 {
        return Err(ApiError::BadRequest("skip must be >= 0".to_string()));
    }
    if let Some(take) = take {
        if take < 0 {
            return Err(ApiError::BadRequest("take must be >= 0".to_string()));
        }
    }
    Ok(())
}

/// GET /api/makes?skip=&take=
///
/// Makes ordered by name, each with its vehicle types.
pub async fn list_makes(
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> ApiResult<Json<Vec<MakeWithVehicleTypes>>> {
    check_page(query.skip, query.take)?;
    let result = makes::list_makes(&state.db, query.skip, query.take).await?;
    Ok(Json(result))
}

/// GET /api/makes/search?name=&skip=&take=
pub async fn search_makes(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<MakeWithVehicleTypes>>> {
    check_page(query.skip, query.take)?;
    let result = makes::search_makes(&state.db, &query.name, query.skip, query.take).await?;
    Ok(Json(result))
}

/// GET /api/makes/count
pub async fn count_makes(State(state): State<AppState>) -> ApiResult<Json<CountResponse>> {
    let count = makes::count_makes(&state.db).await?;
    Ok(Json(CountResponse { count }))
}

/// GET /api/makes/{make_id}
///
/// Lookup by the upstream natural key; 404 when absent.
pub async fn get_make(
    State(state): State<AppState>,
    Path(make_id): Path<i64>,
) -> ApiResult<Json<MakeWithVehicleTypes>> {
    match makes::get_make_by_make_id(&state.db, make_id).await? {
        Some(make) => Ok(Json(make)),
        None => Err(ApiError::NotFound(format!(
            "Make with makeId {} not found",
            make_id
        ))),
    }
}

/// Build catalog query routes
pub fn makes_routes() -> Router<AppState> {
    Router::new()
        .route("/api/makes", get(list_makes))
        .route("/api/makes/count", get(count_makes))
        .route("/api/makes/search", get(search_makes))
        .route("/api/makes/:make_id", get(get_make))
}
