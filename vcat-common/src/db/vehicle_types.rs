//! Catalog-wide vehicle type queries
//!
//! Read side over the `vehicle_types` table as a whole, for listings
//! that are not scoped to one make. Rows are keyed by
//! `(type_id, make_id)`, so the same upstream type id appears once per
//! make that produces it; each row is joined with its owning make.

use serde::Serialize;
use sqlx::{Row, SqlitePool};

/// A vehicle type row together with the make that produces it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VehicleTypeWithMake {
    pub type_id: i64,
    pub type_name: String,
    pub make_id: i64,
    pub make_name: String,
}

/// List vehicle types ordered by type name, with pagination
pub async fn list_vehicle_types(
    pool: &SqlitePool,
    skip: i64,
    take: Option<i64>,
) -> Result<Vec<VehicleTypeWithMake>, sqlx::Error> {
    // SQLite treats LIMIT -1 as unlimited
    let limit = take.unwrap_or(-1);

    let rows = sqlx::query(
        r#"
        SELECT vt.type_id, vt.type_name, vt.make_id, m.make_name
        FROM vehicle_types vt
        JOIN makes m ON m.make_id = vt.make_id
        ORDER BY vt.type_name ASC, vt.make_id ASC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(limit)
    .bind(skip)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(from_row).collect())
}

/// Search vehicle types by case-insensitive name substring, ordered by type name
pub async fn search_vehicle_types(
    pool: &SqlitePool,
    name: &str,
    skip: i64,
    take: Option<i64>,
) -> Result<Vec<VehicleTypeWithMake>, sqlx::Error> {
    let limit = take.unwrap_or(-1);

    let rows = sqlx::query(
        r#"
        SELECT vt.type_id, vt.type_name, vt.make_id, m.make_name
        FROM vehicle_types vt
        JOIN makes m ON m.make_id = vt.make_id
        WHERE vt.type_name LIKE '%' || ? || '%' COLLATE NOCASE
        ORDER BY vt.type_name ASC, vt.make_id ASC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(name)
    .bind(limit)
    .bind(skip)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(from_row).collect())
}

/// Count all vehicle type rows in the catalog
pub async fn count_vehicle_types(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM vehicle_types")
        .fetch_one(pool)
        .await
}

fn from_row(row: sqlx::sqlite::SqliteRow) -> VehicleTypeWithMake {
    VehicleTypeWithMake {
        type_id: row.get("type_id"),
        type_name: row.get("type_name"),
        make_id: row.get("make_id"),
        make_name: row.get("make_name"),
    }
}
