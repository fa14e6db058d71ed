//! Make and vehicle type persistence
//!
//! The catalog is keyed by the upstream feed's natural identifiers:
//! `make_id` for makes, `(type_id, make_id)` for vehicle types. The
//! ingest service only ever upserts; rows are never deleted here.

use serde::Serialize;
use sqlx::{Row, SqlitePool};

/// A vehicle manufacturer record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Make {
    pub make_id: i64,
    pub make_name: String,
}

/// A category of vehicle produced by a make
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VehicleType {
    pub type_id: i64,
    pub type_name: String,
}

/// A make together with its vehicle types, as served by the query API
#[derive(Debug, Clone, Serialize)]
pub struct MakeWithVehicleTypes {
    pub make_id: i64,
    pub make_name: String,
    pub vehicle_types: Vec<VehicleType>,
}

/// Upsert a make together with its vehicle types.
///
/// Creates the make and its vehicle types when the make is absent;
/// updates only the make's name when it already exists. An existing
/// make's vehicle type list is left untouched.
pub async fn upsert_make_with_vehicle_types(
    pool: &SqlitePool,
    make: &Make,
    vehicle_types: &[VehicleType],
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    let existing: Option<i64> = sqlx::query_scalar("SELECT make_id FROM makes WHERE make_id = ?")
        .bind(make.make_id)
        .fetch_optional(&mut *tx)
        .await?;

    if existing.is_some() {
        sqlx::query(
            "UPDATE makes SET make_name = ?, updated_at = CURRENT_TIMESTAMP WHERE make_id = ?",
        )
        .bind(&make.make_name)
        .bind(make.make_id)
        .execute(&mut *tx)
        .await?;
    } else {
        sqlx::query("INSERT INTO makes (make_id, make_name) VALUES (?, ?)")
            .bind(make.make_id)
            .bind(&make.make_name)
            .execute(&mut *tx)
            .await?;

        for vt in vehicle_types {
            // The feed occasionally repeats a type for the same make
            sqlx::query(
                "INSERT OR IGNORE INTO vehicle_types (type_id, make_id, type_name) VALUES (?, ?, ?)",
            )
            .bind(vt.type_id)
            .bind(make.make_id)
            .bind(&vt.type_name)
            .execute(&mut *tx)
            .await?;
        }
    }

    tx.commit().await?;
    Ok(())
}

/// List makes ordered by name, with pagination
pub async fn list_makes(
    pool: &SqlitePool,
    skip: i64,
    take: Option<i64>,
) -> Result<Vec<MakeWithVehicleTypes>, sqlx::Error> {
    // SQLite treats LIMIT -1 as unlimited
    let limit = take.unwrap_or(-1);

    let rows = sqlx::query(
        "SELECT make_id, make_name FROM makes ORDER BY make_name ASC LIMIT ? OFFSET ?",
    )
    .bind(limit)
    .bind(skip)
    .fetch_all(pool)
    .await?;

    collect_with_vehicle_types(pool, rows).await
}

/// Search makes by case-insensitive name substring, ordered by name
pub async fn search_makes(
    pool: &SqlitePool,
    name: &str,
    skip: i64,
    take: Option<i64>,
) -> Result<Vec<MakeWithVehicleTypes>, sqlx::Error> {
    let limit = take.unwrap_or(-1);

    let rows = sqlx::query(
        r#"
        SELECT make_id, make_name FROM makes
        WHERE make_name LIKE '%' || ? || '%' COLLATE NOCASE
        ORDER BY make_name ASC LIMIT ? OFFSET ?
        "#,
    )
    .bind(name)
    .bind(limit)
    .bind(skip)
    .fetch_all(pool)
    .await?;

    collect_with_vehicle_types(pool, rows).await
}

/// Load a single make by its natural key
pub async fn get_make_by_make_id(
    pool: &SqlitePool,
    make_id: i64,
) -> Result<Option<MakeWithVehicleTypes>, sqlx::Error> {
    let row = sqlx::query("SELECT make_id, make_name FROM makes WHERE make_id = ?")
        .bind(make_id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => {
            let mut makes = collect_with_vehicle_types(pool, vec![row]).await?;
            Ok(makes.pop())
        }
        None => Ok(None),
    }
}

/// Count all makes in the catalog
pub async fn count_makes(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM makes")
        .fetch_one(pool)
        .await
}

/// Load the vehicle types for a make, ordered by type id
pub async fn load_vehicle_types(
    pool: &SqlitePool,
    make_id: i64,
) -> Result<Vec<VehicleType>, sqlx::Error> {
    let rows = sqlx::query(
        "SELECT type_id, type_name FROM vehicle_types WHERE make_id = ? ORDER BY type_id ASC",
    )
    .bind(make_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| VehicleType {
            type_id: row.get("type_id"),
            type_name: row.get("type_name"),
        })
        .collect())
}

async fn collect_with_vehicle_types(
    pool: &SqlitePool,
    rows: Vec<sqlx::sqlite::SqliteRow>,
) -> Result<Vec<MakeWithVehicleTypes>, sqlx::Error> {
    let mut makes = Vec::with_capacity(rows.len());

    for row in rows {
        let make_id: i64 = row.get("make_id");
        let vehicle_types = load_vehicle_types(pool, make_id).await?;
        makes.push(MakeWithVehicleTypes {
            make_id,
            make_name: row.get("make_name"),
            vehicle_types,
        });
    }

    Ok(makes)
}
