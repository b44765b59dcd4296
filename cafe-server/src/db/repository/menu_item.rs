//! Menu Item Repository
//!
//! The catalog is owned elsewhere; settlement only reads it. `create` exists
//! for seeding.

use super::{RepoError, RepoResult, cents};
use crate::money::from_cents;
use shared::models::{MenuItem, MenuItemCreate};
use sqlx::SqlitePool;
use std::collections::HashMap;

#[derive(sqlx::FromRow)]
struct MenuItemRow {
    id: i64,
    name: String,
    price_cents: i64,
    category: String,
    is_available: bool,
    created_at: i64,
    updated_at: i64,
}

impl From<MenuItemRow> for MenuItem {
    fn from(row: MenuItemRow) -> Self {
        MenuItem {
            id: row.id,
            name: row.name,
            price: from_cents(row.price_cents),
            category: row.category,
            is_available: row.is_available,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const COLUMNS: &str = "id, name, price_cents, category, is_available, created_at, updated_at";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<MenuItem>> {
    let row = sqlx::query_as::<_, MenuItemRow>(&format!(
        "SELECT {COLUMNS} FROM menu_item WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(MenuItem::from))
}

/// Batch lookup keyed by id; missing ids are simply absent from the map
pub async fn find_by_ids(pool: &SqlitePool, ids: &[i64]) -> RepoResult<HashMap<i64, MenuItem>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let placeholders = vec!["?"; ids.len()].join(", ");
    let sql = format!("SELECT {COLUMNS} FROM menu_item WHERE id IN ({placeholders})");
    let mut query = sqlx::query_as::<_, MenuItemRow>(&sql);
    for id in ids {
        query = query.bind(*id);
    }
    let rows = query.fetch_all(pool).await?;
    Ok(rows.into_iter().map(|r| (r.id, MenuItem::from(r))).collect())
}

/// Names only, for composing order detail views
pub async fn find_names(pool: &SqlitePool, ids: &[i64]) -> RepoResult<HashMap<i64, String>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let placeholders = vec!["?"; ids.len()].join(", ");
    let sql = format!("SELECT id, name FROM menu_item WHERE id IN ({placeholders})");
    let mut query = sqlx::query_as::<_, (i64, String)>(&sql);
    for id in ids {
        query = query.bind(*id);
    }
    Ok(query.fetch_all(pool).await?.into_iter().collect())
}

pub async fn create(pool: &SqlitePool, data: MenuItemCreate) -> RepoResult<MenuItem> {
    if data.name.trim().is_empty() {
        return Err(RepoError::Validation("name must not be empty".into()));
    }
    if data.price.is_sign_negative() {
        return Err(RepoError::Validation(format!(
            "price must be non-negative, got {}",
            data.price
        )));
    }
    let id = shared::util::snowflake_id();
    let now = shared::util::now_millis();
    sqlx::query(
        "INSERT INTO menu_item (id, name, price_cents, category, is_available, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
    )
    .bind(id)
    .bind(&data.name)
    .bind(cents(data.price, "price")?)
    .bind(data.category.as_deref().unwrap_or(""))
    .bind(data.is_available.unwrap_or(true))
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create menu item".into()))
}

/// Test-only availability toggle
#[cfg(test)]
pub async fn set_available(pool: &SqlitePool, id: i64, is_available: bool) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let rows = sqlx::query("UPDATE menu_item SET is_available = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(is_available)
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}
