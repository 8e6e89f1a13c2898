//! Canonical entry maintenance
//!
//! GET, PUT and DELETE on `/admin/entry/:table/:id`, where `table` is one of
//! songs, albums, artists, synths or presets.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::db::entries::{self, EntryTable};
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Serialize)]
pub struct EntryResponse {
    pub success: bool,
    pub message: String,
}

fn parse_target(table: &str, id: &str) -> ApiResult<(EntryTable, i64)> {
    let table: EntryTable = table.parse()?;
    let id = id
        .parse::<i64>()
        .map_err(|_| ApiError::BadRequest(format!("Invalid entry id: {}", id)))?;
    Ok((table, id))
}

fn not_found(table: EntryTable, id: i64) -> ApiError {
    ApiError::NotFound(format!("{} entry {}", table.table_name(), id))
}

/// GET /admin/entry/:table/:id
pub async fn get_entry(
    State(state): State<AppState>,
    Path((table, id)): Path<(String, String)>,
) -> ApiResult<Json<Map<String, Value>>> {
    let (table, id) = parse_target(&table, &id)?;
    let row = entries::get_entry(&state.db, table, id)
        .await?
        .ok_or_else(|| not_found(table, id))?;
    Ok(Json(row))
}

/// PUT /admin/entry/:table/:id
pub async fn update_entry(
    State(state): State<AppState>,
    Path((table, id)): Path<(String, String)>,
    payload: Result<Json<Map<String, Value>>, JsonRejection>,
) -> ApiResult<Json<EntryResponse>> {
    let (table, id) = parse_target(&table, &id)?;
    let Json(changes) = payload?;
    if !entries::update_entry(&state.db, table, id, &changes).await? {
        return Err(not_found(table, id));
    }

    Ok(Json(EntryResponse {
        success: true,
        message: "Entry updated".to_string(),
    }))
}

/// DELETE /admin/entry/:table/:id
pub async fn delete_entry(
    State(state): State<AppState>,
    Path((table, id)): Path<(String, String)>,
) -> ApiResult<Json<EntryResponse>> {
    let (table, id) = parse_target(&table, &id)?;
    if !entries::delete_entry(&state.db, table, id).await? {
        return Err(not_found(table, id));
    }

    Ok(Json(EntryResponse {
        success: true,
        message: "Entry deleted".to_string(),
    }))
}

pub fn entry_routes() -> Router<AppState> {
    Router::new().route(
        "/admin/entry/:table/:id",
        get(get_entry).put(update_entry).delete(delete_entry),
    )
}
