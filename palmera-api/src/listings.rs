use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use palmera_core::catalog::{
    Adventure, NewAdventure, NewRestaurant, NewVilla, Restaurant, Villa,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::session::SessionClaims;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/adventures", get(list_adventures).post(create_adventure))
        .route(
            "/api/adventures/{id}",
            get(get_adventure)
                .put(update_adventure)
                .delete(delete_adventure),
        )
        .route("/api/villas", get(list_villas).post(create_villa))
        .route(
            "/api/villas/{id}",
            get(get_villa).put(update_villa).delete(delete_villa),
        )
        .route(
            "/api/restaurants",
            get(list_restaurants).post(create_restaurant),
        )
        .route("/api/restaurants/import", post(import_restaurants))
        .route(
            "/api/restaurants/{id}",
            get(get_restaurant)
                .put(update_restaurant)
                .delete(delete_restaurant),
        )
}

// ==================== Adventures ====================

async fn list_adventures(
    State(state): State<AppState>,
    _claims: SessionClaims,
) -> Result<Json<Vec<Adventure>>, AppError> {
    let rows = state
        .storage
        .list_adventures()
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    Ok(Json(rows))
}

async fn get_adventure(
    State(state): State<AppState>,
    _claims: SessionClaims,
    Path(id): Path<Uuid>,
) -> Result<Json<Adventure>, AppError> {
    let row = state
        .storage
        .get_adventure(id)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .ok_or_else(|| AppError::NotFoundError("adventure not found".to_string()))?;
    Ok(Json(row))
}

async fn create_adventure(
    State(state): State<AppState>,
    claims: SessionClaims,
    Json(new): Json<NewAdventure>,
) -> Result<(StatusCode, Json<Adventure>), AppError> {
    claims.require_admin()?;
    let row = state
        .storage
        .create_adventure(&new)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    Ok((StatusCode::CREATED, Json(row)))
}

async fn update_adventure(
    State(state): State<AppState>,
    claims: SessionClaims,
    Path(id): Path<Uuid>,
    Json(new): Json<NewAdventure>,
) -> Result<Json<Adventure>, AppError> {
    claims.require_admin()?;
    let row = state
        .storage
        .update_adventure(id, &new)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .ok_or_else(|| AppError::NotFoundError("adventure not found".to_string()))?;
    Ok(Json(row))
}

async fn delete_adventure(
    State(state): State<AppState>,
    claims: SessionClaims,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    claims.require_admin()?;
    let deleted = state
        .storage
        .delete_adventure(id)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    if !deleted {
        return Err(AppError::NotFoundError("adventure not found".to_string()));
    }
    Ok(Json(json!({ "deleted": true })))
}

// ==================== Villas ====================

async fn list_villas(
    State(state): State<AppState>,
    _claims: SessionClaims,
) -> Result<Json<Vec<Villa>>, AppError> {
    let rows = state
        .storage
        .list_villas()
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    Ok(Json(rows))
}

async fn get_villa(
    State(state): State<AppState>,
    _claims: SessionClaims,
    Path(id): Path<Uuid>,
) -> Result<Json<Villa>, AppError> {
    let row = state
        .storage
        .get_villa(id)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .ok_or_else(|| AppError::NotFoundError("villa not found".to_string()))?;
    Ok(Json(row))
}

async fn create_villa(
    State(state): State<AppState>,
    claims: SessionClaims,
    Json(new): Json<NewVilla>,
) -> Result<(StatusCode, Json<Villa>), AppError> {
    claims.require_admin()?;
    let row = state
        .storage
        .create_villa(&new)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    Ok((StatusCode::CREATED, Json(row)))
}

async fn update_villa(
    State(state): State<AppState>,
    claims: SessionClaims,
    Path(id): Path<Uuid>,
    Json(new): Json<NewVilla>,
) -> Result<Json<Villa>, AppError> {
    claims.require_admin()?;
    let row = state
        .storage
        .update_villa(id, &new)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .ok_or_else(|| AppError::NotFoundError("villa not found".to_string()))?;
    Ok(Json(row))
}

async fn delete_villa(
    State(state): State<AppState>,
    claims: SessionClaims,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    claims.require_admin()?;
    let deleted = state
        .storage
        .delete_villa(id)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    if !deleted {
        return Err(AppError::NotFoundError("villa not found".to_string()));
    }
    Ok(Json(json!({ "deleted": true })))
}

// ==================== Restaurants ====================

async fn list_restaurants(
    State(state): State<AppState>,
    _claims: SessionClaims,
) -> Result<Json<Vec<Restaurant>>, AppError> {
    let rows = state
        .storage
        .list_restaurants()
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    Ok(Json(rows))
}

async fn get_restaurant(
    State(state): State<AppState>,
    _claims: SessionClaims,
    Path(id): Path<Uuid>,
) -> Result<Json<Restaurant>, AppError> {
    let row = state
        .storage
        .get_restaurant(id)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .ok_or_else(|| AppError::NotFoundError("restaurant not found".to_string()))?;
    Ok(Json(row))
}

async fn create_restaurant(
    State(state): State<AppState>,
    claims: SessionClaims,
    Json(new): Json<NewRestaurant>,
) -> Result<(StatusCode, Json<Restaurant>), AppError> {
    claims.require_admin()?;
    let row = state
        .storage
        .create_restaurant(&new)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    Ok((StatusCode::CREATED, Json(row)))
}

async fn update_restaurant(
    State(state): State<AppState>,
    claims: SessionClaims,
    Path(id): Path<Uuid>,
    Json(new): Json<NewRestaurant>,
) -> Result<Json<Restaurant>, AppError> {
    claims.require_admin()?;
    let row = state
        .storage
        .update_restaurant(id, &new)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .ok_or_else(|| AppError::NotFoundError("restaurant not found".to_string()))?;
    Ok(Json(row))
}

async fn delete_restaurant(
    State(state): State<AppState>,
    claims: SessionClaims,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    claims.require_admin()?;
    let deleted = state
        .storage
        .delete_restaurant(id)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    if !deleted {
        return Err(AppError::NotFoundError("restaurant not found".to_string()));
    }
    Ok(Json(json!({ "deleted": true })))
}

// ==================== Bulk import ====================

#[derive(Debug, Serialize)]
struct ImportRowResult {
    row: usize,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct ImportResponse {
    imported: usize,
    failed: usize,
    results: Vec<ImportRowResult>,
}

/// Inserts each row independently; one bad row never aborts the batch.
async fn import_restaurants(
    State(state): State<AppState>,
    claims: SessionClaims,
    Json(rows): Json<Vec<NewRestaurant>>,
) -> Result<Json<ImportResponse>, AppError> {
    claims.require_admin()?;

    let mut results = Vec::with_capacity(rows.len());
    let mut imported = 0usize;
    for (index, row) in rows.iter().enumerate() {
        match state.storage.create_restaurant(row).await {
            Ok(created) => {
                imported += 1;
                results.push(ImportRowResult {
                    row: index,
                    ok: true,
                    id: Some(created.id),
                    error: None,
                });
            }
            Err(err) => {
                results.push(ImportRowResult {
                    row: index,
                    ok: false,
                    id: None,
                    error: Some(err.to_string()),
                });
            }
        }
    }

    let failed = results.len() - imported;
    info!(imported, failed, "restaurant import finished");
    Ok(Json(ImportResponse {
        imported,
        failed,
        results,
    }))
}
