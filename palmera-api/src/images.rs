use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use palmera_core::catalog::{ImageAsset, NewImageAsset};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::AppError;
use crate::session::SessionClaims;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/images", get(list_images).post(create_image))
        .route(
            "/api/images/{id}",
            get(get_image).put(update_image).delete(delete_image),
        )
}

async fn list_images(
    State(state): State<AppState>,
    _claims: SessionClaims,
) -> Result<Json<Vec<ImageAsset>>, AppError> {
    let rows = state
        .storage
        .list_images()
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    Ok(Json(rows))
}

async fn get_image(
    State(state): State<AppState>,
    _claims: SessionClaims,
    Path(id): Path<Uuid>,
) -> Result<Json<ImageAsset>, AppError> {
    let row = state
        .storage
        .get_image(id)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .ok_or_else(|| AppError::NotFoundError("image not found".to_string()))?;
    Ok(Json(row))
}

async fn create_image(
    State(state): State<AppState>,
    claims: SessionClaims,
    Json(new): Json<NewImageAsset>,
) -> Result<(StatusCode, Json<ImageAsset>), AppError> {
    claims.require_admin()?;
    let row = state
        .storage
        .create_image(&new)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    Ok((StatusCode::CREATED, Json(row)))
}

async fn update_image(
    State(state): State<AppState>,
    claims: SessionClaims,
    Path(id): Path<Uuid>,
    Json(new): Json<NewImageAsset>,
) -> Result<Json<ImageAsset>, AppError> {
    claims.require_admin()?;
    let row = state
        .storage
        .update_image(id, &new)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .ok_or_else(|| AppError::NotFoundError("image not found".to_string()))?;
    Ok(Json(row))
}

async fn delete_image(
    State(state): State<AppState>,
    claims: SessionClaims,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    claims.require_admin()?;
    let deleted = state
        .storage
        .delete_image(id)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    if !deleted {
        return Err(AppError::NotFoundError("image not found".to_string()));
    }
    Ok(Json(json!({ "deleted": true })))
}
