use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use palmera_core::submission::{
    Booking, BookingUpdate, GuideSubmission, Lead, Submission, SubmissionKind,
};
use palmera_pipeline::{PipelineReport, StepOutcome};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::AppError;
use crate::session::{Role, SessionClaims};
use crate::state::AppState;

/// 201 body for the three intake forms: the stored record plus tracking
/// info when a webhook dispatch ran.
#[derive(Debug, Serialize)]
struct SubmissionResponse {
    record: Submission,
    #[serde(skip_serializing_if = "Option::is_none")]
    tracking_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    email_sent: Option<bool>,
}

impl SubmissionResponse {
    fn from_report(report: PipelineReport) -> Self {
        let (tracking_id, email_sent) = match &report.webhook {
            StepOutcome::Completed(outcome) => {
                (Some(outcome.tracking_id.clone()), Some(outcome.email_sent))
            }
            _ => (None, None),
        };
        Self {
            record: report.submission,
            tracking_id,
            email_sent,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct EmailFilter {
    email: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/leads", post(create_lead).get(list_leads))
        .route("/api/bookings", post(create_booking).get(list_bookings))
        .route("/api/bookings/{id}", get(get_booking).put(update_booking))
        .route(
            "/api/guide-submissions",
            post(create_guide_submission).get(list_guide_submissions),
        )
}

async fn submit(
    state: &AppState,
    kind: SubmissionKind,
    payload: &Value,
) -> Result<(StatusCode, Json<SubmissionResponse>), AppError> {
    let report = state
        .pipeline
        .submit(kind, payload)
        .await
        .map_err(AppError::from_pipeline)?;
    Ok((
        StatusCode::CREATED,
        Json(SubmissionResponse::from_report(report)),
    ))
}

async fn create_lead(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<SubmissionResponse>), AppError> {
    submit(&state, SubmissionKind::Lead, &payload).await
}

async fn create_booking(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<SubmissionResponse>), AppError> {
    submit(&state, SubmissionKind::Booking, &payload).await
}

async fn create_guide_submission(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<SubmissionResponse>), AppError> {
    submit(&state, SubmissionKind::Guide, &payload).await
}

async fn list_leads(
    State(state): State<AppState>,
    claims: SessionClaims,
    Query(filter): Query<EmailFilter>,
) -> Result<Json<Vec<Lead>>, AppError> {
    let leads = match claims.role {
        // Travelers only ever see their own history.
        Role::Traveler => state
            .storage
            .leads_by_email(&claims.email)
            .await
            .map_err(|e| AppError::InternalServerError(e.to_string()))?,
        Role::Admin | Role::Partner => match &filter.email {
            Some(email) => state
                .storage
                .leads_by_email(email)
                .await
                .map_err(|e| AppError::InternalServerError(e.to_string()))?,
            None => state
                .storage
                .list_leads()
                .await
                .map_err(|e| AppError::InternalServerError(e.to_string()))?,
        },
    };
    Ok(Json(leads))
}

async fn list_bookings(
    State(state): State<AppState>,
    claims: SessionClaims,
    Query(filter): Query<EmailFilter>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let bookings = match claims.role {
        Role::Traveler => state
            .storage
            .bookings_by_email(&claims.email)
            .await
            .map_err(|e| AppError::InternalServerError(e.to_string()))?,
        Role::Admin | Role::Partner => match &filter.email {
            Some(email) => state
                .storage
                .bookings_by_email(email)
                .await
                .map_err(|e| AppError::InternalServerError(e.to_string()))?,
            None => state
                .storage
                .list_bookings()
                .await
                .map_err(|e| AppError::InternalServerError(e.to_string()))?,
        },
    };
    Ok(Json(bookings))
}

async fn get_booking(
    State(state): State<AppState>,
    claims: SessionClaims,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    let booking = state
        .storage
        .get_booking(id)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .ok_or_else(|| AppError::NotFoundError("booking not found".to_string()))?;

    // A traveler cannot learn whether someone else's booking id exists.
    if claims.role == Role::Traveler && !booking.email.eq_ignore_ascii_case(&claims.email) {
        return Err(AppError::NotFoundError("booking not found".to_string()));
    }

    Ok(Json(booking))
}

async fn update_booking(
    State(state): State<AppState>,
    claims: SessionClaims,
    Path(id): Path<Uuid>,
    Json(update): Json<BookingUpdate>,
) -> Result<Json<Booking>, AppError> {
    claims.require_admin()?;
    let booking = state
        .storage
        .update_booking(id, &update)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .ok_or_else(|| AppError::NotFoundError("booking not found".to_string()))?;
    Ok(Json(booking))
}

async fn list_guide_submissions(
    State(state): State<AppState>,
    claims: SessionClaims,
) -> Result<Json<Vec<GuideSubmission>>, AppError> {
    claims.require_staff()?;
    let guides = state
        .storage
        .list_guide_submissions()
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    Ok(Json(guides))
}
