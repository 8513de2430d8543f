use axum::{extract::State, routing::post, Json, Router};
use chrono::Utc;
use palmera_core::extension::ExtensionMap;
use palmera_core::submission::{InterestType, Lead, LeadStatus, Submission, UtmParams};
use palmera_pipeline::DispatchOutcome;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::error::AppError;
use crate::session::SessionClaims;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/test-email", post(test_email))
        .route("/test-webhook", post(test_webhook))
}

#[derive(Debug, Deserialize)]
struct TestEmailRequest {
    to: String,
}

#[derive(Debug, Serialize)]
struct TestEmailResponse {
    sent: bool,
}

/// Admin smoke check of the SMTP path.
async fn test_email(
    State(state): State<AppState>,
    claims: SessionClaims,
    Json(req): Json<TestEmailRequest>,
) -> Result<Json<TestEmailResponse>, AppError> {
    claims.require_admin()?;
    let mailer = state
        .mailer
        .as_ref()
        .ok_or_else(|| AppError::BadRequest("email is not configured".to_string()))?;

    let sent = mailer
        .send(
            &req.to,
            "Palmera test email",
            "<p>This is a test email from the Palmera backend.</p>",
        )
        .await;
    Ok(Json(TestEmailResponse { sent }))
}

/// Admin smoke check of the webhook path, using a synthetic lead.
async fn test_webhook(
    State(state): State<AppState>,
    claims: SessionClaims,
) -> Result<Json<DispatchOutcome>, AppError> {
    claims.require_admin()?;
    let dispatcher = state
        .dispatcher
        .as_ref()
        .ok_or_else(|| AppError::BadRequest("webhook is not configured".to_string()))?;

    let mut form_data = ExtensionMap::new();
    form_data.insert("message", json!("Webhook connectivity test"));
    let sample = Submission::Lead(Lead {
        id: Uuid::new_v4(),
        first_name: "Test".to_string(),
        last_name: Some("Lead".to_string()),
        email: "test@palmera.travel".to_string(),
        phone: None,
        interest_type: InterestType::Concierge,
        source: Some("admin-test".to_string()),
        status: LeadStatus::New,
        tags: vec!["test".to_string()],
        utm: UtmParams::default(),
        form_data,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    });

    let outcome = dispatcher.dispatch(&sample).await;
    Ok(Json(outcome))
}
