use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use palmera_core::submission::PaymentState;
use palmera_pipeline::{verify_signature, SIGNATURE_TOLERANCE};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/create-payment-intent", post(create_payment_intent))
        .route("/api/stripe-webhook", post(stripe_webhook))
}

#[derive(Debug, Deserialize)]
struct CreateIntentRequest {
    /// Minor units (cents).
    amount: i64,
    currency: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreateIntentResponse {
    intent_id: String,
    client_secret: Option<String>,
}

async fn create_payment_intent(
    State(state): State<AppState>,
    Json(req): Json<CreateIntentRequest>,
) -> Result<Json<CreateIntentResponse>, AppError> {
    if req.amount <= 0 {
        return Err(AppError::BadRequest(
            "amount must be a positive number of cents".to_string(),
        ));
    }
    let currency = req.currency.as_deref().unwrap_or("usd");

    let intent = state
        .gateway
        .create_intent(req.amount, currency, req.description.as_deref())
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    info!(intent_id = %intent.id, amount = req.amount, "payment intent created");
    Ok(Json(CreateIntentResponse {
        intent_id: intent.id,
        client_secret: intent.client_secret,
    }))
}

#[derive(Debug, Deserialize)]
struct StripeEvent {
    #[serde(rename = "type")]
    type_: String,
    data: StripeEventData,
}

#[derive(Debug, Deserialize)]
struct StripeEventData {
    object: StripeIntentObject,
}

#[derive(Debug, Deserialize)]
struct StripeIntentObject {
    id: String,
}

/// Gateway callback. The body stays raw until the signature is verified;
/// only then is the event envelope parsed.
async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<StatusCode, AppError> {
    let secret = state.stripe_webhook_secret.as_ref().ok_or_else(|| {
        AppError::InternalServerError("stripe webhook secret is not configured".to_string())
    })?;

    let signature = headers
        .get("stripe-signature")
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            AppError::AuthenticationError("missing stripe-signature header".to_string())
        })?;

    verify_signature(
        body.as_bytes(),
        signature,
        secret,
        SIGNATURE_TOLERANCE,
        Utc::now(),
    )
    .map_err(|e| AppError::AuthenticationError(e.to_string()))?;

    let event: StripeEvent = serde_json::from_str(&body)?;
    let intent_id = &event.data.object.id;

    let new_state = match event.type_.as_str() {
        "payment_intent.succeeded" => PaymentState::Confirmed,
        "payment_intent.payment_failed" | "payment_intent.canceled" => PaymentState::Failed,
        other => {
            info!(event_type = other, "ignoring unhandled stripe event");
            return Ok(StatusCode::OK);
        }
    };

    match state
        .storage
        .update_booking_payment_status(intent_id, new_state)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
    {
        Some(booking) => {
            info!(
                booking_id = %booking.id,
                intent_id = %intent_id,
                status = new_state.as_str(),
                "booking payment status updated via webhook"
            );
        }
        None => {
            // The booking form may not have been submitted yet; the intent
            // id will correlate when it arrives.
            warn!(intent_id = %intent_id, "no booking matches this payment intent");
        }
    }

    Ok(StatusCode::OK)
}
