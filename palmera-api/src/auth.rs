use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::session::{clear_cookie, issue_cookie, Role, SessionClaims};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct GuestRequest {
    email: Option<String>,
}

#[derive(Debug, Serialize)]
struct SessionResponse {
    email: String,
    role: &'static str,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/guest", post(login_guest))
        .route("/logout", post(logout))
        .route("/me", get(me))
}

async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<SessionResponse>), AppError> {
    if req.email == state.auth.admin_email && req.password == state.auth.admin_password {
        info!(email = %req.email, "admin login");
        let cookie = issue_cookie(&state, "admin".to_string(), req.email.clone(), Role::Admin)?;
        return Ok((
            jar.add(cookie),
            Json(SessionResponse {
                email: req.email,
                role: Role::Admin.as_str(),
            }),
        ));
    }

    if let (Some(partner_email), Some(partner_password)) =
        (&state.auth.partner_email, &state.auth.partner_password)
    {
        if req.email == *partner_email && req.password == *partner_password {
            info!(email = %req.email, "partner login");
            let cookie =
                issue_cookie(&state, "partner".to_string(), req.email.clone(), Role::Partner)?;
            return Ok((
                jar.add(cookie),
                Json(SessionResponse {
                    email: req.email,
                    role: Role::Partner.as_str(),
                }),
            ));
        }
    }

    Err(AppError::AuthenticationError(
        "invalid credentials".to_string(),
    ))
}

/// Anonymous traveler session. An email, when given, scopes the session's
/// history lookups to that address.
async fn login_guest(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<GuestRequest>,
) -> Result<(CookieJar, Json<SessionResponse>), AppError> {
    let email = req.email.unwrap_or_default();
    let cookie = issue_cookie(
        &state,
        format!("guest-{}", Uuid::new_v4()),
        email.clone(),
        Role::Traveler,
    )?;
    Ok((
        jar.add(cookie),
        Json(SessionResponse {
            email,
            role: Role::Traveler.as_str(),
        }),
    ))
}

async fn logout(jar: CookieJar) -> (CookieJar, Json<Value>) {
    (jar.remove(clear_cookie()), Json(json!({ "ok": true })))
}

async fn me(claims: SessionClaims) -> Json<SessionResponse> {
    Json(SessionResponse {
        email: claims.email,
        role: claims.role.as_str(),
    })
}
