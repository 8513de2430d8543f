use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "palmera_session";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Partner,
    Traveler,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Partner => "partner",
            Role::Traveler => "traveler",
        }
    }
}

/// Signed session payload carried in the `palmera_session` cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub email: String,
    pub role: Role,
    pub exp: usize,
}

impl SessionClaims {
    pub fn is_staff(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Partner)
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(AppError::AuthorizationError(
                "admin session required".to_string(),
            ))
        }
    }

    pub fn require_staff(&self) -> Result<(), AppError> {
        if self.is_staff() {
            Ok(())
        } else {
            Err(AppError::AuthorizationError(
                "staff session required".to_string(),
            ))
        }
    }
}

impl FromRequestParts<AppState> for SessionClaims {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let cookie = jar.get(SESSION_COOKIE).ok_or_else(|| {
            AppError::AuthenticationError("missing session cookie".to_string())
        })?;
        let data = decode::<SessionClaims>(
            cookie.value(),
            &DecodingKey::from_secret(state.auth.session_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| AppError::AuthenticationError("invalid session".to_string()))?;
        Ok(data.claims)
    }
}

/// Mints a session cookie for the given identity.
pub fn issue_cookie(
    state: &AppState,
    sub: String,
    email: String,
    role: Role,
) -> Result<Cookie<'static>, AppError> {
    let claims = SessionClaims {
        sub,
        email,
        role,
        exp: (Utc::now() + Duration::seconds(state.auth.session_ttl_seconds as i64)).timestamp()
            as usize,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(state.auth.session_secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(format!("Token encoding failed: {}", e)))?;

    Ok(Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build())
}

/// Cookie that clears the session; path must match the one set on login.
pub fn clear_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}
