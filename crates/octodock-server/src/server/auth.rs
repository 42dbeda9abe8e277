//! `/api/auth/*` handlers.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{info, instrument};

use crate::auth::AuthError;
use crate::auth::password::{hash_password, verify_password};
use crate::storage::{DatabaseError, User};

use super::error::ApiError;
use super::extract::AuthUser;
use super::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Public view of a user.
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserView,
}

/// Present and non-empty.
fn required(field: Option<String>) -> Option<String> {
    field.filter(|v| !v.is_empty())
}

fn issue(state: &AppState, user: User) -> Result<AuthResponse, ApiError> {
    let (token, _) = state
        .jwt
        .issue_token(&user.id, &user.email)
        .map_err(|e| AuthError::TokenCreation(e.to_string()))?;
    Ok(AuthResponse {
        token,
        user: user.into(),
    })
}

/// `POST /api/auth/register`
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let Json(req) = payload?;
    let (Some(name), Some(email), Some(password)) = (
        required(req.name),
        required(req.email),
        required(req.password),
    ) else {
        return Err(ApiError::InvalidInput("All fields are required".into()));
    };

    if state.db.get_user_by_email(&email).await?.is_some() {
        return Err(ApiError::Conflict("User already exists".into()));
    }

    let hash = hash_password(&password).map_err(AuthError::from)?;
    let user_id = uuid::Uuid::new_v4().to_string();
    let user = match state.db.create_user(&user_id, &name, &email, &hash).await {
        Ok(user) => user,
        Err(DatabaseError::Conflict(_)) => {
            return Err(ApiError::Conflict("User already exists".into()));
        }
        Err(e) => return Err(e.into()),
    };

    info!(user_id = %user.id, "User registered");
    Ok((StatusCode::CREATED, Json(issue(&state, user)?)))
}

/// `POST /api/auth/login`
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Json(req) = payload?;
    let (Some(email), Some(password)) = (required(req.email), required(req.password)) else {
        return Err(ApiError::InvalidInput("Email and password are required".into()));
    };

    let invalid = || ApiError::Unauthorized("Invalid credentials".into());
    let user = state.db.get_user_by_email(&email).await?.ok_or_else(invalid)?;
    if !verify_password(&password, &user.password_hash).map_err(AuthError::from)? {
        return Err(invalid());
    }

    info!(user_id = %user.id, "User logged in");
    Ok(Json(issue(&state, user)?))
}

/// `GET /api/auth/me`
pub async fn me(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<UserView>, ApiError> {
    let user = match state.db.get_user(&claims.sub).await {
        Ok(user) => user,
        Err(DatabaseError::NotFound(_)) => {
            return Err(ApiError::Unauthorized("Not authorized".into()));
        }
        Err(e) => return Err(e.into()),
    };
    Ok(Json(user.into()))
}

/// `POST /api/auth/logout`
///
/// Tokens are stateless; the client discards its copy.
pub async fn logout() -> Json<Value> {
    Json(json!({ "message": "Logged out successfully" }))
}
