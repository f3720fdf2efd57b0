//! Authentication API handlers

use crate::api::handlers::AppState;
use crate::api::models::{JsonBody, MessageResponse};
use crate::auth::middleware::CallerIdentity;
use crate::auth::models::{non_empty, LoginRequest, RegisterRequest, TokenResponse, UserProfile};
use crate::core::error::{AuthFailure, Result, ShopError};
use crate::db::models::User;
use crate::db::repository::DUPLICATE_USER_MESSAGE;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

/// Handler for POST /auth/register - User registration
pub async fn register(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> Result<impl IntoResponse> {
    let (email, password) = match (non_empty(req.email), non_empty(req.password)) {
        (Some(email), Some(password)) => (email, password),
        _ => {
            return Err(ShopError::InvalidRequest(
                "Email and password are required".to_string(),
            ))
        }
    };

    tracing::info!(email = %email, "User registration attempt");

    if state.user_repo.find_by_email(&email).await?.is_some() {
        tracing::warn!(email = %email, "Registration rejected: email taken");
        return Err(ShopError::Conflict(DUPLICATE_USER_MESSAGE.to_string()));
    }

    let password_hash = state.hasher.hash_async(password).await?;

    let user = User {
        id: Uuid::new_v4().to_string(),
        email,
        password_hash,
        created_at: chrono::Utc::now().to_rfc3339(),
    };

    // The unique index still decides when two registrations race
    state.user_repo.create(&user).await?;

    tracing::info!(user_id = %user.id, email = %user.email, "User registered successfully");

    Ok((StatusCode::CREATED, Json(MessageResponse::new("User created"))))
}

/// Handler for POST /auth/login - User login
pub async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<Json<TokenResponse>> {
    let (email, password) = match (non_empty(req.email), non_empty(req.password)) {
        (Some(email), Some(password)) => (email, password),
        _ => return Err(AuthFailure::InvalidCredentials.into()),
    };

    tracing::info!(email = %email, "Login attempt");

    let user = state
        .user_repo
        .find_by_email(&email)
        .await?
        .ok_or(ShopError::Authentication(AuthFailure::InvalidCredentials))?;

    let is_valid = state
        .hasher
        .verify_async(password, user.password_hash.clone())
        .await?;
    if !is_valid {
        tracing::warn!(email = %email, "Invalid password");
        return Err(AuthFailure::InvalidCredentials.into());
    }

    let token = state.tokens.issue(&user.id)?;

    tracing::info!(user_id = %user.id, "Login successful");

    Ok(Json(TokenResponse { token }))
}

/// Handler for GET /auth/me - Current user's profile
pub async fn get_me(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<UserProfile>> {
    let user = state
        .user_repo
        .find_by_id(&caller.user_id)
        .await?
        .ok_or_else(|| ShopError::NotFound("User not found".to_string()))?;

    Ok(Json(UserProfile::from(user)))
}
