use axum::{
    extract::{FromRef, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{AuthResponse, Credentials, PublicUser, RefreshRequest},
    jwt::{AuthUser, JwtKeys},
    password::{hash_password, is_valid_email, verify_password, MIN_PASSWORD_LEN},
    repo::User,
};
use crate::{
    error::{AppError, AppResult},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

fn issue_tokens(state: &AppState, id: Uuid, email: String) -> AppResult<AuthResponse> {
    let keys = JwtKeys::from_ref(state);
    Ok(AuthResponse {
        access_token: keys.sign_access(id)?,
        refresh_token: keys.sign_refresh(id)?,
        user: PublicUser { id, email },
    })
}

fn normalize(creds: &mut Credentials) -> AppResult<()> {
    creds.email = creds.email.trim().to_lowercase();
    if !is_valid_email(&creds.email) {
        warn!(email = %creds.email, "invalid email");
        return Err(AppError::InvalidInput("invalid email".into()));
    }
    Ok(())
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<Credentials>,
) -> AppResult<Json<AuthResponse>> {
    normalize(&mut payload)?;
    if payload.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::InvalidInput("password too short".into()));
    }

    let hash = hash_password(&payload.password)?;
    let user = User::create(&state.db, &payload.email, &hash)
        .await?
        .ok_or_else(|| {
            warn!(email = %payload.email, "email already registered");
            AppError::Conflict("email already registered".into())
        })?;

    info!(user_id = %user.id, "user registered");
    Ok(Json(issue_tokens(&state, user.id, user.email)?))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<Credentials>,
) -> AppResult<Json<AuthResponse>> {
    normalize(&mut payload)?;

    let invalid = || AppError::Unauthorized("invalid credentials".into());
    let user = User::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(invalid)?;
    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(invalid());
    }

    info!(user_id = %user.id, "user logged in");
    Ok(Json(issue_tokens(&state, user.id, user.email)?))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> AppResult<Json<AuthResponse>> {
    let claims = JwtKeys::from_ref(&state)
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| AppError::Unauthorized(e.to_string()))?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| AppError::Unauthorized("user not found".into()))?;
    Ok(Json(issue_tokens(&state, user.id, user.email)?))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<PublicUser>> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("user not found".into()))?;
    Ok(Json(PublicUser {
        id: user.id,
        email: user.email,
    }))
}
