use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};
use validator::Validate;

use super::dto::{ProfileResponse, ProfileUpdate, TargetsResponse};
use crate::{
    auth::AuthUser,
    error::AppResult,
    metrics::{
        compute_energy_budget, compute_macro_targets, estimate_body_fat_percent,
        projected_goal_weight_kg, BodyFatEstimate, Measurements, Profile,
    },
    state::AppState,
};

const BODY_FAT_MIN: f64 = 3.0;
const BODY_FAT_MAX: f64 = 50.0;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile).put(put_profile))
        .route("/profile/body-fat", post(estimate_body_fat))
        .route("/profile/targets", get(get_targets))
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<Profile>> {
    Ok(Json(state.session(user_id).profile().await?))
}

#[instrument(skip(state, body))]
pub async fn put_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<ProfileUpdate>,
) -> AppResult<Json<ProfileResponse>> {
    let mut profile = body.profile;
    profile.validate()?;

    let estimate = estimate_body_fat_percent(&profile);
    if body.derive_body_fat && estimate.derived {
        profile.body_fat_percent = estimate.value.clamp(BODY_FAT_MIN, BODY_FAT_MAX);
    }

    state.session(user_id).save_profile(&profile).await?;
    info!(%user_id, derived = estimate.derived, "profile saved");
    Ok(Json(ProfileResponse {
        profile,
        body_fat: estimate,
    }))
}

/// Estimate for the stored profile, optionally with one-off measurement overrides.
#[instrument(skip(state, overrides))]
pub async fn estimate_body_fat(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    overrides: Option<Json<Measurements>>,
) -> AppResult<Json<BodyFatEstimate>> {
    let stored = state.session(user_id).profile().await?;
    let profile = match overrides {
        Some(Json(m)) => stored.with_measurements(&m),
        None => stored,
    };
    Ok(Json(estimate_body_fat_percent(&profile)))
}

#[instrument(skip(state))]
pub async fn get_targets(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<TargetsResponse>> {
    let profile = state.session(user_id).profile().await?;
    Ok(Json(targets_for(&profile, &state)))
}

pub(crate) fn targets_for(profile: &Profile, state: &AppState) -> TargetsResponse {
    let cfg = &state.config.metrics;
    let targets = compute_macro_targets(profile, cfg);
    TargetsResponse {
        energy: compute_energy_budget(profile, cfg),
        targets,
        display: targets.rounded(),
        projected_goal_weight_kg: projected_goal_weight_kg(profile),
    }
}
