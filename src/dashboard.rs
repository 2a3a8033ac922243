use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use time::Date;
use tracing::instrument;

use crate::{
    auth::AuthUser,
    error::AppResult,
    extract::DateQuery,
    metrics::RoundedTargets,
    nutrition::Nutrition,
    profile::targets_for,
    state::AppState,
};

/// Signed so overshooting a target shows as negative.
#[derive(Debug, Serialize, PartialEq)]
pub struct Remaining {
    pub calories: i64,
    pub protein_g: i64,
    pub fat_g: i64,
    pub carbs_g: i64,
}

impl Remaining {
    fn between(targets: &RoundedTargets, consumed: &Nutrition) -> Self {
        let left = |target: i64, eaten: f64| target - eaten.round() as i64;
        Self {
            calories: left(targets.calories, consumed.calories),
            protein_g: left(targets.protein_g, consumed.protein_g),
            fat_g: left(targets.fat_g, consumed.fat_g),
            carbs_g: left(targets.carbs_g, consumed.carbs_g),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Water {
    pub consumed_ml: u32,
    pub goal_ml: u32,
}

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub date: Date,
    pub targets: RoundedTargets,
    pub consumed: Nutrition,
    pub remaining: Remaining,
    pub water: Water,
    pub entry_count: usize,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/dashboard", get(dashboard))
}

#[instrument(skip(state))]
pub async fn dashboard(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<DateQuery>,
) -> AppResult<Json<Dashboard>> {
    let date = query.resolve();
    let session = state.session(user_id);
    let profile = session.profile().await?;
    let food = session.food_log().await?;
    let water = session.water_log().await?;

    let targets = targets_for(&profile, &state).display;
    let consumed = food.totals_on(date);
    Ok(Json(Dashboard {
        date,
        remaining: Remaining::between(&targets, &consumed),
        targets,
        consumed,
        water: Water {
            consumed_ml: water.consumed_on(date),
            goal_ml: profile.water_goal_ml,
        },
        entry_count: food.on(date).count(),
    }))
}
