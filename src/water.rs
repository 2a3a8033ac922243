//! Daily water tracking against the profile's goal.

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use time::Date;
use tracing::{info, instrument};
use validator::Validate;

use crate::{
    auth::AuthUser,
    error::AppResult,
    extract::DateQuery,
    logs::WaterLog,
    session::Session,
    state::AppState,
};

#[derive(Debug, Deserialize, Validate)]
pub struct WaterChange {
    pub date: Option<Date>,
    #[validate(range(min = 1, max = 5000))]
    pub ml: u32,
}

#[derive(Debug, Deserialize)]
pub struct WaterReset {
    pub date: Option<Date>,
}

#[derive(Debug, Serialize)]
pub struct WaterStatus {
    pub date: Date,
    pub consumed_ml: u32,
    pub goal_ml: u32,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/water", get(status))
        .route("/water/add", post(add))
        .route("/water/undo", post(undo))
        .route("/water/reset", post(reset))
}

fn resolve(date: Option<Date>) -> Date {
    DateQuery { date }.resolve()
}

async fn apply(
    session: &Session<'_>,
    date: Date,
    change: impl FnOnce(&mut WaterLog) + Send,
) -> AppResult<WaterStatus> {
    let consumed_ml = session
        .update_water_log(|log| {
            change(log);
            log.consumed_on(date)
        })
        .await?;
    let goal_ml = session.profile().await?.water_goal_ml;
    Ok(WaterStatus {
        date,
        consumed_ml,
        goal_ml,
    })
}

#[instrument(skip(state))]
pub async fn status(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<DateQuery>,
) -> AppResult<Json<WaterStatus>> {
    let date = query.resolve();
    let session = state.session(user_id);
    let consumed_ml = session.water_log().await?.consumed_on(date);
    let goal_ml = session.profile().await?.water_goal_ml;
    Ok(Json(WaterStatus {
        date,
        consumed_ml,
        goal_ml,
    }))
}

#[instrument(skip(state))]
pub async fn add(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<WaterChange>,
) -> AppResult<Json<WaterStatus>> {
    body.validate()?;
    let date = resolve(body.date);
    let status = apply(&state.session(user_id), date, |log| {
        log.add(date, body.ml);
    })
    .await?;
    info!(%user_id, ml = body.ml, total = status.consumed_ml, "water added");
    Ok(Json(status))
}

#[instrument(skip(state))]
pub async fn undo(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<WaterChange>,
) -> AppResult<Json<WaterStatus>> {
    body.validate()?;
    let date = resolve(body.date);
    let status = apply(&state.session(user_id), date, |log| {
        log.undo(date, body.ml);
    })
    .await?;
    Ok(Json(status))
}

#[instrument(skip(state))]
pub async fn reset(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<WaterReset>,
) -> AppResult<Json<WaterStatus>> {
    let date = resolve(body.date);
    let status = apply(&state.session(user_id), date, |log| log.reset(date)).await?;
    info!(%user_id, %date, "water reset");
    Ok(Json(status))
}
