use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use super::dto::{DayLog, DecodedBarcode, LogFoodRequest, SearchQuery};
use crate::{
    auth::AuthUser,
    error::{AppError, AppResult},
    extract::{image_upload, DateQuery, MAX_IMAGE_BYTES},
    ingest::{FoodCandidate, ServiceError},
    logs::FoodLogEntry,
    state::AppState,
};

pub fn lookup_routes() -> Router<AppState> {
    let uploads = Router::new()
        .route("/foods/analyze", post(analyze_photo))
        .route("/foods/decode-barcode", post(decode_barcode))
        .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES));

    Router::new()
        .route("/foods/search", get(search))
        .route("/foods/regional", get(search_regional))
        .route("/foods/barcode/:code", get(barcode))
        .merge(uploads)
}

pub fn log_routes() -> Router<AppState> {
    Router::new()
        .route("/food-log", get(day_log).post(log_food))
        .route("/food-log/:id", put(replace_entry).delete(delete_entry))
}

fn query_text(q: &SearchQuery) -> AppResult<&str> {
    let q = q.q.trim();
    if q.is_empty() {
        return Err(AppError::InvalidInput("query must not be empty".into()));
    }
    Ok(q)
}

#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<FoodCandidate>>> {
    let q = query_text(&query)?;
    let found = state
        .food_search
        .search(q)
        .await
        .map_err(|e| AppError::external("usda", e))?;
    Ok(Json(found))
}

#[instrument(skip(state))]
pub async fn search_regional(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<FoodCandidate>>> {
    Ok(Json(state.regional.search(query_text(&query)?)))
}

#[instrument(skip(state))]
pub async fn barcode(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(code): Path<String>,
) -> AppResult<Json<FoodCandidate>> {
    if code.is_empty() || !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::InvalidInput("barcode must be digits".into()));
    }
    state
        .barcode_lookup
        .lookup(&code)
        .await
        .map_err(|e| AppError::external("open_food_facts", e))?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("no product for barcode {code}")))
}

#[instrument(skip(state, headers, body))]
pub async fn analyze_photo(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<FoodCandidate>> {
    let (image, content_type) = image_upload(&headers, body)?;
    match state.image_estimator.estimate(image, &content_type).await {
        Ok(candidate) => {
            info!(%user_id, name = %candidate.name, "photo analyzed");
            Ok(Json(candidate))
        }
        Err(ServiceError::Malformed(reason)) => {
            warn!(%user_id, %reason, "vision reply unusable");
            Err(AppError::AnalysisFailed(reason))
        }
        Err(e) => Err(AppError::external("gemini", e)),
    }
}

#[instrument(skip(state, headers, body))]
pub async fn decode_barcode(
    State(state): State<AppState>,
    _user: AuthUser,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<DecodedBarcode>> {
    let (image, content_type) = image_upload(&headers, body)?;
    let barcode = state
        .barcode_decoder
        .decode(image, &content_type)
        .await
        .map_err(|e| AppError::external("gemini", e))?;
    Ok(Json(DecodedBarcode { barcode }))
}

#[instrument(skip(state))]
pub async fn day_log(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<DateQuery>,
) -> AppResult<Json<DayLog>> {
    let date = query.resolve();
    let log = state.session(user_id).food_log().await?;
    Ok(Json(DayLog {
        date,
        entries: log.on(date).cloned().collect(),
        totals: log.totals_on(date),
    }))
}

/// "150g of Chicken Breast"; whole gram amounts print without a fraction.
fn serving_label(grams: f64, name: &str) -> String {
    if grams.fract() == 0.0 {
        format!("{}g of {}", grams as i64, name.trim())
    } else {
        format!("{grams}g of {}", name.trim())
    }
}

#[instrument(skip(state, payload))]
pub async fn log_food(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<LogFoodRequest>,
) -> AppResult<(StatusCode, Json<FoodLogEntry>)> {
    payload.validate()?;
    let entry = FoodLogEntry::new(
        payload.date,
        serving_label(payload.serving_grams, &payload.name),
        payload.per_100g.scale(payload.serving_grams),
    );
    let entry = state
        .session(user_id)
        .update_food_log(|log| log.append(entry).clone())
        .await?;

    info!(%user_id, entry_id = %entry.id, calories = entry.calories, "food logged");
    Ok((StatusCode::CREATED, Json(entry)))
}

#[instrument(skip(state, payload))]
pub async fn replace_entry(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<LogFoodRequest>,
) -> AppResult<Json<FoodLogEntry>> {
    payload.validate()?;
    let name = serving_label(payload.serving_grams, &payload.name);
    let nutrition = payload.per_100g.scale(payload.serving_grams);
    let entry = state
        .session(user_id)
        .update_food_log(|log| log.replace(id, payload.date, name, nutrition).cloned())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("food log entry {id}")))?;

    info!(%user_id, old_id = %id, new_id = %entry.id, "food log entry replaced");
    Ok(Json(entry))
}

#[instrument(skip(state))]
pub async fn delete_entry(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state
        .session(user_id)
        .update_food_log(|log| log.delete(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("food log entry {id}")))?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::serving_label;
    use crate::app::build_app;
    use crate::state::AppState;
    use crate::test_support::{bearer, image_request, json_request, read_json};
    use axum::http::StatusCode;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    fn chicken(date: &str, grams: f64) -> Value {
        json!({
            "date": date,
            "name": "Chicken Breast",
            "serving_grams": grams,
            "per_100g": {"calories": 165.0, "protein_g": 31.0, "fat_g": 3.6, "carbs_g": 0.0}
        })
    }

    #[test]
    fn labels_servings() {
        assert_eq!(serving_label(150.0, " Dal "), "150g of Dal");
        assert_eq!(serving_label(37.5, "Ghee"), "37.5g of Ghee");
    }

    #[tokio::test]
    async fn search_maps_outcomes() {
        let state = AppState::fake();
        let auth = bearer(&state, Uuid::new_v4());
        let app = build_app(state);

        let res = app
            .clone()
            .oneshot(json_request("GET", "/api/v1/foods/search?q=grilled%20chicken", &auth, None))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = read_json(res).await;
        assert_eq!(body[0]["name"], "Chicken Breast");
        assert_eq!(body[0]["per_100g"]["protein_g"], 22.5);

        let res = app
            .clone()
            .oneshot(json_request("GET", "/api/v1/foods/search?q=zzz", &auth, None))
            .await
            .unwrap();
        assert_eq!(read_json(res).await, json!([]));

        let res = app
            .clone()
            .oneshot(json_request("GET", "/api/v1/foods/search?q=outage", &auth, None))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(read_json(res).await["code"], "EXTERNAL_SERVICE_ERROR");

        let res = app
            .oneshot(json_request("GET", "/api/v1/foods/search?q=%20", &auth, None))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn regional_search_is_case_insensitive() {
        let state = AppState::fake();
        let auth = bearer(&state, Uuid::new_v4());
        let res = build_app(state)
            .oneshot(json_request("GET", "/api/v1/foods/regional?q=ROTI", &auth, None))
            .await
            .unwrap();
        let body = read_json(res).await;
        assert!(!body.as_array().unwrap().is_empty());
        assert_eq!(body[0]["source"], "regional");
    }

    #[tokio::test]
    async fn barcode_lookup_outcomes() {
        let state = AppState::fake();
        let auth = bearer(&state, Uuid::new_v4());
        let app = build_app(state);

        let res = app
            .clone()
            .oneshot(json_request("GET", "/api/v1/foods/barcode/737628064502", &auth, None))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(read_json(res).await["name"], "Thai Peanut Noodles");

        let res = app
            .clone()
            .oneshot(json_request("GET", "/api/v1/foods/barcode/00000000", &auth, None))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(read_json(res).await["code"], "NOT_FOUND");

        let res = app
            .clone()
            .oneshot(json_request("GET", "/api/v1/foods/barcode/11111111", &auth, None))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);

        let res = app
            .oneshot(json_request("GET", "/api/v1/foods/barcode/abc", &auth, None))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn photo_analysis_and_barcode_decoding() {
        let state = AppState::fake();
        let auth = bearer(&state, Uuid::new_v4());
        let app = build_app(state);

        let res = app
            .clone()
            .oneshot(image_request("/api/v1/foods/analyze", &auth, "image/jpeg", b"plate"))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(read_json(res).await["name"], "Grilled Chicken");

        let res = app
            .clone()
            .oneshot(image_request("/api/v1/foods/analyze", &auth, "image/jpeg", b"blurry"))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(read_json(res).await["code"], "ANALYSIS_FAILED");

        let res = app
            .clone()
            .oneshot(image_request("/api/v1/foods/analyze", &auth, "text/plain", b"plate"))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let res = app
            .clone()
            .oneshot(image_request("/api/v1/foods/decode-barcode", &auth, "image/png", b"label"))
            .await
            .unwrap();
        assert_eq!(read_json(res).await["barcode"], "737628064502");

        let res = app
            .oneshot(image_request("/api/v1/foods/decode-barcode", &auth, "image/png", b"blank"))
            .await
            .unwrap();
        assert_eq!(read_json(res).await["barcode"], Value::Null);
    }

    #[tokio::test]
    async fn food_log_lifecycle() {
        let state = AppState::fake();
        let auth = bearer(&state, Uuid::new_v4());
        let app = build_app(state);

        let res = app
            .clone()
            .oneshot(json_request("POST", "/api/v1/food-log", &auth, Some(chicken("2026-01-22", 150.0))))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let first = read_json(res).await;
        assert_eq!(first["name"], "150g of Chicken Breast");
        assert_eq!(first["calories"], 248.0);
        assert_eq!(first["protein_g"], 47.0);
        assert_eq!(first["fat_g"], 5.0);

        app.clone()
            .oneshot(json_request("POST", "/api/v1/food-log", &auth, Some(chicken("2026-01-23", 100.0))))
            .await
            .unwrap();

        let res = app
            .clone()
            .oneshot(json_request("GET", "/api/v1/food-log?date=2026-01-22", &auth, None))
            .await
            .unwrap();
        let day = read_json(res).await;
        assert_eq!(day["entries"].as_array().unwrap().len(), 1);
        assert_eq!(day["totals"]["calories"], 248.0);

        let id = first["id"].as_str().unwrap().to_string();
        let res = app
            .clone()
            .oneshot(json_request(
                "PUT",
                &format!("/api/v1/food-log/{id}"),
                &auth,
                Some(chicken("2026-01-22", 200.0)),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let replaced = read_json(res).await;
        assert_ne!(replaced["id"], first["id"]);
        assert_eq!(replaced["calories"], 330.0);

        let res = app
            .clone()
            .oneshot(json_request("DELETE", &format!("/api/v1/food-log/{id}"), &auth, None))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let new_id = replaced["id"].as_str().unwrap();
        let res = app
            .clone()
            .oneshot(json_request("DELETE", &format!("/api/v1/food-log/{new_id}"), &auth, None))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NO_CONTENT);

        let res = app
            .oneshot(json_request("GET", "/api/v1/food-log?date=2026-01-22", &auth, None))
            .await
            .unwrap();
        let day = read_json(res).await;
        assert!(day["entries"].as_array().unwrap().is_empty());
        assert_eq!(day["totals"]["calories"], 0.0);
    }

    #[tokio::test]
    async fn food_logs_are_per_user() {
        let state = AppState::fake();
        let alice = bearer(&state, Uuid::new_v4());
        let bob = bearer(&state, Uuid::new_v4());
        let app = build_app(state);

        app.clone()
            .oneshot(json_request("POST", "/api/v1/food-log", &alice, Some(chicken("2026-01-22", 100.0))))
            .await
            .unwrap();
        let res = app
            .oneshot(json_request("GET", "/api/v1/food-log?date=2026-01-22", &bob, None))
            .await
            .unwrap();
        assert!(read_json(res).await["entries"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn oversized_per_100g_is_rejected_and_history_kept() {
        let state = AppState::fake();
        let auth = bearer(&state, Uuid::new_v4());
        let app = build_app(state);

        app.clone()
            .oneshot(json_request("POST", "/api/v1/food-log", &auth, Some(chicken("2026-01-22", 100.0))))
            .await
            .unwrap();

        let mut huge = chicken("2026-01-22", 5000.0);
        huge["per_100g"]["calories"] = json!(1e308);
        let res = app
            .clone()
            .oneshot(json_request("POST", "/api/v1/food-log", &auth, Some(huge)))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(read_json(res).await["code"], "INVALID_INPUT");

        let res = app
            .oneshot(json_request("GET", "/api/v1/food-log?date=2026-01-22", &auth, None))
            .await
            .unwrap();
        let day = read_json(res).await;
        assert_eq!(day["entries"].as_array().unwrap().len(), 1);
        assert_eq!(day["totals"]["calories"], 165.0);
    }

    #[tokio::test]
    async fn zero_gram_serving_is_rejected() {
        let state = AppState::fake();
        let auth = bearer(&state, Uuid::new_v4());
        let res = build_app(state)
            .oneshot(json_request("POST", "/api/v1/food-log", &auth, Some(chicken("2026-01-22", 0.0))))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
