//! Open Food Facts product lookup by barcode.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::{as_f64, BarcodeLookup, FoodCandidate, FoodSource, ServiceError};
use crate::nutrition::Per100g;

pub struct OpenFoodFactsClient {
    http: reqwest::Client,
    base_url: String,
}

impl OpenFoodFactsClient {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

fn is_valid_barcode(code: &str) -> bool {
    !code.is_empty() && code.len() <= 32 && code.chars().all(|c| c.is_ascii_digit())
}

/// `status != 1` is a missing product, not a failure.
fn parse_product(barcode: &str, body: &Value) -> Option<FoodCandidate> {
    if body.get("status").and_then(Value::as_i64) != Some(1) {
        return None;
    }
    let product = body.get("product")?;
    let nutriments = product.get("nutriments");
    let field = |key: &str| as_f64(nutriments.and_then(|n| n.get(key)));

    let name = product
        .get("product_name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("Unknown Product")
        .to_string();
    let brand = product
        .get("brands")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    Some(FoodCandidate {
        id: format!("off:{barcode}"),
        name,
        brand,
        per_100g: Per100g {
            calories: field("energy-kcal_100g"),
            protein_g: field("proteins_100g"),
            fat_g: field("fat_100g"),
            carbs_g: field("carbohydrates_100g"),
        },
        source: FoodSource::OpenFoodFacts,
    })
}

#[async_trait]
impl BarcodeLookup for OpenFoodFactsClient {
    #[instrument(skip(self), fields(service = "open_food_facts"))]
    async fn lookup(&self, barcode: &str) -> Result<Option<FoodCandidate>, ServiceError> {
        if !is_valid_barcode(barcode) {
            return Ok(None);
        }
        let url = format!("{}/api/v0/product/{}.json", self.base_url, barcode);
        let res = self.http.get(&url).send().await?;

        // OFF answers unknown products with 404 on some mirrors
        if res.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !res.status().is_success() {
            warn!(status = %res.status(), "product lookup failed");
            return Err(ServiceError::Status(res.status().as_u16()));
        }

        let body: Value = res
            .json()
            .await
            .map_err(|e| ServiceError::Malformed(e.to_string()))?;
        let product = parse_product(barcode, &body);
        debug!(found = product.is_some(), "product lookup ok");
        Ok(product)
    }
}
