//! USDA FoodData Central search.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use super::{FoodCandidate, FoodSearch, FoodSource, ServiceError};
use crate::nutrition::Per100g;

const ENERGY_KCAL_IDS: [u32; 3] = [1008, 2047, 2048];
const PROTEIN_ID: u32 = 1003;
const FAT_ID: u32 = 1004;
const CARBS_ID: u32 = 1005;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    foods: Vec<UsdaFood>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsdaFood {
    fdc_id: u64,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    brand_owner: Option<String>,
    #[serde(default)]
    food_nutrients: Vec<UsdaNutrient>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsdaNutrient {
    #[serde(default)]
    nutrient_id: Option<u32>,
    #[serde(default)]
    nutrient_name: Option<String>,
    #[serde(default)]
    unit_name: Option<String>,
    #[serde(default)]
    value: Option<f64>,
}

/// Matches by nutrient id first and falls back to label matching.
fn extract_per_100g(nutrients: &[UsdaNutrient]) -> Per100g {
    let mut out = Per100g::default();
    for n in nutrients {
        let value = n.value.unwrap_or(0.0);
        let name = n.nutrient_name.as_deref().unwrap_or("").to_lowercase();
        let unit = n.unit_name.as_deref().unwrap_or("").to_lowercase();

        let by_id = n.nutrient_id.and_then(|id| match id {
            id if ENERGY_KCAL_IDS.contains(&id) && unit != "kj" => Some(0),
            PROTEIN_ID => Some(1),
            FAT_ID => Some(2),
            CARBS_ID => Some(3),
            _ => None,
        });
        let slot = by_id.or_else(|| {
            if name.contains("energy") && unit.contains("kcal") {
                Some(0)
            } else if name.contains("protein") {
                Some(1)
            } else if name.contains("total lipid (fat)") || name == "fat" {
                Some(2)
            } else if name.contains("carbohydrate") {
                Some(3)
            } else {
                None
            }
        });

        match slot {
            Some(0) if out.calories == 0.0 => out.calories = value,
            Some(1) if out.protein_g == 0.0 => out.protein_g = value,
            Some(2) if out.fat_g == 0.0 => out.fat_g = value,
            Some(3) if out.carbs_g == 0.0 => out.carbs_g = value,
            _ => {}
        }
    }
    out
}

fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn into_candidate(food: UsdaFood) -> FoodCandidate {
    let name = food
        .description
        .as_deref()
        .map(title_case)
        .unwrap_or_else(|| "Unknown Food".to_string());
    FoodCandidate {
        id: format!("usda:{}", food.fdc_id),
        name,
        brand: food.brand_owner.or_else(|| Some("Generic".to_string())),
        per_100g: extract_per_100g(&food.food_nutrients),
        source: FoodSource::Usda,
    }
}

pub struct UsdaClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    page_size: u32,
}

impl UsdaClient {
    pub fn new(http: reqwest::Client, base_url: &str, api_key: &str, page_size: u32) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            page_size: page_size.clamp(1, 200),
        }
    }
}

#[async_trait]
impl FoodSearch for UsdaClient {
    #[instrument(skip(self), fields(service = "usda"))]
    async fn search(&self, query: &str) -> Result<Vec<FoodCandidate>, ServiceError> {
        let url = format!("{}/foods/search", self.base_url);
        let res = self
            .http
            .get(&url)
            .query(&[
                ("query", query),
                ("pageSize", &self.page_size.to_string()),
                ("api_key", &self.api_key),
            ])
            .send()
            .await?;

        if !res.status().is_success() {
            warn!(status = %res.status(), "usda search failed");
            return Err(ServiceError::Status(res.status().as_u16()));
        }

        let body: SearchResponse = res
            .json()
            .await
            .map_err(|e| ServiceError::Malformed(e.to_string()))?;
        debug!(hits = body.foods.len(), "usda search ok");
        Ok(body.foods.into_iter().map(into_candidate).collect())
    }
}
