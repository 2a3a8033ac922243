use serde::{Deserialize, Serialize};
use time::Date;
use validator::Validate;

use crate::{logs::FoodLogEntry, nutrition::{Nutrition, Per100g}};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

/// A confirmed serving of a candidate food.
#[derive(Debug, Deserialize, Validate)]
pub struct LogFoodRequest {
    pub date: Date,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(range(min = 1.0, max = 5000.0))]
    pub serving_grams: f64,
    #[validate(nested)]
    pub per_100g: Per100g,
}

#[derive(Debug, Serialize)]
pub struct DayLog {
    pub date: Date,
    pub entries: Vec<FoodLogEntry>,
    pub totals: Nutrition,
}

#[derive(Debug, Serialize)]
pub struct DecodedBarcode {
    pub barcode: Option<String>,
}
