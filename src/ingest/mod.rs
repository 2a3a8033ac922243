//! Adapters for the services that turn a query, barcode or photo into per-100g
//! nutrition values. Each adapter sits behind a trait so the HTTP layer can be
//! exercised with fakes.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::nutrition::Per100g;

pub mod open_food_facts;
pub mod regional;
pub mod usda;
pub mod vision;

pub use open_food_facts::OpenFoodFactsClient;
pub use regional::RegionalFoodDb;
pub use usda::UsdaClient;
pub use vision::{GeminiBarcodeDecoder, GeminiVision};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("unreachable: {0}")]
    Unavailable(String),
    #[error("upstream returned HTTP {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for ServiceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ServiceError::Malformed(e.to_string())
        } else if let Some(status) = e.status() {
            ServiceError::Status(status.as_u16())
        } else {
            ServiceError::Unavailable(e.to_string())
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FoodSource {
    Usda,
    Regional,
    OpenFoodFacts,
    Vision,
}

/// A food as offered to the user before a serving size is confirmed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FoodCandidate {
    pub id: String,
    pub name: String,
    pub brand: Option<String>,
    pub per_100g: Per100g,
    pub source: FoodSource,
}

#[async_trait]
pub trait FoodSearch: Send + Sync {
    /// An empty list is a normal "nothing matched".
    async fn search(&self, query: &str) -> Result<Vec<FoodCandidate>, ServiceError>;
}

#[async_trait]
pub trait BarcodeLookup: Send + Sync {
    async fn lookup(&self, barcode: &str) -> Result<Option<FoodCandidate>, ServiceError>;
}

#[async_trait]
pub trait ImageEstimator: Send + Sync {
    async fn estimate(&self, image: Bytes, content_type: &str) -> Result<FoodCandidate, ServiceError>;
}

#[async_trait]
pub trait BarcodeDecoder: Send + Sync {
    async fn decode(&self, image: Bytes, content_type: &str) -> Result<Option<String>, ServiceError>;
}

pub fn http_client(timeout_secs: u64) -> anyhow::Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(concat!("macrotrack/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// Lenient number reader: upstream payloads mix numbers, numeric strings and nulls.
/// Anything non-finite reads as zero.
pub(crate) fn as_f64(v: Option<&serde_json::Value>) -> f64 {
    let n = match v {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|v| v.is_finite()).unwrap_or(0.0)
}
