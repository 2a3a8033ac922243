//! Photo analysis through a Gemini `generateContent` model: per-100g food
//! estimates, and reading barcode digits off a still image.

use async_trait::async_trait;
use base64ct::{Base64, Encoding};
use bytes::Bytes;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};

use super::{as_f64, BarcodeDecoder, FoodCandidate, FoodSource, ImageEstimator, ServiceError};
use crate::nutrition::Per100g;

const ESTIMATE_PROMPT: &str = "Identify the food in this photo and estimate its nutrition per 100 grams. \
Reply with only a JSON object of the form \
{\"name\": string, \"calories\": number, \"protein\": number, \"fat\": number, \"carbs\": number}.";

const BARCODE_PROMPT: &str = "Read the product barcode in this photo. \
Reply with only its digits, or NONE if no barcode is legible.";

lazy_static! {
    static ref JSON_OBJECT_RE: Regex = Regex::new(r"(?s)\{.*\}").unwrap();
    static ref BARCODE_RE: Regex = Regex::new(r"\b(\d{8,14})\b").unwrap();
}

#[derive(Clone)]
pub struct GeminiVision {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiVision {
    pub fn new(http: reqwest::Client, base_url: &str, model: &str, api_key: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Sends one prompt plus image and returns the model's text reply.
    async fn ask(&self, prompt: &str, image: &[u8], content_type: &str) -> Result<String, ServiceError> {
        if self.api_key.is_empty() {
            return Err(ServiceError::Unavailable("no vision api key configured".into()));
        }
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = json!({
            "contents": [{
                "parts": [
                    { "text": prompt },
                    { "inline_data": { "mime_type": content_type, "data": Base64::encode_string(image) } }
                ]
            }]
        });
        let res = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;
        if !res.status().is_success() {
            warn!(status = %res.status(), "vision request failed");
            return Err(ServiceError::Status(res.status().as_u16()));
        }
        let reply: Value = res
            .json()
            .await
            .map_err(|e| ServiceError::Malformed(e.to_string()))?;
        reply_text(&reply).ok_or_else(|| ServiceError::Malformed("no text in model reply".into()))
    }
}

fn reply_text(reply: &Value) -> Option<String> {
    let parts = reply
        .pointer("/candidates/0/content/parts")?
        .as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect();
    (!text.trim().is_empty()).then_some(text)
}

/// Pulls the first `{...}` block out of free text (models like to wrap it in
/// fences or prose) and reads it leniently.
pub(crate) fn parse_estimate(text: &str) -> Result<FoodCandidate, ServiceError> {
    let raw = JSON_OBJECT_RE
        .find(text)
        .ok_or_else(|| ServiceError::Malformed("no JSON object in reply".into()))?
        .as_str();
    let obj: Value =
        serde_json::from_str(raw).map_err(|e| ServiceError::Malformed(e.to_string()))?;
    let obj = obj
        .as_object()
        .ok_or_else(|| ServiceError::Malformed("reply is not an object".into()))?;

    let has_numbers = ["calories", "protein", "fat", "carbs"]
        .iter()
        .any(|k| obj.contains_key(*k));
    if !has_numbers {
        return Err(ServiceError::Malformed("reply carries no nutrition fields".into()));
    }

    let name = obj
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("Unknown Food")
        .to_string();

    Ok(FoodCandidate {
        id: "vision".into(),
        name,
        brand: None,
        per_100g: Per100g {
            calories: as_f64(obj.get("calories")).max(0.0),
            protein_g: as_f64(obj.get("protein")).max(0.0),
            fat_g: as_f64(obj.get("fat")).max(0.0),
            carbs_g: as_f64(obj.get("carbs")).max(0.0),
        },
        source: FoodSource::Vision,
    })
}

pub(crate) fn parse_barcode(text: &str) -> Option<String> {
    BARCODE_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

#[async_trait]
impl ImageEstimator for GeminiVision {
    #[instrument(skip(self, image), fields(service = "vision", bytes = image.len()))]
    async fn estimate(&self, image: Bytes, content_type: &str) -> Result<FoodCandidate, ServiceError> {
        let text = self.ask(ESTIMATE_PROMPT, &image, content_type).await?;
        let estimate = parse_estimate(&text)?;
        debug!(name = %estimate.name, "vision estimate ok");
        Ok(estimate)
    }
}

/// Barcode decoding backed by the same vision model.
#[derive(Clone)]
pub struct GeminiBarcodeDecoder(pub GeminiVision);

#[async_trait]
impl BarcodeDecoder for GeminiBarcodeDecoder {
    #[instrument(skip(self, image), fields(service = "vision", bytes = image.len()))]
    async fn decode(&self, image: Bytes, content_type: &str) -> Result<Option<String>, ServiceError> {
        let text = self.0.ask(BARCODE_PROMPT, &image, content_type).await?;
        Ok(parse_barcode(&text))
    }
}
