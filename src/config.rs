use std::str::FromStr;

use anyhow::Context;
use serde::Deserialize;

use crate::metrics::{CalorieMode, CarbMode, MetricsConfig};

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum KvBackend {
    Postgres,
    S3,
    Memory,
}

impl FromStr for KvBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(Self::Postgres),
            "s3" | "minio" => Ok(Self::S3),
            "memory" => Ok(Self::Memory),
            other => anyhow::bail!("unknown KV_BACKEND {other:?}"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Config {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExternalConfig {
    pub usda_api_key: String,
    pub usda_base_url: String,
    pub usda_page_size: u32,
    pub off_base_url: String,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub http_timeout_secs: u64,
}

impl Default for ExternalConfig {
    fn default() -> Self {
        Self {
            usda_api_key: String::new(),
            usda_base_url: "https://api.nal.usda.gov/fdc/v1".into(),
            usda_page_size: 5,
            off_base_url: "https://world.openfoodfacts.org".into(),
            gemini_api_key: String::new(),
            gemini_model: "gemini-1.5-flash".into(),
            gemini_base_url: "https://generativelanguage.googleapis.com/v1beta".into(),
            http_timeout_secs: 15,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub metrics: MetricsConfig,
    /// Most recent log entries kept when a collection is persisted.
    pub log_retention: usize,
    pub kv_backend: KvBackend,
    pub s3: Option<S3Config>,
    pub external: ExternalConfig,
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

impl MetricsConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let d = MetricsConfig::default();
        let calorie_mode = match std::env::var("CALORIE_MODE") {
            Ok(v) => v.parse::<CalorieMode>().map_err(anyhow::Error::msg)?,
            Err(_) => d.calorie_mode,
        };
        let carb_mode = match std::env::var("CARB_MODE") {
            Ok(v) => v.parse::<CarbMode>().map_err(anyhow::Error::msg)?,
            Err(_) => d.carb_mode,
        };
        Ok(Self {
            activity_multiplier: env_or("ACTIVITY_MULTIPLIER", d.activity_multiplier),
            calorie_mode,
            fixed_kcal_delta: env_or("FIXED_KCAL_DELTA", d.fixed_kcal_delta),
            fat_ratio: env_or("FAT_RATIO", d.fat_ratio),
            carb_mode,
            carb_ratio: env_or("CARB_RATIO", d.carb_ratio),
            protein_per_lean_kg: env_or("PROTEIN_PER_LEAN_KG", d.protein_per_lean_kg),
            kcal_per_kg: env_or("KCAL_PER_KG", d.kcal_per_kg),
            days_per_month: env_or("DAYS_PER_MONTH", d.days_per_month),
        })
    }
}

impl ExternalConfig {
    pub fn from_env() -> Self {
        let d = ExternalConfig::default();
        Self {
            usda_api_key: env_string("USDA_API_KEY", "DEMO_KEY"),
            usda_base_url: env_string("USDA_BASE_URL", &d.usda_base_url),
            usda_page_size: env_or("USDA_PAGE_SIZE", d.usda_page_size),
            off_base_url: env_string("OFF_BASE_URL", &d.off_base_url),
            gemini_api_key: env_string("GEMINI_API_KEY", ""),
            gemini_model: env_string("GEMINI_MODEL", &d.gemini_model),
            gemini_base_url: env_string("GEMINI_BASE_URL", &d.gemini_base_url),
            http_timeout_secs: env_or("HTTP_TIMEOUT_SECS", d.http_timeout_secs),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET is not set")?,
            issuer: env_string("JWT_ISSUER", "macrotrack"),
            audience: env_string("JWT_AUDIENCE", "macrotrack-users"),
            ttl_minutes: env_or("JWT_TTL_MINUTES", 60),
            refresh_ttl_minutes: env_or("JWT_REFRESH_TTL_MINUTES", 60 * 24 * 14),
        };

        let kv_backend = match std::env::var("KV_BACKEND") {
            Ok(v) => v.parse()?,
            Err(_) => KvBackend::Postgres,
        };
        let s3 = if kv_backend == KvBackend::S3 {
            Some(S3Config {
                endpoint: std::env::var("S3_ENDPOINT").context("S3_ENDPOINT is not set")?,
                bucket: std::env::var("S3_BUCKET").context("S3_BUCKET is not set")?,
                access_key: std::env::var("S3_ACCESS_KEY").context("S3_ACCESS_KEY is not set")?,
                secret_key: std::env::var("S3_SECRET_KEY").context("S3_SECRET_KEY is not set")?,
                region: env_string("S3_REGION", "us-east-1"),
            })
        } else {
            None
        };

        Ok(Self {
            database_url,
            jwt,
            metrics: MetricsConfig::from_env()?,
            log_retention: env_or("LOG_RETENTION", 100),
            kv_backend,
            s3,
            external: ExternalConfig::from_env(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_names() {
        assert_eq!("Postgres".parse::<KvBackend>().unwrap(), KvBackend::Postgres);
        assert_eq!("minio".parse::<KvBackend>().unwrap(), KvBackend::S3);
        assert_eq!("memory".parse::<KvBackend>().unwrap(), KvBackend::Memory);
        assert!("redis".parse::<KvBackend>().is_err());
    }

    #[test]
    fn env_or_falls_back_on_garbage() {
        std::env::set_var("MACROTRACK_TEST_RATIO", "not-a-number");
        assert_eq!(env_or("MACROTRACK_TEST_RATIO", 0.25), 0.25);
        std::env::set_var("MACROTRACK_TEST_RATIO", "0.3");
        assert_eq!(env_or("MACROTRACK_TEST_RATIO", 0.25), 0.3);
        std::env::remove_var("MACROTRACK_TEST_RATIO");
    }
}
