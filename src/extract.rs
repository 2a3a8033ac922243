use axum::http::{header::CONTENT_TYPE, HeaderMap};
use bytes::Bytes;
use serde::Deserialize;
use time::{Date, OffsetDateTime};

use crate::error::{AppError, AppResult};

/// Largest accepted photo upload.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// `?date=YYYY-MM-DD`, defaulting to today (UTC).
#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: Option<Date>,
}

impl DateQuery {
    pub fn resolve(&self) -> Date {
        self.date.unwrap_or_else(|| OffsetDateTime::now_utc().date())
    }
}

/// Checks a raw image body and returns it with its content type.
pub fn image_upload(headers: &HeaderMap, body: Bytes) -> AppResult<(Bytes, String)> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    if !content_type.starts_with("image/") {
        return Err(AppError::InvalidInput(format!(
            "expected an image content type, got {content_type:?}"
        )));
    }
    if body.is_empty() {
        return Err(AppError::InvalidInput("image body is empty".into()));
    }
    Ok((body, content_type))
}
