use axum::{
    body::{to_bytes, Body},
    extract::FromRef,
    http::{header, Request},
    response::Response,
};
use serde_json::Value;
use uuid::Uuid;

use crate::{auth::jwt::JwtKeys, state::AppState};

pub fn bearer(state: &AppState, user_id: Uuid) -> String {
    let token = JwtKeys::from_ref(state).sign_access(user_id).unwrap();
    format!("Bearer {token}")
}

/// Builds a request; an empty `auth` sends no Authorization header.
pub fn json_request(method: &str, uri: &str, auth: &str, body: Option<Value>) -> Request<Body> {
    let mut req = Request::builder().method(method).uri(uri);
    if !auth.is_empty() {
        req = req.header(header::AUTHORIZATION, auth);
    }
    match body {
        Some(v) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    }
}

pub fn image_request(uri: &str, auth: &str, content_type: &str, bytes: &'static [u8]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, auth)
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(bytes))
        .unwrap()
}

pub async fn read_json(res: Response) -> Value {
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
