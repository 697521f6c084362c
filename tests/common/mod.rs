#![allow(dead_code)]

use anyhow::Result;
use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use axum::Router;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::Value;
use tower::ServiceExt;

use flexfields::config;
use flexfields::state::AppState;

/// Build the application router over the sample dataset, in-process.
pub fn test_app() -> Router {
    flexfields::app(AppState::sample())
}

/// Sign a bearer token for the configured JWT secret.
pub fn bearer_token(sub: &str, email: &str) -> String {
    let exp = (Utc::now() + Duration::hours(1)).timestamp();
    let payload = serde_json::json!({
        "sub": sub,
        "email": email,
        "timeZone": "Europe/Lisbon",
        "organizationId": "org-1",
        "exp": exp,
        "iat": Utc::now().timestamp(),
    });
    sign(&payload)
}

/// Sign an arbitrary claim payload for the configured JWT secret.
pub fn sign(payload: &Value) -> String {
    let secret = &config::config().security.jwt_secret;
    encode(
        &Header::default(),
        payload,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("token signing")
}

pub async fn get(app: Router, uri: &str) -> Result<Response> {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty())?)
        .await?;
    Ok(response)
}

pub async fn get_with_bearer(app: Router, uri: &str, token: &str) -> Result<Response> {
    let response = app
        .oneshot(
            Request::builder()
                .uri(uri)
                .header("authorization", format!("Bearer {}", token))
                .body(Body::empty())?,
        )
        .await?;
    Ok(response)
}

pub async fn post_json(app: Router, uri: &str, body: &Value) -> Result<Response> {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(body)?))?,
        )
        .await?;
    Ok(response)
}

pub async fn body_json(response: Response) -> Result<Value> {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}
