use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::SecurityConfig;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("JWT secret not configured")]
    MissingSecret,

    #[error("Token is expired")]
    Expired,

    #[error("Token has no expiration")]
    MissingExpiration,

    #[error("Token is invalid: {0}")]
    InvalidToken(String),

    #[error("Token contained no recognizable user identification")]
    UnrecognizableUser,

    #[error("User account is inactive")]
    InactiveUser,

    #[error("User store error: {0}")]
    Store(String),
}

/// Claim set issued by the external identity provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(rename = "timeZone", default)]
    pub time_zone: Option<String>,
    #[serde(rename = "organizationId", default)]
    pub organization_id: Option<String>,
    pub exp: i64,
    #[serde(default)]
    pub iat: Option<i64>,
}

impl Claims {
    /// Extract the identity fields the user upsert needs. A claim set
    /// lacking either the user identifier or the email is rejected.
    pub fn user_profile(&self) -> Result<UserProfile, AuthError> {
        let (Some(sub), Some(email)) = (self.sub.as_deref(), self.email.as_deref()) else {
            return Err(AuthError::UnrecognizableUser);
        };
        if sub.is_empty() || email.is_empty() {
            return Err(AuthError::UnrecognizableUser);
        }
        Ok(UserProfile {
            external_id: sub.to_string(),
            email: email.to_string(),
            time_zone: self.time_zone.clone().unwrap_or_else(|| "UTC".to_string()),
            organization_id: self.organization_id.clone(),
        })
    }
}

/// Verify a bearer token against the configured secret and decode its claims.
/// Tokens without a verifiable expiration are rejected outright.
pub fn decode_token(token: &str, config: &SecurityConfig) -> Result<Claims, AuthError> {
    if config.jwt_secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }

    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = config.jwt_leeway_secs;
    validation.set_required_spec_claims(&["exp"]);
    if let Some(audience) = &config.jwt_audience {
        validation.set_audience(&[audience]);
    }
    if let Some(issuer) = &config.jwt_issuer {
        validation.set_issuer(&[issuer]);
    }

    let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
    let token_data = decode::<Claims>(token, &decoding_key, &validation).map_err(|e| {
        use jsonwebtoken::errors::ErrorKind;
        match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::Expired,
            ErrorKind::MissingRequiredClaim(claim) if claim == "exp" => {
                AuthError::MissingExpiration
            }
            _ => AuthError::InvalidToken(e.to_string()),
        }
    })?;

    Ok(token_data.claims)
}

/// Identity fields carried over from a verified claim set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub external_id: String,
    pub email: String,
    pub time_zone: String,
    pub organization_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub external_id: String,
    pub email: String,
    pub time_zone: String,
    pub organization_id: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Local user record storage, keyed by email. The middleware upserts on
/// every authenticated request so identity changes at the provider propagate
/// on the next call.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn upsert_by_email(&self, profile: UserProfile) -> Result<User, AuthError>;
}

/// Process-local user store backing the reference server and tests.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<String, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn upsert_by_email(&self, profile: UserProfile) -> Result<User, AuthError> {
        let mut users = self
            .users
            .write()
            .map_err(|e| AuthError::Store(e.to_string()))?;

        let now = Utc::now();
        let user = users
            .entry(profile.email.clone())
            .and_modify(|existing| {
                existing.external_id = profile.external_id.clone();
                existing.time_zone = profile.time_zone.clone();
                existing.organization_id = profile.organization_id.clone();
                existing.updated_at = now;
            })
            .or_insert_with(|| User {
                id: Uuid::new_v4(),
                external_id: profile.external_id,
                email: profile.email,
                time_zone: profile.time_zone,
                organization_id: profile.organization_id,
                active: true,
                created_at: now,
                updated_at: now,
            });

        Ok(user.clone())
    }
}
