use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub serializer: SerializerConfig,
    pub security: SecurityConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

/// Request-facing knobs for the dynamic serializer: which query parameters
/// carry the directives and which tokens count as "everything".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializerConfig {
    pub include_param: String,
    pub fields_param: String,
    pub omit_param: String,
    /// Tokens that mean "all fields/relations". None disables wildcard handling.
    pub wildcard_values: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_audience: Option<String>,
    pub jwt_issuer: Option<String>,
    pub jwt_leeway_secs: u64,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_request_logging: bool,
    pub max_collection_page: usize,
}

impl SerializerConfig {
    fn defaults() -> Self {
        Self {
            include_param: "include".to_string(),
            fields_param: "fields".to_string(),
            omit_param: "omit".to_string(),
            wildcard_values: Some(vec!["~all".to_string(), "*".to_string()]),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Serializer overrides
        if let Ok(v) = env::var("SERIALIZER_INCLUDE_PARAM") {
            if !v.is_empty() {
                self.serializer.include_param = v;
            }
        }
        if let Ok(v) = env::var("SERIALIZER_FIELDS_PARAM") {
            if !v.is_empty() {
                self.serializer.fields_param = v;
            }
        }
        if let Ok(v) = env::var("SERIALIZER_OMIT_PARAM") {
            if !v.is_empty() {
                self.serializer.omit_param = v;
            }
        }
        if let Ok(v) = env::var("SERIALIZER_WILDCARD_VALUES") {
            // Comma list; the literal "none" disables wildcard handling entirely
            self.serializer.wildcard_values = if v.eq_ignore_ascii_case("none") {
                None
            } else {
                Some(
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect(),
                )
            };
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_AUDIENCE") {
            self.security.jwt_audience = Some(v);
        }
        if let Ok(v) = env::var("SECURITY_JWT_ISSUER") {
            self.security.jwt_issuer = Some(v);
        }
        if let Ok(v) = env::var("SECURITY_JWT_LEEWAY_SECS") {
            self.security.jwt_leeway_secs = v.parse().unwrap_or(self.security.jwt_leeway_secs);
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        // API overrides
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_MAX_COLLECTION_PAGE") {
            self.api.max_collection_page = v.parse().unwrap_or(self.api.max_collection_page);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            serializer: SerializerConfig::defaults(),
            security: SecurityConfig {
                jwt_secret: "dev-secret-change-me".to_string(),
                jwt_audience: None,
                jwt_issuer: None,
                jwt_leeway_secs: 30,
                enable_cors: true,
                cors_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ],
            },
            api: ApiConfig {
                enable_request_logging: true,
                max_collection_page: 1000,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            serializer: SerializerConfig::defaults(),
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_audience: None,
                jwt_issuer: None,
                jwt_leeway_secs: 10,
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
            api: ApiConfig {
                enable_request_logging: true,
                max_collection_page: 500,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            serializer: SerializerConfig::defaults(),
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_audience: None,
                jwt_issuer: None,
                jwt_leeway_secs: 0,
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
            api: ApiConfig {
                enable_request_logging: false,
                max_collection_page: 100,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
