use axum::{response::IntoResponse, Extension, Json};
use serde_json::json;

use crate::middleware::AuthUser;

/// GET /api/auth/whoami - the authenticated user, as upserted from the token
pub async fn whoami(Extension(user): Extension<AuthUser>) -> impl IntoResponse {
    Json(json!({
        "success": true,
        "data": {
            "user_id": user.user_id,
            "external_id": user.external_id,
            "email": user.email,
            "time_zone": user.time_zone,
            "organization_id": user.organization_id,
        }
    }))
}
