use axum::{
    extract::{Path, Query, RawQuery, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config;
use crate::error::ApiError;
use crate::flex::{
    contains_wildcard, directive_list_from_value, validate_include_paths, FlexSerializer,
};
use crate::query::QueryDirectives;
use crate::scope::QuerySpec;
use crate::state::AppState;

const ARTICLE_DESCRIPTOR: &str = "blog.serializers.ArticleDetail";

/// Top-level include paths the article endpoints allow. A wildcard include
/// expands to exactly this set.
const PERMITTED_INCLUDES: &[&str] = &["author", "author.address", "comments", "comments.author"];

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub scope: Option<String>,
    pub order: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// GET /api/blog/articles - scoped, windowed collection with dynamic fields
pub async fn article_list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
    RawQuery(raw): RawQuery,
) -> Result<impl IntoResponse, ApiError> {
    let cfg = &config::config().serializer;
    let directives = QueryDirectives::from_query_str(raw.as_deref().unwrap_or(""), cfg);
    let descriptor = article_descriptor(&state)?;

    validate_requested_includes(&state, &directives.include)?;

    let mut spec = state.scopes.apply_global(QuerySpec {
        order: params.order,
        limit: params.limit,
        offset: params.offset,
        ..Default::default()
    });
    if let Some(name) = &params.scope {
        spec = state.scopes.apply(name, spec)?;
    }

    let mut matched: Vec<Value> = state
        .articles
        .iter()
        .filter(|article| spec.matches(article))
        .cloned()
        .collect();
    spec.apply_order(&mut matched);
    let page = spec.apply_window(&matched);

    let permitted = permitted_includes();
    let serializer = FlexSerializer::root(
        &state.registry,
        cfg,
        descriptor,
        directives.include,
        directives.fields,
        directives.omit,
    )
    .permitted_includes(&permitted);

    let data = serializer.serialize_many(page)?;
    Ok(Json(json!({ "success": true, "data": data })))
}

/// GET /api/blog/articles/:id - single resource with dynamic fields
pub async fn article_get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    RawQuery(raw): RawQuery,
) -> Result<impl IntoResponse, ApiError> {
    let cfg = &config::config().serializer;
    let directives = QueryDirectives::from_query_str(raw.as_deref().unwrap_or(""), cfg);
    let descriptor = article_descriptor(&state)?;

    validate_requested_includes(&state, &directives.include)?;

    let article = state
        .articles
        .iter()
        .find(|a| a.get("id").and_then(Value::as_i64) == Some(id))
        .ok_or_else(|| ApiError::not_found(format!("No article with id {}", id)))?;

    let permitted = permitted_includes();
    let mut serializer = FlexSerializer::root(
        &state.registry,
        cfg,
        descriptor,
        directives.include,
        directives.fields,
        directives.omit,
    )
    .permitted_includes(&permitted);

    let data = serializer.serialize(article)?;
    Ok(Json(json!({ "success": true, "data": data })))
}

/// POST /api/blog/articles/search - directives and query spec in the body
pub async fn article_search(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let cfg = &config::config().serializer;
    let descriptor = article_descriptor(&state)?;

    let include = directive_list_from_value(body.get("include").unwrap_or(&Value::Null))?;
    let fields = directive_list_from_value(body.get("fields").unwrap_or(&Value::Null))?;
    let omit = directive_list_from_value(body.get("omit").unwrap_or(&Value::Null))?;

    validate_requested_includes(&state, &include)?;

    let mut spec: QuerySpec = serde_json::from_value(body.clone())
        .map_err(|e| ApiError::bad_request(format!("Invalid query spec: {}", e)))?;
    spec = state.scopes.apply_global(spec);
    if let Some(name) = body.get("scope").and_then(Value::as_str) {
        spec = state.scopes.apply(name, spec)?;
    }

    let mut matched: Vec<Value> = state
        .articles
        .iter()
        .filter(|article| spec.matches(article))
        .cloned()
        .collect();
    spec.apply_order(&mut matched);
    let page = spec.apply_window(&matched);

    let permitted = permitted_includes();
    let serializer = FlexSerializer::root(&state.registry, cfg, descriptor, include, fields, omit)
        .permitted_includes(&permitted);

    let data = serializer.serialize_many(page)?;
    Ok(Json(json!({ "success": true, "data": data })))
}

fn article_descriptor(
    state: &AppState,
) -> Result<std::sync::Arc<crate::flex::ResourceDescriptor>, ApiError> {
    state.registry.get(ARTICLE_DESCRIPTOR).ok_or_else(|| {
        tracing::error!("descriptor registry is missing {}", ARTICLE_DESCRIPTOR);
        ApiError::internal_server_error("An error occurred while processing your request")
    })
}

fn permitted_includes() -> Vec<String> {
    PERMITTED_INCLUDES.iter().map(|s| s.to_string()).collect()
}

/// Up-front include validation. Wildcard tokens are not descriptor paths;
/// they are capped by the permitted list instead, so only literal paths are
/// validated here.
fn validate_requested_includes(state: &AppState, include: &[String]) -> Result<(), ApiError> {
    let cfg = &config::config().serializer;
    let wildcard = cfg.wildcard_values.as_deref();
    let literal: Vec<String> = include
        .iter()
        .filter(|path| !contains_wildcard(std::slice::from_ref(*path), wildcard))
        .cloned()
        .collect();

    if literal.is_empty() {
        return Ok(());
    }

    let descriptor = article_descriptor(state)?;
    validate_include_paths(&state.registry, &descriptor, &literal)?;
    Ok(())
}
