use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::Recommendation,
    services::ModelStats,
};

use super::AppState;

/// Shown alongside an empty result list
pub const NO_RESULTS_MESSAGE: &str = "No similar movies found.";

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    #[serde(default)]
    pub title: String,
    pub k: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub query: String,
    pub results: Vec<Recommendation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Titles most similar in genre to the queried title
pub async fn recommend(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    query: Result<Query<RecommendationQuery>, QueryRejection>,
) -> AppResult<Json<RecommendationResponse>> {
    let Query(params) = query?;
    let settings = state.settings();
    let k = params.k.unwrap_or(settings.default_results);
    if k > settings.max_results {
        return Err(AppError::InvalidInput(format!(
            "k must be at most {}",
            settings.max_results
        )));
    }

    let model = state.model().await;
    let results = model.recommend(&params.title, k).map_err(|e| {
        tracing::info!(request_id = %request_id, title = %params.title, error = %e, "Recommendation query rejected");
        e
    })?;

    tracing::info!(
        request_id = %request_id,
        title = %params.title,
        k,
        result_count = results.len(),
        "Recommendations served"
    );

    let message = results.is_empty().then(|| NO_RESULTS_MESSAGE.to_string());
    Ok(Json(RecommendationResponse {
        query: params.title.trim().to_string(),
        results,
        message,
    }))
}

/// Statistics for the model currently serving queries
pub async fn catalog_stats(State(state): State<AppState>) -> Json<ModelStats> {
    Json(state.model().await.stats())
}

/// Rebuild the model from the catalog source and swap it in
pub async fn reload_catalog(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> AppResult<Json<ModelStats>> {
    tracing::info!(request_id = %request_id, "Catalog reload requested");
    let stats = state.reload().await?;
    Ok(Json(stats))
}
