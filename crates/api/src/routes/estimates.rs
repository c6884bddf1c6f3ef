//! Estimate routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use crmdesk_core::document::EstimateStatus;
use crmdesk_db::EstimateRepository;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use super::status_filter;
use crate::{
    AppState,
    dto::{EstimateRequest, ListQuery},
    error::ApiResult,
};

/// Creates the estimate routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/estimates", get(list_estimates).post(create_estimate))
        .route("/estimates/next-number", get(next_number))
        .route("/estimates/stats", get(stats))
        .route(
            "/estimates/{id}",
            get(get_estimate).put(update_estimate).delete(delete_estimate),
        )
        .route("/estimates/{id}/convert", post(convert_estimate))
}

fn repo(state: &AppState) -> EstimateRepository {
    EstimateRepository::new((*state.db).clone())
}

/// POST /estimates
async fn create_estimate(
    State(state): State<AppState>,
    Json(payload): Json<EstimateRequest>,
) -> ApiResult<impl IntoResponse> {
    payload.validate()?;
    let estimate = repo(&state).create(payload.into()).await?;
    Ok((StatusCode::CREATED, Json(estimate)))
}

/// GET /estimates
async fn list_estimates(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<impl IntoResponse> {
    let status = status_filter(query.status.as_deref(), EstimateStatus::parse)?;
    Ok(Json(repo(&state).list(status, &query.page()).await?))
}

/// GET /estimates/{id}
async fn get_estimate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(repo(&state).find(id).await?))
}

/// PUT /estimates/{id}
async fn update_estimate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<EstimateRequest>,
) -> ApiResult<impl IntoResponse> {
    payload.validate()?;
    Ok(Json(repo(&state).update(id, payload.into()).await?))
}

/// DELETE /estimates/{id}
async fn delete_estimate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    repo(&state).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /estimates/next-number
async fn next_number(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let number = repo(&state).next_number().await?;
    Ok(Json(json!({ "next_number": number })))
}

/// GET /estimates/stats
async fn stats(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(repo(&state).stats().await?))
}

/// POST /estimates/{id}/convert
async fn convert_estimate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let invoice = repo(&state).convert_to_invoice(id, state.today()).await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}
