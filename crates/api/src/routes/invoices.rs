//! Invoice routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use crmdesk_core::document::InvoiceStatus;
use crmdesk_db::InvoiceRepository;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use super::status_filter;
use crate::{
    AppState,
    dto::{InvoiceRequest, ListQuery},
    error::ApiResult,
};

/// Creates the invoice routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/invoices", get(list_invoices).post(create_invoice))
        .route("/invoices/next-number", get(next_number))
        .route("/invoices/stats", get(stats))
        .route(
            "/invoices/{id}",
            get(get_invoice).put(update_invoice).delete(delete_invoice),
        )
}

fn repo(state: &AppState) -> InvoiceRepository {
    InvoiceRepository::new((*state.db).clone())
}

/// POST /invoices
async fn create_invoice(
    State(state): State<AppState>,
    Json(payload): Json<InvoiceRequest>,
) -> ApiResult<impl IntoResponse> {
    payload.validate()?;
    let invoice = repo(&state).create(payload.into()).await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

/// GET /invoices
async fn list_invoices(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<impl IntoResponse> {
    let status = status_filter(query.status.as_deref(), InvoiceStatus::parse)?;
    Ok(Json(repo(&state).list(status, &query.page()).await?))
}

/// GET /invoices/{id}
async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(repo(&state).find(id).await?))
}

/// PUT /invoices/{id}
async fn update_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<InvoiceRequest>,
) -> ApiResult<impl IntoResponse> {
    payload.validate()?;
    Ok(Json(repo(&state).update(id, payload.into()).await?))
}

/// DELETE /invoices/{id}
async fn delete_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    repo(&state).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /invoices/next-number
async fn next_number(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let number = repo(&state).next_number().await?;
    Ok(Json(json!({ "next_number": number })))
}

/// GET /invoices/stats
async fn stats(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(repo(&state).stats().await?))
}
