//! Payment routes.
//!
//! Every write returns the payment together with the invoice it reconciled,
//! so clients see the new `amount_paid` and status without a second request.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use crmdesk_db::PaymentRepository;
use uuid::Uuid;
use validator::Validate;

use crate::{
    AppState,
    dto::{PaymentListQuery, PaymentRequest, UpdatePaymentRequest, page_of},
    error::ApiResult,
};

/// Creates the payment routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/payments", get(list_payments).post(record_payment))
        .route(
            "/payments/{id}",
            get(get_payment).put(update_payment).delete(delete_payment),
        )
}

fn repo(state: &AppState) -> PaymentRepository {
    PaymentRepository::new((*state.db).clone())
}

/// POST /payments
async fn record_payment(
    State(state): State<AppState>,
    Json(payload): Json<PaymentRequest>,
) -> ApiResult<impl IntoResponse> {
    payload.validate()?;
    let outcome = repo(&state).record(payload.into()).await?;

    Ok((StatusCode::CREATED, Json(outcome)))
}

/// GET /payments?invoice_id=
async fn list_payments(
    State(state): State<AppState>,
    Query(query): Query<PaymentListQuery>,
) -> ApiResult<impl IntoResponse> {
    let page = page_of(query.page, query.per_page);
    Ok(Json(repo(&state).list(query.invoice_id, &page).await?))
}

/// GET /payments/{id}
async fn get_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(repo(&state).find(id).await?))
}

/// PUT /payments/{id}
async fn update_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePaymentRequest>,
) -> ApiResult<impl IntoResponse> {
    payload.validate()?;
    Ok(Json(repo(&state).update(id, payload.into()).await?))
}

/// DELETE /payments/{id}
async fn delete_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let outcome = repo(&state).delete(id).await?;
    Ok(Json(outcome))
}
