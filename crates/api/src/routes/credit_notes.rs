//! Credit note routes, including credit application.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use crmdesk_core::document::CreditNoteStatus;
use crmdesk_db::CreditNoteRepository;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use super::status_filter;
use crate::{
    AppState,
    dto::{ApplyCreditRequest, CreditNoteRequest, ListQuery},
    error::ApiResult,
};

/// Creates the credit note routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/credit-notes", get(list_credit_notes).post(create_credit_note))
        .route("/credit-notes/next-number", get(next_number))
        .route("/credit-notes/stats", get(stats))
        .route(
            "/credit-notes/{id}",
            get(get_credit_note)
                .put(update_credit_note)
                .delete(delete_credit_note),
        )
        .route("/credit-notes/{id}/apply", post(apply_credit))
}

fn repo(state: &AppState) -> CreditNoteRepository {
    CreditNoteRepository::new((*state.db).clone())
}

/// POST /credit-notes
async fn create_credit_note(
    State(state): State<AppState>,
    Json(payload): Json<CreditNoteRequest>,
) -> ApiResult<impl IntoResponse> {
    payload.validate()?;
    let note = repo(&state).create(payload.into()).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

/// GET /credit-notes
async fn list_credit_notes(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<impl IntoResponse> {
    let status = status_filter(query.status.as_deref(), CreditNoteStatus::parse)?;
    Ok(Json(repo(&state).list(status, &query.page()).await?))
}

/// GET /credit-notes/{id}
async fn get_credit_note(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(repo(&state).find(id).await?))
}

/// PUT /credit-notes/{id}
///
/// Remaining credit is recomputed against what was already applied; a new
/// total below that amount is rejected.
async fn update_credit_note(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreditNoteRequest>,
) -> ApiResult<impl IntoResponse> {
    payload.validate()?;
    Ok(Json(repo(&state).update(id, payload.into()).await?))
}

/// DELETE /credit-notes/{id}
async fn delete_credit_note(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    repo(&state).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /credit-notes/next-number
async fn next_number(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let number = repo(&state).next_number().await?;
    Ok(Json(json!({ "next_number": number })))
}

/// GET /credit-notes/stats
async fn stats(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(repo(&state).stats().await?))
}

/// POST /credit-notes/{id}/apply
async fn apply_credit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ApplyCreditRequest>,
) -> ApiResult<impl IntoResponse> {
    payload.validate()?;
    let applied_on = payload.applied_on.unwrap_or_else(|| state.today());

    let application = repo(&state)
        .apply(id, payload.invoice_id, payload.amount, applied_on)
        .await?;

    Ok((StatusCode::CREATED, Json(application)))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::routes::test_support::{body_json, json_request, send};

    #[tokio::test]
    async fn test_apply_credit_rejects_zero_amount() {
        let response = send(json_request(
            "POST",
            "/api/v1/credit-notes/0192a3b4-0000-7000-8000-000000000002/apply",
            &json!({
                "invoice_id": "0192a3b4-0000-7000-8000-000000000001",
                "amount": "0.00"
            }),
        ))
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }
}
