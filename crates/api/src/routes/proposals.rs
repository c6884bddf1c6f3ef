//! Proposal routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use crmdesk_core::document::ProposalStatus;
use crmdesk_db::ProposalRepository;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use super::status_filter;
use crate::{
    AppState,
    dto::{ConvertProposalRequest, ListQuery, ProposalRequest},
    error::ApiResult,
};

/// Creates the proposal routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/proposals", get(list_proposals).post(create_proposal))
        .route("/proposals/next-number", get(next_number))
        .route("/proposals/stats", get(stats))
        .route(
            "/proposals/{id}",
            get(get_proposal).put(update_proposal).delete(delete_proposal),
        )
        .route("/proposals/{id}/convert", post(convert_proposal))
}

fn repo(state: &AppState) -> ProposalRepository {
    ProposalRepository::new((*state.db).clone())
}

async fn create_proposal(
    State(state): State<AppState>,
    Json(payload): Json<ProposalRequest>,
) -> ApiResult<impl IntoResponse> {
    payload.validate()?;
    let proposal = repo(&state).create(payload.into()).await?;
    Ok((StatusCode::CREATED, Json(proposal)))
}

async fn list_proposals(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<impl IntoResponse> {
    let status = status_filter(query.status.as_deref(), ProposalStatus::parse)?;
    Ok(Json(repo(&state).list(status, &query.page()).await?))
}

async fn get_proposal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(repo(&state).find(id).await?))
}

async fn update_proposal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProposalRequest>,
) -> ApiResult<impl IntoResponse> {
    payload.validate()?;
    Ok(Json(repo(&state).update(id, payload.into()).await?))
}

async fn delete_proposal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    repo(&state).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn next_number(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let number = repo(&state).next_number().await?;
    Ok(Json(json!({ "next_number": number })))
}

async fn stats(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(repo(&state).stats().await?))
}

/// POST /proposals/{id}/convert
///
/// Body: `{"target": "invoice"}` or `{"target": "estimate"}`.
async fn convert_proposal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ConvertProposalRequest>,
) -> ApiResult<impl IntoResponse> {
    let converted = repo(&state)
        .convert(id, payload.target, state.today())
        .await?;
    Ok((StatusCode::CREATED, Json(converted)))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::routes::test_support::{json_request, send};

    #[tokio::test]
    async fn test_create_proposal_requires_subject() {
        let response = send(json_request(
            "POST",
            "/api/v1/proposals",
            &json!({
                "contact_id": "0192a3b4-0000-7000-8000-000000000001",
                "subject": "",
                "proposal_date": "2026-10-19",
                "total_amount": "500.00"
            }),
        ))
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_convert_rejects_unknown_target() {
        let response = send(json_request(
            "POST",
            "/api/v1/proposals/0192a3b4-0000-7000-8000-000000000001/convert",
            &json!({ "target": "credit_note" }),
        ))
        .await;

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
