//! Contact routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
};
use crmdesk_db::ContactRepository;
use uuid::Uuid;
use validator::Validate;

use crate::{
    AppState,
    dto::{ContactRequest, ContactStatusRequest, ListQuery},
    error::ApiResult,
};

/// Creates the contact routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/contacts", get(list_contacts).post(create_contact))
        .route(
            "/contacts/{id}",
            get(get_contact).put(update_contact).delete(delete_contact),
        )
        .route("/contacts/{id}/status", put(set_contact_status))
}

fn repo(state: &AppState) -> ContactRepository {
    ContactRepository::new((*state.db).clone())
}

/// POST /contacts
async fn create_contact(
    State(state): State<AppState>,
    Json(payload): Json<ContactRequest>,
) -> ApiResult<impl IntoResponse> {
    payload.validate()?;
    let contact = repo(&state).create(payload.into()).await?;
    Ok((StatusCode::CREATED, Json(contact)))
}

/// GET /contacts/{id}
async fn get_contact(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(repo(&state).find(id).await?))
}

/// GET /contacts
async fn list_contacts(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(repo(&state).list(&query.page()).await?))
}

/// PUT /contacts/{id}
async fn update_contact(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ContactRequest>,
) -> ApiResult<impl IntoResponse> {
    payload.validate()?;
    Ok(Json(repo(&state).update(id, payload.into()).await?))
}

/// PUT /contacts/{id}/status
async fn set_contact_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ContactStatusRequest>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(repo(&state).set_active(id, payload.is_active).await?))
}

/// DELETE /contacts/{id}
///
/// Refused with 409 while documents or payments reference the contact.
async fn delete_contact(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    repo(&state).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::routes::test_support::{body_json, json_request, send};

    #[tokio::test]
    async fn test_create_contact_rejects_bad_email() {
        let response = send(json_request(
            "POST",
            "/api/v1/contacts",
            &json!({ "name": "Acme", "email": "not-an-email" }),
        ))
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_update_contact_requires_name() {
        let response = send(json_request(
            "PUT",
            "/api/v1/contacts/0192a3b4-0000-7000-8000-000000000001",
            &json!({ "name": "" }),
        ))
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_status_requires_boolean_flag() {
        let response = send(json_request(
            "PUT",
            "/api/v1/contacts/0192a3b4-0000-7000-8000-000000000001/status",
            &json!({ "is_active": "sometimes" }),
        ))
        .await;

        assert!(response.status().is_client_error());
    }
}
