//! Item catalog routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use crmdesk_db::ItemRepository;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    AppState,
    dto::{ImportItemsRequest, ItemListQuery, ItemRequest, page_of},
    error::ApiResult,
};

/// Creates the item catalog routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/items", get(list_items).post(create_item))
        .route("/items/import", post(import_items))
        .route(
            "/items/{id}",
            get(get_item).put(update_item).delete(delete_item),
        )
}

fn repo(state: &AppState) -> ItemRepository {
    ItemRepository::new((*state.db).clone())
}

/// POST /items
async fn create_item(
    State(state): State<AppState>,
    Json(payload): Json<ItemRequest>,
) -> ApiResult<impl IntoResponse> {
    payload.validate()?;
    let item = repo(&state).create(payload.into()).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// POST /items/import
async fn import_items(
    State(state): State<AppState>,
    Json(payload): Json<ImportItemsRequest>,
) -> ApiResult<impl IntoResponse> {
    payload.validate()?;
    let batch = payload.items.into_iter().map(Into::into).collect();
    let imported = repo(&state).import(batch).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "imported": imported.len(), "items": imported })),
    ))
}

/// GET /items?group=
async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<ItemListQuery>,
) -> ApiResult<impl IntoResponse> {
    let page = page_of(query.page, query.per_page);
    let group = query.group.as_deref().map(str::trim).filter(|g| !g.is_empty());
    Ok(Json(repo(&state).list(group, &page).await?))
}

/// GET /items/{id}
async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(repo(&state).find(id).await?))
}

/// PUT /items/{id}
async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ItemRequest>,
) -> ApiResult<impl IntoResponse> {
    payload.validate()?;
    Ok(Json(repo(&state).update(id, payload.into()).await?))
}

/// DELETE /items/{id}
async fn delete_item(
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
    async fn test_create_item_rejects_sub_cent_rate() {
        let response = send(json_request(
            "POST",
            "/api/v1/items",
            &json!({ "name": "Hosting", "rate": "25.005" }),
        ))
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_import_rejects_empty_batch() {
        let response = send(json_request(
            "POST",
            "/api/v1/items/import",
            &json!({ "items": [] }),
        ))
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_import_rejects_nameless_row() {
        let response = send(json_request(
            "POST",
            "/api/v1/items/import",
            &json!({ "items": [{ "name": "Widget" }, { "name": "" }] }),
        ))
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
