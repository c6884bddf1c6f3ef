//! Expense routes: CRUD, bulk import, receipts, conversion, and the manual
//! recurring sweep.

use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use crmdesk_core::storage::StorageService;
use crmdesk_db::ExpenseRepository;
use crmdesk_shared::AppError;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    AppState,
    dto::{ExpenseListQuery, ExpenseRequest, ImportExpensesRequest, RunSweepQuery, page_of},
    error::{ApiError, ApiResult},
};

/// Upper bound on a receipt upload request; the storage service applies the
/// configured per-file limit on top.
const RECEIPT_BODY_LIMIT: usize = 25 * 1024 * 1024;

/// Creates the expense routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/expenses", get(list_expenses).post(create_expense))
        .route("/expenses/import", post(import_expenses))
        .route("/expenses/recurring/run", post(run_recurring))
        .route(
            "/expenses/{id}",
            get(get_expense).put(update_expense).delete(delete_expense),
        )
        .route(
            "/expenses/{id}/receipt",
            post(upload_receipt)
                .get(download_receipt)
                .layer(DefaultBodyLimit::max(RECEIPT_BODY_LIMIT)),
        )
        .route("/expenses/{id}/convert", post(convert_expense))
}

fn repo(state: &AppState) -> ExpenseRepository {
    ExpenseRepository::new((*state.db).clone())
}

fn storage(state: &AppState) -> ApiResult<&StorageService> {
    state
        .storage
        .as_deref()
        .ok_or_else(|| AppError::ExternalService("receipt storage is not configured".into()).into())
}

/// POST /expenses
async fn create_expense(
    State(state): State<AppState>,
    Json(payload): Json<ExpenseRequest>,
) -> ApiResult<impl IntoResponse> {
    payload.validate()?;
    let expense = repo(&state).create(payload.into()).await?;
    Ok((StatusCode::CREATED, Json(expense)))
}

/// POST /expenses/import
///
/// All rows are inserted in one transaction; a bad row rejects the batch.
async fn import_expenses(
    State(state): State<AppState>,
    Json(payload): Json<ImportExpensesRequest>,
) -> ApiResult<impl IntoResponse> {
    payload.validate()?;
    let inputs = payload.expenses.into_iter().map(Into::into).collect();
    let imported = repo(&state).import(inputs).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "imported": imported.len(), "expenses": imported })),
    ))
}

/// GET /expenses
async fn list_expenses(
    State(state): State<AppState>,
    Query(query): Query<ExpenseListQuery>,
) -> ApiResult<impl IntoResponse> {
    let page = page_of(query.page, query.per_page);
    let category = query.category.as_deref().map(str::trim).filter(|c| !c.is_empty());
    Ok(Json(repo(&state).list(category, &page).await?))
}

/// GET /expenses/{id}
async fn get_expense(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(repo(&state).find(id).await?))
}

/// PUT /expenses/{id}
async fn update_expense(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ExpenseRequest>,
) -> ApiResult<impl IntoResponse> {
    payload.validate()?;
    Ok(Json(repo(&state).update(id, payload.into()).await?))
}

/// DELETE /expenses/{id}
async fn delete_expense(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let deleted = repo(&state).delete(id).await?;

    if let (Some(key), Some(storage)) = (deleted.receipt_path.as_deref(), state.storage.as_deref()) {
        if let Err(e) = storage.delete(key).await {
            warn!(expense_id = %id, key, error = %e, "Failed to delete receipt");
        }
    }
    Ok(StatusCode::NO_CONTENT)
}

/// POST /expenses/{id}/receipt
///
/// Multipart body with a single `file` part.
async fn upload_receipt(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let storage = storage(&state)?;
    let repo = repo(&state);
    let expense = repo.find(id).await?;

    let mut upload: Option<(String, String, Bytes)> = None;
    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("receipt").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let body = field.bytes().await.map_err(bad_multipart)?;
        upload = Some((filename, content_type, body));
        break;
    }

    let Some((filename, content_type, body)) = upload else {
        return Err(AppError::Validation("multipart field 'file' is required".into()).into());
    };

    let stored = storage.put_receipt(id, &filename, &content_type, body).await?;
    let updated = repo.set_receipt(id, stored.storage_key.clone()).await?;

    if let Some(old) = expense.receipt_path.filter(|old| *old != stored.storage_key) {
        if let Err(e) = storage.delete(&old).await {
            warn!(expense_id = %id, key = %old, error = %e, "Failed to delete replaced receipt");
        }
    }

    info!(
        expense_id = %id,
        key = %stored.storage_key,
        size = stored.file_size,
        provider = storage.provider_name(),
        "Receipt stored"
    );
    Ok((
        StatusCode::CREATED,
        Json(json!({ "expense": updated, "receipt": stored })),
    ))
}

/// GET /expenses/{id}/receipt
async fn download_receipt(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let storage = storage(&state)?;
    let expense = repo(&state).find(id).await?;
    let key = expense
        .receipt_path
        .ok_or_else(|| AppError::NotFound(format!("expense {id} has no receipt")))?;

    let body = storage.read(&key).await?;
    Ok(([("content-type", "application/octet-stream")], body))
}

/// POST /expenses/{id}/convert
async fn convert_expense(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let invoice = repo(&state).convert_to_invoice(id, state.today()).await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

/// POST /expenses/recurring/run?date=YYYY-MM-DD
async fn run_recurring(
    State(state): State<AppState>,
    Query(query): Query<RunSweepQuery>,
) -> ApiResult<impl IntoResponse> {
    let today = query.date.unwrap_or_else(|| state.today());
    let report = state.scheduler.run_now(today).await?;
    Ok(Json(report))
}

fn bad_multipart(err: axum::extract::multipart::MultipartError) -> ApiError {
    AppError::Validation(format!("invalid multipart body: {}", err.body_text())).into()
}
