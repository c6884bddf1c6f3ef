//! HTTP API layer with Axum routes and the recurring expense scheduler.
//!
//! This crate provides:
//! - REST API routes for contacts, the item catalog, documents, payments, and expenses
//! - Request bodies with field validation
//! - JSON error responses
//! - The daily recurring expense sweep

pub mod dto;
pub mod error;
pub mod routes;
pub mod scheduler;

use axum::Router;
use axum::http::StatusCode;
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use crmdesk_core::storage::StorageService;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ApiResult};
pub use scheduler::RecurringExpenseScheduler;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// Receipt storage (optional).
    pub storage: Option<Arc<StorageService>>,
    /// Recurring expense sweep, shared by the timer and the manual trigger.
    pub scheduler: Arc<RecurringExpenseScheduler>,
    /// Business timezone used to decide what "today" is.
    pub timezone: Tz,
}

impl AppState {
    /// Builds the state around one connection pool.
    pub fn new(db: DatabaseConnection, storage: Option<StorageService>, timezone: Tz) -> Self {
        let scheduler = Arc::new(RecurringExpenseScheduler::new(db.clone()));
        Self {
            db: Arc::new(db),
            storage: storage.map(Arc::new),
            scheduler,
            timezone,
        }
    }

    /// Current date in the business timezone.
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.timezone).date_naive()
    }
}

/// Requests running past `request_timeout` are answered with 408.
fn timeout_layer(request_timeout: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, request_timeout)
}

/// Creates the main application router.
pub fn create_router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(timeout_layer(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, routing::get};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_slow_request_times_out_with_408() {
        let app = Router::new()
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_millis(500)).await;
                    "done"
                }),
            )
            .layer(timeout_layer(Duration::from_millis(10)));

        let response = app
            .oneshot(Request::builder().uri("/slow").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    }
}
