//! API route definitions.

use axum::Router;
use crmdesk_shared::AppError;

use crate::{AppState, error::ApiResult};

pub mod contacts;
pub mod credit_notes;
pub mod estimates;
pub mod expenses;
pub mod health;
pub mod invoices;
pub mod items;
pub mod payments;
pub mod proposals;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(contacts::routes())
        .merge(items::routes())
        .merge(estimates::routes())
        .merge(invoices::routes())
        .merge(credit_notes::routes())
        .merge(proposals::routes())
        .merge(payments::routes())
        .merge(expenses::routes())
}

/// Parses an optional `?status=` filter with the family's own parser.
fn status_filter<T>(raw: Option<&str>, parse: fn(&str) -> Option<T>) -> ApiResult<Option<T>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => parse(s)
            .map(Some)
            .ok_or_else(|| AppError::Validation(format!("unknown status '{s}'")).into()),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::{Router, body::Body, http::Request, response::Response};
    use chrono_tz::UTC;
    use http_body_util::BodyExt;
    use sea_orm::DatabaseConnection;
    use std::time::Duration;
    use tower::ServiceExt;

    use crate::{AppState, create_router};

    /// Router over a disconnected pool, for requests that never reach the store.
    pub fn app() -> Router {
        let state = AppState::new(DatabaseConnection::Disconnected, None, UTC);
        create_router(state, Duration::from_secs(5))
    }

    pub async fn send(request: Request<Body>) -> Response {
        app().oneshot(request).await.unwrap()
    }

    pub fn json_request(method: &str, uri: &str, body: &serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crmdesk_core::document::InvoiceStatus;

    #[test]
    fn test_status_filter() {
        assert_eq!(
            status_filter(Some("Partially Paid"), InvoiceStatus::parse).unwrap(),
            Some(InvoiceStatus::PartiallyPaid)
        );
        assert_eq!(status_filter(Some("  "), InvoiceStatus::parse).unwrap(), None);
        assert_eq!(status_filter(None, InvoiceStatus::parse).unwrap(), None);
        assert!(status_filter(Some("Settled"), InvoiceStatus::parse).is_err());
    }
}
