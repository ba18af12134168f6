//! # API Handlers
//!
//! `GET /api/logs` searches one provider; `GET /api/keys` lists the
//! provider names a caller may pass as `key`.

use crate::registry::ProviderRegistry;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use ll_core::params::{parse_timestamp, DEFAULT_PAGE_SIZE};
use ll_core::{LogEntry, ParamError, QueryParameters};
use ll_store::{CancellationToken, StoreError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub struct AppState {
    pub registry: ProviderRegistry,
    pub max_page_size: u32,
    /// Cancelled on shutdown; every search runs under a child token.
    pub shutdown: CancellationToken,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/logs", get(get_logs))
        .route("/api/keys", get(get_keys))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// =============================================================================
// Request / Response
// =============================================================================

/// Query string of `/api/logs`. Every value arrives as text so blank
/// values can be treated as absent.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LogsQuery {
    pub page: Option<String>,
    pub count: Option<String>,
    pub level: Option<String>,
    pub search_criteria: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub key: Option<String>,
}

impl LogsQuery {
    fn to_params(&self, max_page_size: u32) -> Result<QueryParameters, ApiError> {
        let page = parse_number("page", self.page.as_deref(), 1)?;
        let count = parse_number("count", self.count.as_deref(), DEFAULT_PAGE_SIZE)?;

        let mut builder = QueryParameters::builder()
            .page(page)
            .page_size(count.min(max_page_size));
        if let Some(level) = &self.level {
            builder = builder.level(level.as_str());
        }
        if let Some(text) = &self.search_criteria {
            builder = builder.search_text(text.as_str());
        }
        if let Some(start) = parse_timestamp("startDate", self.start_date.as_deref().unwrap_or(""))? {
            builder = builder.start_date(start);
        }
        if let Some(end) = parse_timestamp("endDate", self.end_date.as_deref().unwrap_or(""))? {
            builder = builder.end_date(end);
        }
        Ok(builder.build()?)
    }

    fn key(&self) -> Option<&str> {
        self.key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }
}

fn parse_number(field: &str, raw: Option<&str>, default: u32) -> Result<u32, ApiError> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|_| ApiError::BadRequest(format!("`{}` is not a valid {}", value, field))),
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogsResponse {
    pub logs: Vec<LogEntry>,
    pub total: u64,
    pub count: u32,
    pub current_page: u32,
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Unavailable,
    Internal(String),
}

impl From<ParamError> for ApiError {
    fn from(err: ParamError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Cancelled => Self::Unavailable,
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::Unavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "search cancelled, server is shutting down".to_string(),
            ),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

pub async fn get_logs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<LogsResponse>, ApiError> {
    let provider = state.registry.get(query.key()).ok_or_else(|| {
        ApiError::NotFound(format!("no provider named `{}`", query.key().unwrap_or_default()))
    })?;
    let params = query.to_params(state.max_page_size)?;

    let cancel = state.shutdown.child_token();
    let page = provider.fetch_data(&params, &cancel).await.map_err(|err| {
        if !err.is_cancelled() {
            tracing::error!(provider = provider.name(), error = %err, "search failed");
        }
        ApiError::from(err)
    })?;

    Ok(Json(LogsResponse {
        logs: page.entries,
        total: page.total_count,
        count: params.page_size(),
        current_page: params.page(),
    }))
}

pub async fn get_keys(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.registry.names())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::{TimeZone, Utc};
    use ll_core::{PropertyType, RawLogRecord, ResultPage};
    use ll_store::{DataProvider, StoreResult};
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;
    use tower::ServiceExt;

    /// Returns one entry labelled with its own name and records the
    /// parameters of every call.
    struct FakeProvider {
        name: &'static str,
        calls: Mutex<Vec<QueryParameters>>,
        fail: bool,
    }

    impl FakeProvider {
        fn new(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                calls: Mutex::new(Vec::new()),
                fail: false,
            })
        }

        fn failing(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                calls: Mutex::new(Vec::new()),
                fail: true,
            })
        }

        fn last_call(&self) -> QueryParameters {
            self.calls.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait::async_trait]
    impl DataProvider for FakeProvider {
        fn name(&self) -> &str {
            self.name
        }

        async fn fetch_data(
            &self,
            params: &QueryParameters,
            cancel: &CancellationToken,
        ) -> StoreResult<ResultPage> {
            self.calls.lock().unwrap().push(params.clone());
            if cancel.is_cancelled() {
                return Err(StoreError::Cancelled);
            }
            if self.fail {
                return Err(StoreError::Io(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "connection refused",
                )));
            }
            let entry = RawLogRecord {
                timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
                level: Some("4".into()),
                message: Some(self.name.into()),
                ..Default::default()
            }
            .into_entry(params.first_row_number(), PropertyType::Json);
            Ok(ResultPage {
                entries: vec![entry],
                total_count: 42,
            })
        }
    }

    fn app(providers: &[Arc<FakeProvider>], shutdown: CancellationToken) -> Router {
        let mut registry = ProviderRegistry::new();
        for provider in providers {
            registry.register(provider.clone()).unwrap();
        }
        router(Arc::new(AppState {
            registry,
            max_page_size: 50,
            shutdown,
        }))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_logs_defaults_and_response_shape() {
        let provider = FakeProvider::new("primary");
        let (status, body) = get_json(
            app(&[provider.clone()], CancellationToken::new()),
            "/api/logs",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 42);
        assert_eq!(body["count"], 10);
        assert_eq!(body["currentPage"], 1);
        assert_eq!(body["logs"][0]["rowNo"], 1);
        assert_eq!(body["logs"][0]["level"], "Error");
        assert_eq!(provider.last_call().page_size(), 10);
    }

    #[tokio::test]
    async fn test_logs_passes_filters_through() {
        let provider = FakeProvider::new("primary");
        let (status, body) = get_json(
            app(&[provider.clone()], CancellationToken::new()),
            "/api/logs?page=3&count=20&level=Warning&searchCriteria=disk&startDate=2024-01-01T00:00:00%2B02:00&endDate=2024-01-02",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["logs"][0]["rowNo"], 41);
        let params = provider.last_call();
        assert_eq!(params.page(), 3);
        assert_eq!(params.level(), Some("Warning"));
        assert_eq!(params.search_text(), Some("disk"));
        assert_eq!(
            params.start_date(),
            Some(Utc.with_ymd_and_hms(2023, 12, 31, 22, 0, 0).unwrap())
        );
        assert_eq!(
            params.end_date(),
            Some(Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap())
        );
    }

    #[tokio::test]
    async fn test_blank_values_are_absent() {
        let provider = FakeProvider::new("primary");
        let (status, _) = get_json(
            app(&[provider.clone()], CancellationToken::new()),
            "/api/logs?page=&count=&level=&searchCriteria=&startDate=&endDate=&key=",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let params = provider.last_call();
        assert_eq!(params.page(), 1);
        assert_eq!(params.level(), None);
        assert_eq!(params.start_date(), None);
    }

    #[tokio::test]
    async fn test_count_capped_by_max_page_size() {
        let provider = FakeProvider::new("primary");
        let (_, body) = get_json(
            app(&[provider.clone()], CancellationToken::new()),
            "/api/logs?count=10000",
        )
        .await;
        assert_eq!(body["count"], 50);
        assert_eq!(provider.last_call().page_size(), 50);
    }

    #[tokio::test]
    async fn test_key_selects_provider() {
        let first = FakeProvider::new("first");
        let second = FakeProvider::new("second");
        let (status, body) = get_json(
            app(&[first, second], CancellationToken::new()),
            "/api/logs?key=second",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["logs"][0]["message"], "second");
    }

    #[tokio::test]
    async fn test_unknown_key_is_not_found() {
        let (status, body) = get_json(
            app(&[FakeProvider::new("first")], CancellationToken::new()),
            "/api/logs?key=missing",
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("missing"));
    }

    #[tokio::test]
    async fn test_invalid_parameters_are_bad_request() {
        for uri in [
            "/api/logs?page=0",
            "/api/logs?count=0",
            "/api/logs?page=two",
            "/api/logs?startDate=yesterday",
        ] {
            let (status, body) = get_json(
                app(&[FakeProvider::new("p")], CancellationToken::new()),
                uri,
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert!(body["error"].is_string());
        }
    }

    #[tokio::test]
    async fn test_store_failure_is_internal_error() {
        let (status, body) = get_json(
            app(&[FakeProvider::failing("p")], CancellationToken::new()),
            "/api/logs",
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "connection refused");
    }

    #[tokio::test]
    async fn test_shutdown_cancels_search() {
        let shutdown = CancellationToken::new();
        shutdown.cancel();
        let (status, _) = get_json(app(&[FakeProvider::new("p")], shutdown), "/api/logs").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_keys_in_configuration_order() {
        let (status, body) = get_json(
            app(
                &[FakeProvider::new("MSSQL.dbo.Logs"), FakeProvider::new("SQLite.Logs")],
                CancellationToken::new(),
            ),
            "/api/keys",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!(["MSSQL.dbo.Logs", "SQLite.Logs"]));
    }
}
