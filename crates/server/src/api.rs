//! JSON API routes for the quote dashboard.
//!
//! Endpoints:
//! - `GET  /api/quote/current`   — most recently saved quote, or `null`
//! - `GET  /api/quotes/recent`   — recent quotes, newest first (`?limit=`)
//! - `POST /api/quote/generate`  — fetch, dedupe, and persist a new quote
//! - `POST /api/quote/save`      — persist a caller-supplied quote
//!
//! Anything that is not an API route falls through to the bundled static
//! assets when an assets directory is configured.

use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::services::{ServeDir, ServeFile};
use tracing::{error, info, warn};

use quoteiq_core::config::RECENT_LIMIT_MAX;
use quoteiq_core::domain::quote::{Quote, QuoteDraft};
use quoteiq_generation::GenerationService;
use quoteiq_store::QuoteStore;

#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<dyn QuoteStore>,
    pub generator: Arc<GenerationService>,
    pub recent_limit: usize,
}

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default)]
pub struct RecentQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct SaveQuoteRequest {
    pub text: Option<String>,
    pub author: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/quote/current", get(current_quote))
        .route("/api/quotes/recent", get(recent_quotes))
        .route("/api/quote/generate", post(generate_quote))
        .route("/api/quote/save", post(save_quote))
        .with_state(state)
}

/// Mounts the single-page UI under the router fallback. Unknown paths serve
/// `index.html` so client-side routes survive a refresh.
pub fn with_static_assets(router: Router, assets_dir: &str) -> Router {
    let dir = Path::new(assets_dir);
    if !dir.is_dir() {
        warn!(
            event_name = "system.assets.missing",
            correlation_id = "bootstrap",
            assets_dir = %assets_dir,
            "assets directory not found, static file serving disabled"
        );
        return router;
    }

    info!(
        event_name = "system.assets.mounted",
        correlation_id = "bootstrap",
        assets_dir = %assets_dir,
        "serving static assets"
    );
    let service = ServeDir::new(dir).not_found_service(ServeFile::new(dir.join("index.html")));
    router.fallback_service(service)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn current_quote(
    State(state): State<ApiState>,
) -> Result<Json<Option<Quote>>, (StatusCode, Json<ApiError>)> {
    let quote = state.store.current().await.map_err(|err| {
        error!(event_name = "api.quote.current_failed", error = %err, "failed to read current quote");
        internal_error("Failed to fetch current quote")
    })?;

    Ok(Json(quote))
}

async fn recent_quotes(
    Query(query): Query<RecentQuery>,
    State(state): State<ApiState>,
) -> Result<Json<Vec<Quote>>, (StatusCode, Json<ApiError>)> {
    let limit = query.limit.unwrap_or(state.recent_limit).clamp(1, RECENT_LIMIT_MAX);

    let quotes = state.store.recent(limit).await.map_err(|err| {
        error!(event_name = "api.quotes.recent_failed", error = %err, "failed to read recent quotes");
        internal_error("Failed to fetch recent quotes")
    })?;

    Ok(Json(quotes))
}

async fn generate_quote(
    State(state): State<ApiState>,
) -> Result<Json<Quote>, (StatusCode, Json<ApiError>)> {
    let quote = state.generator.generate().await.map_err(|err| {
        error!(event_name = "api.quote.generate_failed", error = %err, "quote generation failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError {
                message: "Failed to generate quote".to_string(),
                error: Some(err.to_string()),
            }),
        )
    })?;

    Ok(Json(quote))
}

async fn save_quote(
    State(state): State<ApiState>,
    Json(body): Json<SaveQuoteRequest>,
) -> Result<Json<Quote>, (StatusCode, Json<ApiError>)> {
    // Both fields are required; whitespace-only counts as missing.
    let text = body.text.as_deref().map(str::trim).filter(|value| !value.is_empty());
    let author = body.author.as_deref().map(str::trim).filter(|value| !value.is_empty());

    let (text, author) = match (text, author) {
        (Some(text), Some(author)) => (text, author),
        _ => {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(ApiError {
                    message: "Text and author are required".to_string(),
                    error: None,
                }),
            ));
        }
    };

    let quote = state.store.save(QuoteDraft::new(text, author)).await.map_err(|err| {
        error!(event_name = "api.quote.save_failed", error = %err, "failed to persist quote");
        internal_error("Failed to save quote")
    })?;

    info!(event_name = "api.quote.saved", quote_id = quote.id, "quote saved via api");
    Ok(Json(quote))
}

fn internal_error(message: &str) -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiError { message: message.to_string(), error: None }),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::extract::{Query, State};
    use axum::http::{header, Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use quoteiq_core::domain::quote::{Quote, QuoteDraft};
    use quoteiq_core::generation::GenerationPolicy;
    use quoteiq_generation::{CannedQuoteSource, GenerationService, QuoteSource, SourceError};
    use quoteiq_store::memory::MemoryQuoteStore;
    use quoteiq_store::{QuoteStore, StoreError};

    use super::{
        router, save_quote, ApiState, RecentQuery, SaveQuoteRequest,
    };

    struct FailingStore;

    #[async_trait::async_trait]
    impl QuoteStore for FailingStore {
        async fn current(&self) -> Result<Option<Quote>, StoreError> {
            Err(StoreError::Backend("read refused".to_string()))
        }

        async fn recent(&self, _limit: usize) -> Result<Vec<Quote>, StoreError> {
            Err(StoreError::Backend("read refused".to_string()))
        }

        async fn save(&self, _draft: QuoteDraft) -> Result<Quote, StoreError> {
            Err(StoreError::Backend("write refused".to_string()))
        }
    }

    struct FailingSource;

    #[async_trait::async_trait]
    impl QuoteSource for FailingSource {
        async fn fetch_candidate(&self) -> Result<Value, SourceError> {
            Err(SourceError::Status(StatusCode::BAD_GATEWAY))
        }

        fn describe(&self) -> String {
            "always failing".to_string()
        }
    }

    fn test_policy() -> GenerationPolicy {
        GenerationPolicy {
            max_attempts: 3,
            duplicate_window: 10,
            retry_delay: std::time::Duration::ZERO,
        }
    }

    fn api_state(store: Arc<dyn QuoteStore>, source: Arc<dyn QuoteSource>) -> ApiState {
        let generator = Arc::new(GenerationService::new(source, store.clone(), test_policy()));
        ApiState { store, generator, recent_limit: 5 }
    }

    fn working_state() -> ApiState {
        api_state(Arc::new(MemoryQuoteStore::new()), Arc::new(CannedQuoteSource))
    }

    async fn response_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("read body");
        serde_json::from_slice(&bytes).expect("body is json")
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).expect("build request")
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("build request")
    }

    #[tokio::test]
    async fn current_returns_null_until_a_quote_is_saved() {
        let state = working_state();

        let response = router(state.clone())
            .oneshot(get_request("/api/quote/current"))
            .await
            .expect("route current");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response_json(response).await, Value::Null);

        state.store.save(QuoteDraft::new("saved text", "Saved Author")).await.expect("save");

        let response = router(state)
            .oneshot(get_request("/api/quote/current"))
            .await
            .expect("route current");
        let body = response_json(response).await;
        assert_eq!(body["text"], "saved text");
        assert!(body["createdAt"].is_string());
        assert!(body.get("created_at").is_none());
    }

    #[tokio::test]
    async fn recent_respects_explicit_limit() {
        let state = working_state();
        for text in ["one", "two", "three"] {
            state.store.save(QuoteDraft::new(text, "Author")).await.expect("save");
        }

        let response = router(state)
            .oneshot(get_request("/api/quotes/recent?limit=2"))
            .await
            .expect("route recent");

        assert_eq!(response.status(), StatusCode::OK);
        let body = response_json(response).await;
        let quotes = body.as_array().expect("array body");
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[0]["text"], "three");
        assert_eq!(quotes[1]["text"], "two");
    }

    #[tokio::test]
    async fn recent_uses_configured_default_limit() {
        let state = working_state();
        for index in 0..6 {
            state
                .store
                .save(QuoteDraft::new(format!("quote {index}"), "Author"))
                .await
                .expect("save");
        }

        let response = router(state)
            .oneshot(get_request("/api/quotes/recent"))
            .await
            .expect("route recent");

        let body = response_json(response).await;
        assert_eq!(body.as_array().expect("array body").len(), 5);
    }

    #[tokio::test]
    async fn recent_clamps_out_of_range_limits() {
        let state = working_state();
        state.store.save(QuoteDraft::new("single", "Author")).await.expect("save");

        let response = router(state.clone())
            .oneshot(get_request("/api/quotes/recent?limit=0"))
            .await
            .expect("route recent");
        let body = response_json(response).await;
        assert_eq!(body.as_array().expect("array body").len(), 1);

        let response = router(state)
            .oneshot(get_request("/api/quotes/recent?limit=9999"))
            .await
            .expect("route recent");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn generate_persists_and_returns_the_new_quote() {
        let state = working_state();

        let response = router(state.clone())
            .oneshot(post_json("/api/quote/generate", ""))
            .await
            .expect("route generate");

        assert_eq!(response.status(), StatusCode::OK);
        let body = response_json(response).await;
        assert_eq!(body["id"], 1);

        let current = state.store.current().await.expect("read current").expect("current");
        assert_eq!(current.text, body["text"].as_str().expect("text"));
    }

    #[tokio::test]
    async fn generate_failure_maps_to_500_with_cause() {
        let store: Arc<dyn QuoteStore> = Arc::new(MemoryQuoteStore::new());
        let state = api_state(store.clone(), Arc::new(FailingSource));

        let response = router(state)
            .oneshot(post_json("/api/quote/generate", ""))
            .await
            .expect("route generate");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = response_json(response).await;
        assert_eq!(body["message"], "Failed to generate quote");
        assert!(body["error"].as_str().expect("error field").contains("502"));

        assert!(store.current().await.expect("read current").is_none());
    }

    #[tokio::test]
    async fn save_persists_and_updates_current() {
        let state = working_state();

        let response = router(state.clone())
            .oneshot(post_json(
                "/api/quote/save",
                r#"{"text": "  keep learning  ", "author": "A Reader"}"#,
            ))
            .await
            .expect("route save");

        assert_eq!(response.status(), StatusCode::OK);
        let body = response_json(response).await;
        assert_eq!(body["text"], "keep learning");
        assert_eq!(body["author"], "A Reader");

        let current = state.store.current().await.expect("read current").expect("current");
        assert_eq!(current.text, "keep learning");
    }

    #[tokio::test]
    async fn save_rejects_missing_fields_with_400() {
        let state = working_state();

        for body in [r#"{}"#, r#"{"text": "only text"}"#, r#"{"author": "only author"}"#] {
            let response = router(state.clone())
                .oneshot(post_json("/api/quote/save", body))
                .await
                .expect("route save");

            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let payload = response_json(response).await;
            assert_eq!(payload["message"], "Text and author are required");
        }

        assert!(state.store.current().await.expect("read current").is_none());
    }

    #[tokio::test]
    async fn save_rejects_whitespace_only_fields() {
        let state = working_state();

        let result = save_quote(
            State(state),
            axum::Json(SaveQuoteRequest {
                text: Some("   ".to_string()),
                author: Some("Someone".to_string()),
            }),
        )
        .await;

        let (status, axum::Json(payload)) = result.expect_err("whitespace text should fail");
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(payload.message, "Text and author are required");
    }

    #[tokio::test]
    async fn store_faults_map_to_500_bodies() {
        let state = api_state(Arc::new(FailingStore), Arc::new(CannedQuoteSource));

        let response = router(state.clone())
            .oneshot(get_request("/api/quote/current"))
            .await
            .expect("route current");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response_json(response).await["message"], "Failed to fetch current quote");

        let response = router(state.clone())
            .oneshot(get_request("/api/quotes/recent"))
            .await
            .expect("route recent");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response_json(response).await["message"], "Failed to fetch recent quotes");

        let response = router(state)
            .oneshot(post_json("/api/quote/save", r#"{"text": "t", "author": "a"}"#))
            .await
            .expect("route save");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response_json(response).await["message"], "Failed to save quote");
    }

    #[tokio::test]
    async fn recent_query_defaults_to_none() {
        let Query(query) = Query::<RecentQuery>::try_from_uri(
            &"/api/quotes/recent".parse().expect("uri"),
        )
        .expect("parse query");

        assert!(query.limit.is_none());
    }
}
