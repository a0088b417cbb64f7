use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use quoteiq_store::QuoteStore;

#[derive(Clone)]
pub struct HealthState {
    pub store: Arc<dyn QuoteStore>,
    pub source_label: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub store: HealthCheck,
    pub source: HealthCheck,
    pub checked_at: String,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let store = store_check(state.store.as_ref()).await;
    let ready = store.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "quoteiq-server runtime initialized".to_string(),
        },
        store,
        source: HealthCheck { status: "ready", detail: state.source_label.clone() },
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn store_check(store: &dyn QuoteStore) -> HealthCheck {
    match store.current().await {
        Ok(_) => HealthCheck { status: "ready", detail: "quote store answered".to_string() },
        Err(error) => {
            HealthCheck { status: "degraded", detail: format!("quote store failed: {error}") }
        }
    }
}
