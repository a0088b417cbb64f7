use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use quoteiq_core::domain::quote::Quote;
use quoteiq_core::generation::{DuplicateGate, GenerationPolicy, GenerationState};
use quoteiq_core::normalize::normalize;
use quoteiq_store::{QuoteStore, StoreError};

use crate::source::{QuoteSource, SourceError};

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("quote source failed: {0}")]
    Source(#[from] SourceError),
    #[error("quote store failed: {0}")]
    Store(#[from] StoreError),
}

pub struct GenerationService {
    source: Arc<dyn QuoteSource>,
    store: Arc<dyn QuoteStore>,
    policy: GenerationPolicy,
}

impl GenerationService {
    pub fn new(
        source: Arc<dyn QuoteSource>,
        store: Arc<dyn QuoteStore>,
        policy: GenerationPolicy,
    ) -> Self {
        Self { source, store, policy }
    }

    /// Runs one generation: fetch a candidate, normalize it, retry while the
    /// text duplicates the recent window, then persist. Source failures abort
    /// the run with nothing written; the window is read once up front, so a
    /// run never competes with its own saves.
    pub async fn generate(&self) -> Result<Quote, GenerationError> {
        let correlation_id = Uuid::new_v4().simple().to_string();

        let recent = self.store.recent(self.policy.duplicate_window).await?;
        let recent_texts: Vec<String> = recent.into_iter().map(|quote| quote.text).collect();
        let mut gate = DuplicateGate::new(recent_texts, self.policy.max_attempts);

        let accepted = loop {
            let candidate = self.source.fetch_candidate().await?;
            let draft = normalize(&candidate);

            match gate.evaluate(&draft.text) {
                GenerationState::AcceptedUnique => break draft,
                GenerationState::AcceptedBestEffort => {
                    warn!(
                        event_name = "generation.duplicate_accepted",
                        correlation_id = %correlation_id,
                        attempts = gate.attempts(),
                        "attempt budget exhausted, accepting duplicate quote"
                    );
                    break draft;
                }
                GenerationState::Attempting => {
                    info!(
                        event_name = "generation.duplicate_rejected",
                        correlation_id = %correlation_id,
                        attempt = gate.attempts(),
                        "candidate duplicates a recent quote, retrying"
                    );
                    tokio::time::sleep(self.policy.retry_delay).await;
                }
            }
        };

        let quote = self.store.save(accepted).await?;
        info!(
            event_name = "generation.quote_saved",
            correlation_id = %correlation_id,
            quote_id = quote.id,
            attempts = gate.attempts(),
            "generated quote persisted"
        );

        Ok(quote)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use reqwest::StatusCode;
    use serde_json::{json, Value};
    use tokio::sync::Mutex;

    use quoteiq_core::domain::quote::{Quote, QuoteDraft};
    use quoteiq_core::generation::GenerationPolicy;
    use quoteiq_core::normalize::{FALLBACK_AUTHOR, FALLBACK_TEXT};
    use quoteiq_store::memory::MemoryQuoteStore;
    use quoteiq_store::{QuoteStore, StoreError};

    use crate::source::{QuoteSource, SourceError};

    use super::{GenerationError, GenerationService};

    struct ScriptedSource {
        responses: Mutex<Vec<Result<Value, SourceError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(responses: Vec<Result<Value, SourceError>>) -> Self {
            Self { responses: Mutex::new(responses), calls: AtomicUsize::new(0) }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl QuoteSource for ScriptedSource {
        async fn fetch_candidate(&self) -> Result<Value, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut responses = self.responses.lock().await;
            assert!(!responses.is_empty(), "scripted source ran out of responses");
            responses.remove(0)
        }

        fn describe(&self) -> String {
            "scripted".to_string()
        }
    }

    struct SaveFailsStore;

    #[async_trait]
    impl QuoteStore for SaveFailsStore {
        async fn current(&self) -> Result<Option<Quote>, StoreError> {
            Ok(None)
        }

        async fn recent(&self, _limit: usize) -> Result<Vec<Quote>, StoreError> {
            Ok(Vec::new())
        }

        async fn save(&self, _draft: QuoteDraft) -> Result<Quote, StoreError> {
            Err(StoreError::Backend("write refused".to_string()))
        }
    }

    fn test_policy() -> GenerationPolicy {
        GenerationPolicy { max_attempts: 3, duplicate_window: 10, retry_delay: Duration::ZERO }
    }

    fn candidate(text: &str) -> Value {
        json!({ "text": text, "author": "Scripted Author" })
    }

    fn service(
        source: Arc<ScriptedSource>,
        store: Arc<dyn QuoteStore>,
    ) -> GenerationService {
        GenerationService::new(source, store, test_policy())
    }

    #[tokio::test]
    async fn unique_candidate_persists_on_first_attempt() {
        let source = Arc::new(ScriptedSource::new(vec![Ok(candidate("fresh wisdom"))]));
        let store = Arc::new(MemoryQuoteStore::new());
        let generator = service(source.clone(), store.clone());

        let quote = generator.generate().await.expect("generate quote");

        assert_eq!(quote.text, "fresh wisdom");
        assert_eq!(source.calls(), 1);

        let current = store.current().await.expect("read current").expect("current exists");
        assert_eq!(current.id, quote.id);
    }

    #[tokio::test]
    async fn duplicates_retry_then_accept_best_effort() {
        let store = Arc::new(MemoryQuoteStore::new());
        store.save(QuoteDraft::new("repeat me", "Scripted Author")).await.expect("seed save");

        let source = Arc::new(ScriptedSource::new(vec![
            Ok(candidate("repeat me")),
            Ok(candidate("repeat me")),
            Ok(candidate("repeat me")),
        ]));
        let generator = service(source.clone(), store.clone());

        let quote = generator.generate().await.expect("generate quote");

        assert_eq!(source.calls(), 3);
        assert_eq!(quote.text, "repeat me");
        assert_eq!(quote.id, 2);

        let current = store.current().await.expect("read current").expect("current exists");
        assert_eq!(current.id, 2);
    }

    #[tokio::test]
    async fn retry_stops_as_soon_as_a_unique_candidate_arrives() {
        let store = Arc::new(MemoryQuoteStore::new());
        store.save(QuoteDraft::new("known text", "Scripted Author")).await.expect("seed save");

        let source = Arc::new(ScriptedSource::new(vec![
            Ok(candidate("known text")),
            Ok(candidate("brand new text")),
        ]));
        let generator = service(source.clone(), store.clone());

        let quote = generator.generate().await.expect("generate quote");

        assert_eq!(source.calls(), 2);
        assert_eq!(quote.text, "brand new text");
    }

    #[tokio::test]
    async fn source_failure_aborts_with_nothing_persisted() {
        let source = Arc::new(ScriptedSource::new(vec![Err(SourceError::Status(
            StatusCode::BAD_GATEWAY,
        ))]));
        let store = Arc::new(MemoryQuoteStore::new());
        let generator = service(source, store.clone());

        let error = generator.generate().await.expect_err("generation should fail");

        assert!(matches!(error, GenerationError::Source(SourceError::Status(_))));
        assert!(store.current().await.expect("read current").is_none());
        assert!(store.recent(10).await.expect("read recent").is_empty());
    }

    #[tokio::test]
    async fn source_failure_mid_retry_also_aborts() {
        let store = Arc::new(MemoryQuoteStore::new());
        store.save(QuoteDraft::new("known text", "Scripted Author")).await.expect("seed save");

        let source = Arc::new(ScriptedSource::new(vec![
            Ok(candidate("known text")),
            Err(SourceError::Status(StatusCode::INTERNAL_SERVER_ERROR)),
        ]));
        let generator = service(source.clone(), store.clone());

        let error = generator.generate().await.expect_err("generation should fail");

        assert!(matches!(error, GenerationError::Source(_)));
        assert_eq!(source.calls(), 2);
        assert_eq!(store.recent(10).await.expect("read recent").len(), 1);
    }

    #[tokio::test]
    async fn unusable_payload_falls_back_to_default_quote() {
        let source = Arc::new(ScriptedSource::new(vec![Ok(json!(null))]));
        let store = Arc::new(MemoryQuoteStore::new());
        let generator = service(source, store);

        let quote = generator.generate().await.expect("generate quote");

        assert_eq!(quote.text, FALLBACK_TEXT);
        assert_eq!(quote.author, FALLBACK_AUTHOR);
    }

    #[tokio::test]
    async fn store_write_failure_surfaces_as_store_error() {
        let source = Arc::new(ScriptedSource::new(vec![Ok(candidate("fresh wisdom"))]));
        let generator = service(source, Arc::new(SaveFailsStore));

        let error = generator.generate().await.expect_err("generation should fail");

        assert!(matches!(error, GenerationError::Store(StoreError::Backend(_))));
    }
}
