use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use quoteiq_core::domain::quote::{Quote, QuoteDraft};

use super::{QuoteStore, StoreError};

#[derive(Default)]
pub struct MemoryQuoteStore {
    inner: RwLock<StoreInner>,
}

#[derive(Default)]
struct StoreInner {
    quotes: HashMap<i64, Quote>,
    next_id: i64,
    current_id: Option<i64>,
    last_created_at: Option<DateTime<Utc>>,
}

impl MemoryQuoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a quote with an explicit timestamp without moving the current
    /// pointer. Used to preload display data; saved quotes must still sort
    /// newer, so the insert clamp applies here too.
    pub async fn seed(&self, draft: QuoteDraft, created_at: DateTime<Utc>) -> Quote {
        let mut inner = self.inner.write().await;
        inner.insert(draft, created_at)
    }
}

impl StoreInner {
    fn insert(&mut self, draft: QuoteDraft, stamp: DateTime<Utc>) -> Quote {
        self.next_id += 1;

        // Timestamps never run backwards, even if the wall clock does.
        let created_at = match self.last_created_at {
            Some(last) if stamp < last => last,
            _ => stamp,
        };
        self.last_created_at = Some(created_at);

        let quote =
            Quote { id: self.next_id, text: draft.text, author: draft.author, created_at };
        self.quotes.insert(quote.id, quote.clone());
        quote
    }
}

#[async_trait::async_trait]
impl QuoteStore for MemoryQuoteStore {
    async fn current(&self) -> Result<Option<Quote>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.current_id.and_then(|id| inner.quotes.get(&id).cloned()))
    }

    async fn recent(&self, limit: usize) -> Result<Vec<Quote>, StoreError> {
        let inner = self.inner.read().await;
        let mut quotes: Vec<Quote> = inner.quotes.values().cloned().collect();
        quotes.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        quotes.truncate(limit);
        Ok(quotes)
    }

    async fn save(&self, draft: QuoteDraft) -> Result<Quote, StoreError> {
        let mut inner = self.inner.write().await;
        let quote = inner.insert(draft, Utc::now());
        inner.current_id = Some(quote.id);
        Ok(quote)
    }
}
