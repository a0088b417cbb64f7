use async_trait::async_trait;
use thiserror::Error;

use quoteiq_core::domain::quote::{Quote, QuoteDraft};

pub mod fixtures;
pub mod memory;

pub use memory::MemoryQuoteStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait QuoteStore: Send + Sync {
    /// The most recently saved quote, if any quote has been saved yet.
    async fn current(&self) -> Result<Option<Quote>, StoreError>;

    /// Up to `limit` quotes ordered most recent first.
    async fn recent(&self, limit: usize) -> Result<Vec<Quote>, StoreError>;

    /// Persists a draft, assigns it an id and timestamp, and makes it current.
    async fn save(&self, draft: QuoteDraft) -> Result<Quote, StoreError>;
}
