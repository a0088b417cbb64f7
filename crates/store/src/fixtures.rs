use chrono::{Duration, Utc};

use quoteiq_core::domain::quote::{Quote, QuoteDraft};

use crate::memory::MemoryQuoteStore;

/// Display samples shown before any quote has been generated, oldest first.
const SAMPLE_QUOTES: &[(&str, &str)] = &[
    ("The future belongs to those who believe in the beauty of their dreams.", "AI Dreamer"),
    ("Creativity is intelligence having fun.", "AI Generator"),
];

/// Seeds the display samples. Each entry is backdated a full day apart so
/// anything saved afterwards always sorts ahead of them; the current pointer
/// is left untouched until a real save happens.
pub async fn seed_samples(store: &MemoryQuoteStore) -> Vec<Quote> {
    let now = Utc::now();
    let mut seeded = Vec::with_capacity(SAMPLE_QUOTES.len());

    for (index, (text, author)) in SAMPLE_QUOTES.iter().enumerate() {
        let age_days = (SAMPLE_QUOTES.len() - index + 1) as i64;
        let created_at = now - Duration::days(age_days);
        seeded.push(store.seed(QuoteDraft::new(*text, *author), created_at).await);
    }

    seeded
}
