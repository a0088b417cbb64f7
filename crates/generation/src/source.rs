use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("could not build webhook http client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    #[error("webhook request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("webhook returned status {0}")]
    Status(StatusCode),
    #[error("webhook response was not valid JSON: {0}")]
    Decode(#[source] reqwest::Error),
}

/// Produces one raw quote candidate per call. Payload shaping happens in the
/// normalizer, so implementations return whatever JSON they received.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn fetch_candidate(&self) -> Result<Value, SourceError>;

    /// Short operator-facing label for health and diagnostics output.
    fn describe(&self) -> String;
}

pub struct HttpQuoteSource {
    client: Client,
    url: String,
    auth_token: Option<SecretString>,
}

impl HttpQuoteSource {
    pub fn new(
        url: impl Into<String>,
        timeout: Duration,
        auth_token: Option<SecretString>,
    ) -> Result<Self, SourceError> {
        let client =
            Client::builder().timeout(timeout).build().map_err(SourceError::ClientBuild)?;
        Ok(Self { client, url: url.into(), auth_token })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl QuoteSource for HttpQuoteSource {
    async fn fetch_candidate(&self) -> Result<Value, SourceError> {
        let mut request = self.client.get(&self.url).header("Accept", "application/json");
        if let Some(token) = &self.auth_token {
            request = request.header("Authorization", format!("Bearer {}", token.expose_secret()));
        }

        let response = request.send().await.map_err(SourceError::Transport)?;

        if !response.status().is_success() {
            return Err(SourceError::Status(response.status()));
        }

        response.json::<Value>().await.map_err(SourceError::Decode)
    }

    fn describe(&self) -> String {
        format!("webhook {}", self.url)
    }
}

/// Rotating pool used when no webhook is configured, so the app works out of
/// the box.
const CANNED_QUOTES: &[(&str, &str)] = &[
    ("The journey of a thousand miles begins with a single step.", "AI Wisdom"),
    ("Innovation is the ability to see change as an opportunity, not a threat.", "AI Creator"),
    ("The best way to predict the future is to create it.", "AI Visionary"),
    ("In the middle of difficulty lies opportunity.", "AI Philosopher"),
    ("The only limit to our realization of tomorrow is our doubts of today.", "AI Motivator"),
    (
        "Success is not final, failure is not fatal: It is the courage to continue that counts.",
        "AI Sage",
    ),
    ("Knowledge speaks, but wisdom listens.", "AI Observer"),
    (
        "The greatest glory in living lies not in never falling, but in rising every time we fall.",
        "AI Guide",
    ),
];

#[derive(Clone, Copy, Debug, Default)]
pub struct CannedQuoteSource;

#[async_trait]
impl QuoteSource for CannedQuoteSource {
    async fn fetch_candidate(&self) -> Result<Value, SourceError> {
        let mut rng = rand::thread_rng();
        let (text, author) = CANNED_QUOTES[rng.gen_range(0..CANNED_QUOTES.len())];
        Ok(json!({ "text": text, "author": author }))
    }

    fn describe(&self) -> String {
        "built-in sampler".to_string()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::{CannedQuoteSource, QuoteSource, CANNED_QUOTES};

    #[tokio::test]
    async fn canned_source_emits_known_pool_entries() {
        let source = CannedQuoteSource;

        for _ in 0..16 {
            let payload = source.fetch_candidate().await.expect("canned fetch");
            let text = payload.get("text").and_then(Value::as_str).expect("text field");
            let author = payload.get("author").and_then(Value::as_str).expect("author field");

            assert!(CANNED_QUOTES.iter().any(|(t, a)| *t == text && *a == author));
        }
    }

    #[test]
    fn canned_source_describes_itself() {
        assert_eq!(CannedQuoteSource.describe(), "built-in sampler");
    }
}
