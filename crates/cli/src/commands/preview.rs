use std::time::Duration;

use quoteiq_core::config::{AppConfig, LoadOptions};
use quoteiq_core::normalize::normalize;
use quoteiq_generation::{CannedQuoteSource, HttpQuoteSource, QuoteSource};

use crate::commands::CommandResult;

/// Fetches one candidate from the configured source, normalizes it, and
/// prints it without touching the store.
pub fn run(url_override: Option<String>) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure("preview", "config_validation", error.to_string(), 2);
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "preview",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let url = url_override.or_else(|| config.webhook.url.clone());
    let source: Box<dyn QuoteSource> = match url {
        Some(url) => {
            let timeout = Duration::from_secs(config.webhook.timeout_secs);
            match HttpQuoteSource::new(url, timeout, config.webhook.auth_token.clone()) {
                Ok(source) => Box::new(source),
                Err(error) => {
                    return CommandResult::failure(
                        "preview",
                        "source_init",
                        error.to_string(),
                        3,
                    );
                }
            }
        }
        None => Box::new(CannedQuoteSource),
    };

    let raw = match runtime.block_on(source.fetch_candidate()) {
        Ok(raw) => raw,
        Err(error) => {
            return CommandResult::failure(
                "preview",
                "source_fetch",
                format!("failed to fetch a candidate: {error}"),
                4,
            );
        }
    };

    let draft = normalize(&raw);
    CommandResult::success(
        "preview",
        format!("candidate from {}: \"{}\" - {}", source.describe(), draft.text, draft.author),
    )
}
