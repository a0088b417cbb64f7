use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::info;

use quoteiq_core::config::{AppConfig, ConfigError, LoadOptions};
use quoteiq_core::generation::GenerationPolicy;
use quoteiq_generation::{
    CannedQuoteSource, GenerationService, HttpQuoteSource, QuoteSource, SourceError,
};
use quoteiq_store::{fixtures, MemoryQuoteStore, QuoteStore};

use crate::api::ApiState;
use crate::health::HealthState;

pub struct Application {
    pub config: AppConfig,
    pub api_state: ApiState,
    pub health_state: HealthState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("quote source initialization failed: {0}")]
    Source(#[source] SourceError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let store = Arc::new(MemoryQuoteStore::new());
    if config.store.seed_samples {
        let seeded = fixtures::seed_samples(&store).await;
        info!(
            event_name = "system.bootstrap.samples_seeded",
            correlation_id = "bootstrap",
            count = seeded.len(),
            "sample quotes seeded"
        );
    }

    let source: Arc<dyn QuoteSource> = match &config.webhook.url {
        Some(url) => {
            let timeout = Duration::from_secs(config.webhook.timeout_secs);
            let source =
                HttpQuoteSource::new(url.clone(), timeout, config.webhook.auth_token.clone())
                    .map_err(BootstrapError::Source)?;
            Arc::new(source)
        }
        None => Arc::new(CannedQuoteSource),
    };
    let source_label = source.describe();
    info!(
        event_name = "system.bootstrap.source_selected",
        correlation_id = "bootstrap",
        source = %source_label,
        "quote source selected"
    );

    let store: Arc<dyn QuoteStore> = store;
    let policy = GenerationPolicy {
        max_attempts: config.generation.max_attempts,
        duplicate_window: config.generation.duplicate_window,
        retry_delay: Duration::from_millis(config.generation.retry_delay_ms),
    };
    let generator = Arc::new(GenerationService::new(source, store.clone(), policy));

    let api_state =
        ApiState { store: store.clone(), generator, recent_limit: config.store.recent_limit };
    let health_state = HealthState { store, source_label };

    Ok(Application { config, api_state, health_state })
}
