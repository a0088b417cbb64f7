use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const RECENT_LIMIT_MAX: usize = 50;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub webhook: WebhookConfig,
    pub generation: GenerationConfig,
    pub store: StoreConfig,
    pub ui: UiConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct WebhookConfig {
    pub url: Option<String>,
    pub timeout_secs: u64,
    pub auth_token: Option<SecretString>,
}

#[derive(Clone, Debug)]
pub struct GenerationConfig {
    pub max_attempts: u32,
    pub duplicate_window: usize,
    pub retry_delay_ms: u64,
}

#[derive(Clone, Debug)]
pub struct StoreConfig {
    pub recent_limit: usize,
    pub seed_samples: bool,
}

#[derive(Clone, Debug)]
pub struct UiConfig {
    pub assets_dir: String,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub webhook_url: Option<String>,
    pub webhook_auth_token: Option<String>,
    pub log_level: Option<String>,
    pub seed_samples: Option<bool>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 5000,
                graceful_shutdown_secs: 15,
            },
            webhook: WebhookConfig { url: None, timeout_secs: 10, auth_token: None },
            generation: GenerationConfig {
                max_attempts: 3,
                duplicate_window: 10,
                retry_delay_ms: 500,
            },
            store: StoreConfig { recent_limit: 5, seed_samples: false },
            ui: UiConfig { assets_dir: "public".to_string() },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("quoteiq.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(webhook) = patch.webhook {
            if let Some(url) = webhook.url {
                self.webhook.url = Some(url);
            }
            if let Some(timeout_secs) = webhook.timeout_secs {
                self.webhook.timeout_secs = timeout_secs;
            }
            if let Some(auth_token_value) = webhook.auth_token {
                self.webhook.auth_token = Some(secret_value(auth_token_value));
            }
        }

        if let Some(generation) = patch.generation {
            if let Some(max_attempts) = generation.max_attempts {
                self.generation.max_attempts = max_attempts;
            }
            if let Some(duplicate_window) = generation.duplicate_window {
                self.generation.duplicate_window = duplicate_window;
            }
            if let Some(retry_delay_ms) = generation.retry_delay_ms {
                self.generation.retry_delay_ms = retry_delay_ms;
            }
        }

        if let Some(store) = patch.store {
            if let Some(recent_limit) = store.recent_limit {
                self.store.recent_limit = recent_limit;
            }
            if let Some(seed_samples) = store.seed_samples {
                self.store.seed_samples = seed_samples;
            }
        }

        if let Some(ui) = patch.ui {
            if let Some(assets_dir) = ui.assets_dir {
                self.ui.assets_dir = assets_dir;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("QUOTEIQ_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("QUOTEIQ_SERVER_PORT") {
            self.server.port = parse_u16("QUOTEIQ_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("QUOTEIQ_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("QUOTEIQ_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        if let Some(value) = read_env("QUOTEIQ_WEBHOOK_URL") {
            self.webhook.url = Some(value);
        }
        if let Some(value) = read_env("QUOTEIQ_WEBHOOK_TIMEOUT_SECS") {
            self.webhook.timeout_secs = parse_u64("QUOTEIQ_WEBHOOK_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("QUOTEIQ_WEBHOOK_AUTH_TOKEN") {
            self.webhook.auth_token = Some(secret_value(value));
        }

        if let Some(value) = read_env("QUOTEIQ_GENERATION_MAX_ATTEMPTS") {
            self.generation.max_attempts = parse_u32("QUOTEIQ_GENERATION_MAX_ATTEMPTS", &value)?;
        }
        if let Some(value) = read_env("QUOTEIQ_GENERATION_DUPLICATE_WINDOW") {
            self.generation.duplicate_window =
                parse_usize("QUOTEIQ_GENERATION_DUPLICATE_WINDOW", &value)?;
        }
        if let Some(value) = read_env("QUOTEIQ_GENERATION_RETRY_DELAY_MS") {
            self.generation.retry_delay_ms =
                parse_u64("QUOTEIQ_GENERATION_RETRY_DELAY_MS", &value)?;
        }

        if let Some(value) = read_env("QUOTEIQ_STORE_RECENT_LIMIT") {
            self.store.recent_limit = parse_usize("QUOTEIQ_STORE_RECENT_LIMIT", &value)?;
        }
        if let Some(value) = read_env("QUOTEIQ_STORE_SEED_SAMPLES") {
            self.store.seed_samples = parse_bool("QUOTEIQ_STORE_SEED_SAMPLES", &value)?;
        }

        if let Some(value) = read_env("QUOTEIQ_UI_ASSETS_DIR") {
            self.ui.assets_dir = value;
        }

        let log_level = read_env("QUOTEIQ_LOGGING_LEVEL").or_else(|| read_env("QUOTEIQ_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("QUOTEIQ_LOGGING_FORMAT").or_else(|| read_env("QUOTEIQ_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(webhook_url) = overrides.webhook_url {
            self.webhook.url = Some(webhook_url);
        }
        if let Some(webhook_auth_token) = overrides.webhook_auth_token {
            self.webhook.auth_token = Some(secret_value(webhook_auth_token));
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(seed_samples) = overrides.seed_samples {
            self.store.seed_samples = seed_samples;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_server(&self.server)?;
        validate_webhook(&self.webhook)?;
        validate_generation(&self.generation)?;
        validate_store(&self.store)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("quoteiq.toml"), PathBuf::from("config/quoteiq.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.bind_address.trim().is_empty() {
        return Err(ConfigError::Validation(
            "server.bind_address must not be empty".to_string(),
        ));
    }

    if server.port == 0 {
        return Err(ConfigError::Validation(
            "server.port must be greater than zero".to_string(),
        ));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_webhook(webhook: &WebhookConfig) -> Result<(), ConfigError> {
    if let Some(url) = &webhook.url {
        let url = url.trim();
        if url.is_empty() {
            return Err(ConfigError::Validation(
                "webhook.url must not be empty when set".to_string(),
            ));
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::Validation(
                "webhook.url must start with http:// or https://".to_string(),
            ));
        }
    }

    if webhook.timeout_secs == 0 || webhook.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "webhook.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_generation(generation: &GenerationConfig) -> Result<(), ConfigError> {
    if generation.max_attempts == 0 || generation.max_attempts > 10 {
        return Err(ConfigError::Validation(
            "generation.max_attempts must be in range 1..=10".to_string(),
        ));
    }

    if generation.duplicate_window == 0 || generation.duplicate_window > 100 {
        return Err(ConfigError::Validation(
            "generation.duplicate_window must be in range 1..=100".to_string(),
        ));
    }

    if generation.retry_delay_ms > 60_000 {
        return Err(ConfigError::Validation(
            "generation.retry_delay_ms must not exceed 60000".to_string(),
        ));
    }

    Ok(())
}

fn validate_store(store: &StoreConfig) -> Result<(), ConfigError> {
    if store.recent_limit == 0 || store.recent_limit > RECENT_LIMIT_MAX {
        return Err(ConfigError::Validation(format!(
            "store.recent_limit must be in range 1..={RECENT_LIMIT_MAX}"
        )));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    server: Option<ServerPatch>,
    webhook: Option<WebhookPatch>,
    generation: Option<GenerationPatch>,
    store: Option<StorePatch>,
    ui: Option<UiPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct WebhookPatch {
    url: Option<String>,
    timeout_secs: Option<u64>,
    auth_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct GenerationPatch {
    max_attempts: Option<u32>,
    duplicate_window: Option<usize>,
    retry_delay_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct StorePatch {
    recent_limit: Option<usize>,
    seed_samples: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct UiPatch {
    assets_dir: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
