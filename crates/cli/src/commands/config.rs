use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use quoteiq_core::config::{AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "server.bind_address",
        &config.server.bind_address,
        field_source(
            "server.bind_address",
            &["QUOTEIQ_SERVER_BIND_ADDRESS"],
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));
    lines.push(render_line(
        "server.port",
        &config.server.port.to_string(),
        field_source(
            "server.port",
            &["QUOTEIQ_SERVER_PORT"],
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));
    lines.push(render_line(
        "server.graceful_shutdown_secs",
        &config.server.graceful_shutdown_secs.to_string(),
        field_source(
            "server.graceful_shutdown_secs",
            &["QUOTEIQ_SERVER_GRACEFUL_SHUTDOWN_SECS"],
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));

    lines.push(render_line(
        "webhook.url",
        config.webhook.url.as_deref().unwrap_or("<unset>"),
        field_source(
            "webhook.url",
            &["QUOTEIQ_WEBHOOK_URL"],
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));
    lines.push(render_line(
        "webhook.timeout_secs",
        &config.webhook.timeout_secs.to_string(),
        field_source(
            "webhook.timeout_secs",
            &["QUOTEIQ_WEBHOOK_TIMEOUT_SECS"],
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));

    let auth_token = if config.webhook.auth_token.is_some() { "<redacted>" } else { "<unset>" };
    lines.push(render_line(
        "webhook.auth_token",
        auth_token,
        field_source(
            "webhook.auth_token",
            &["QUOTEIQ_WEBHOOK_AUTH_TOKEN"],
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));

    lines.push(render_line(
        "generation.max_attempts",
        &config.generation.max_attempts.to_string(),
        field_source(
            "generation.max_attempts",
            &["QUOTEIQ_GENERATION_MAX_ATTEMPTS"],
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));
    lines.push(render_line(
        "generation.duplicate_window",
        &config.generation.duplicate_window.to_string(),
        field_source(
            "generation.duplicate_window",
            &["QUOTEIQ_GENERATION_DUPLICATE_WINDOW"],
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));
    lines.push(render_line(
        "generation.retry_delay_ms",
        &config.generation.retry_delay_ms.to_string(),
        field_source(
            "generation.retry_delay_ms",
            &["QUOTEIQ_GENERATION_RETRY_DELAY_MS"],
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));

    lines.push(render_line(
        "store.recent_limit",
        &config.store.recent_limit.to_string(),
        field_source(
            "store.recent_limit",
            &["QUOTEIQ_STORE_RECENT_LIMIT"],
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));
    lines.push(render_line(
        "store.seed_samples",
        &config.store.seed_samples.to_string(),
        field_source(
            "store.seed_samples",
            &["QUOTEIQ_STORE_SEED_SAMPLES"],
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));

    lines.push(render_line(
        "ui.assets_dir",
        &config.ui.assets_dir,
        field_source(
            "ui.assets_dir",
            &["QUOTEIQ_UI_ASSETS_DIR"],
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        field_source(
            "logging.level",
            &["QUOTEIQ_LOGGING_LEVEL", "QUOTEIQ_LOG_LEVEL"],
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        field_source(
            "logging.format",
            &["QUOTEIQ_LOGGING_FORMAT", "QUOTEIQ_LOG_FORMAT"],
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("quoteiq.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/quoteiq.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    for env_key in env_keys {
        if env::var_os(env_key).is_some() {
            return format!("env ({env_key})");
        }
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
