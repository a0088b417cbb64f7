use std::path::Path;
use std::time::Duration;

use quoteiq_core::config::{AppConfig, LoadOptions};
use quoteiq_generation::{HttpQuoteSource, QuoteSource};
use serde::Serialize;

use crate::commands::CommandResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let failed = report.overall_status == CheckStatus::Fail;

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code: if failed { 1 } else { 0 }, output }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_webhook_reachability(&config));
            checks.push(check_assets_directory(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(DoctorCheck {
                name: "webhook_reachability",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
            checks.push(DoctorCheck {
                name: "assets_directory",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
        }
    }

    // Skipped checks describe absent optional pieces, so only a Fail is unhealthy.
    let failed = checks.iter().any(|check| check.status == CheckStatus::Fail);
    let overall_status = if failed { CheckStatus::Fail } else { CheckStatus::Pass };
    let summary = if failed {
        "doctor: one or more readiness checks failed".to_string()
    } else {
        "doctor: all readiness checks passed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_webhook_reachability(config: &AppConfig) -> DoctorCheck {
    let Some(url) = config.webhook.url.as_deref() else {
        return DoctorCheck {
            name: "webhook_reachability",
            status: CheckStatus::Skipped,
            details: "no webhook configured; generation uses the built-in sampler".to_string(),
        };
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck {
                name: "webhook_reachability",
                status: CheckStatus::Fail,
                details: format!("failed to initialize async runtime: {error}"),
            };
        }
    };

    let timeout = Duration::from_secs(config.webhook.timeout_secs);
    let source = match HttpQuoteSource::new(url, timeout, config.webhook.auth_token.clone()) {
        Ok(source) => source,
        Err(error) => {
            return DoctorCheck {
                name: "webhook_reachability",
                status: CheckStatus::Fail,
                details: format!("failed to build webhook client: {error}"),
            };
        }
    };

    match runtime.block_on(source.fetch_candidate()) {
        Ok(_) => DoctorCheck {
            name: "webhook_reachability",
            status: CheckStatus::Pass,
            details: format!("fetched a candidate from `{url}`"),
        },
        Err(error) => DoctorCheck {
            name: "webhook_reachability",
            status: CheckStatus::Fail,
            details: format!("webhook probe failed: {error}"),
        },
    }
}

fn check_assets_directory(config: &AppConfig) -> DoctorCheck {
    if Path::new(&config.ui.assets_dir).is_dir() {
        DoctorCheck {
            name: "assets_directory",
            status: CheckStatus::Pass,
            details: format!("static assets available at `{}`", config.ui.assets_dir),
        }
    } else {
        DoctorCheck {
            name: "assets_directory",
            status: CheckStatus::Skipped,
            details: format!(
                "`{}` not found; the server will serve the JSON API only",
                config.ui.assets_dir
            ),
        }
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
