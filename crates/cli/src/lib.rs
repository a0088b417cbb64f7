pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "quoteiq",
    about = "QuoteIQ operator CLI",
    long_about = "Inspect QuoteIQ configuration, run readiness checks, and preview quote candidates without persisting them.",
    after_help = "Examples:\n  quoteiq doctor --json\n  quoteiq config\n  quoteiq preview --url https://hooks.example/quote"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, webhook reachability, and static asset availability")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Fetch and normalize one quote candidate without saving it")]
    Preview {
        #[arg(long, help = "Override the configured webhook URL for this fetch")]
        url: Option<String>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Preview { url } => commands::preview::run(url),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
