use std::process::ExitCode;

fn main() -> ExitCode {
    quoteiq_cli::run()
}
