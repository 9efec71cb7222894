//! offheap: arena cache workload driver.

use std::process::ExitCode;

use offheap_cli::presenter::CliReportPresenter;
use offheap_lib::{app, config, errors};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let config = config::AppConfig::parse();

    let level = if config.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();

    match app::run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            CliReportPresenter::from_flags(config.json, config.quiet)
                .present_error(&format!("{err:#}"));
            let code = errors::exit_code(&err);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}
