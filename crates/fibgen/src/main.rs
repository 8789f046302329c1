//! fibgen — Fibonacci values from a background generator, pulled on demand.

use fibgen_cli::ui;
use fibgen_lib::{app, config, errors};

fn main() {
    // Parse CLI args first so --verbose can raise the log level
    let config = config::AppConfig::parse();

    let level = if config.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = app::run(&config) {
        ui::print_error(&format!("{err:#}"));
        std::process::exit(errors::exit_code(&err));
    }
}
