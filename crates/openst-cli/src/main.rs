use std::{env, io, process::ExitCode};

use anyhow::{anyhow, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::{
    config::{CliConfig, LoggingFormat},
    ops::perform,
    performer::Performer,
};

mod config;
mod history;
mod ops;
mod performer;
mod setup_config;

fn init_logging(format: LoggingFormat) -> Result<()> {
    const LOG_CONFIGURATION_ENVVAR: &str = "RUST_LOG";

    let filter = EnvFilter::new(
        env::var(LOG_CONFIGURATION_ENVVAR)
            .as_deref()
            .unwrap_or("info"),
    );

    // Stdout is reserved for the operation report.
    let subscriber = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_target(true)
        .with_env_filter(filter);

    match format {
        LoggingFormat::Json => subscriber.json().try_init(),
        LoggingFormat::Text => subscriber.try_init(),
    }
    .map_err(|err| anyhow!(err))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli_config = CliConfig::parse();

    if let Err(err) = init_logging(cli_config.common.logging_format) {
        eprintln!("Failed to initialize logging: {err}");
    }

    let mut performer = Performer::new(&cli_config.common, env::args());
    let result = perform(&mut performer, cli_config.command).await;
    performer.finish(result)
}
