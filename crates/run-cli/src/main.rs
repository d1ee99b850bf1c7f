use clap::Parser;
use run_core::storage::config::Config;
use std::path::Path;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::dispatcher::{Dispatcher, GlobalOptions};
use cli::main_types::Cli;

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli
        .config_dir
        .as_deref()
        .map(|dir| Config::file_in(Path::new(dir)));
    if let Some(path) = &config_path {
        log::debug!("Using config file {}", path.display());
    }

    let config = match Config::load(config_path.clone()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error loading config: {}", err);
            std::process::exit(1);
        }
    };

    let options = GlobalOptions {
        project: cli.project,
        region: cli.region,
        format: cli.format,
        access_token: cli.access_token,
        timeout: cli.timeout,
        deadline: cli.deadline,
    };
    let dispatcher = Dispatcher::new(config, config_path, options);

    if let Err(e) = dispatcher.dispatch(cli.command).await {
        eprintln!("Error: {}", e);
        if let Some(hint) = e.troubleshooting_hint() {
            eprintln!("Hint: {}", hint);
        }
        std::process::exit(1);
    }
}
