use std::process::ExitCode;

use clap::Parser;
use log::{error, info};

use memorize::{App, Cli, Commands, Config, FlashcardController, Result};

pub fn initialize_logger(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_secs()
        .format_module_path(true)
        .init();

    info!("Logger initialized");
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = match cli.config {
        Some(path) => path,
        None => Config::default_path()?,
    };
    let mut config = Config::load(&config_path)?;

    if let Commands::Config { show, set, reset } = cli.command {
        return App::handle_config(&mut config, &config_path, show, set, reset);
    }

    if let Some(url) = cli.server_url {
        config.server_url = Some(url);
    }
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if cli.offline {
        config.server_url = None;
    }

    let controller = FlashcardController::from_config(&config, cli.ephemeral)?;
    let app = App::new(controller, config, cli.verbose);
    app.run(cli.command).await
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    initialize_logger(cli.verbose);

    info!("Application starting up");
    let result = run(cli).await;
    info!("Application shutting down");

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
