//! Command-line interface

pub mod commands;
pub mod types;

pub use types::{Cli, Commands};

/// Dispatch a parsed command line.
pub async fn execute(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Run => commands::run::execute(config_path).await,
        Commands::RegisterCommands => commands::register::execute(config_path).await,
        Commands::Migrate => commands::migrate::execute(config_path).await,
        Commands::CheckConfig => commands::check_config::execute(config_path),
    }
}

/// Report a fatal error and exit with a failure status.
pub fn handle_error(err: &anyhow::Error) -> ! {
    eprintln!("Error: {err:#}");
    std::process::exit(1);
}
