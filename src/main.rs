use issue_tracker::cli::{Cli, Commands};
use issue_tracker::commands::{serve, validate_config};
use std::process;
use tracing_subscriber::EnvFilter;

// Allow println in main CLI binary
#[allow(clippy::disallowed_methods)]
fn main() {
    // .env is optional
    let dotenv = dotenvy::dotenv();

    init_logging();

    if let Ok(path) = dotenv {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    let cli = Cli::parse();
    tracing::info!("Issue tracker CLI initialized");

    let result = match cli.command {
        Some(Commands::Serve { config, bind }) => match tokio::runtime::Runtime::new() {
            Ok(rt) => rt.block_on(serve::handle_serve(config.as_deref(), bind)),
            Err(e) => Err(e.into()),
        },
        Some(Commands::ValidateConfig { config }) => {
            validate_config::handle_validate_config(config.as_deref())
        }
        None => {
            println!("Issue Tracker - Use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

/// Initialize logging based on environment variables
fn init_logging() {
    // Default to INFO level, can be overridden by RUST_LOG environment variable
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("issue_tracker=info,warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();
}
