use clap::Parser;
use kbrag::cli::handle_ask;
use kbrag::cli::handle_info;
use kbrag::cli::handle_search;
use kbrag::cli::print_error;
use kbrag::cli::Cli;
use kbrag::cli::Commands;
use kbrag::config::AppConfig;
use kbrag::KbragError;
use kbrag::RagService;
use kbrag::Result;
use tracing::info;
use tracing::warn;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // An explicit config path must exist; the default lookup may fall back
    let (config, using_defaults) = match &cli.config {
        Some(path) => (AppConfig::from_file(path)?, false),
        None => match AppConfig::load() {
            Ok(config) => (config, false),
            Err(KbragError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                (AppConfig::default(), true)
            }
            Err(e) => return Err(e),
        },
    };

    // Initialize logging; without a config file RUST_LOG decides
    if cli.verbose {
        kbrag::logging::init_logging_with_level("debug")?;
    } else if using_defaults {
        kbrag::logging::init_logging()?;
    } else {
        kbrag::logging::init_logging_with_config(Some(&config))?;
    }

    if using_defaults {
        warn!("No config file found, using built-in defaults");
    } else {
        info!("Configuration loaded successfully");
    }

    let service = RagService::from_config(&config)?;

    let result = match cli.command {
        Commands::Ask { question, k, json } => handle_ask(&service, &question, k, json).await,
        Commands::Search { query, k } => handle_search(&service, &query, k).await,
        Commands::Info => handle_info(&service, &config).await,
    };

    if let Err(e) = &result {
        print_error(&e.to_string());
        if e.is_fatal() {
            print_error("Cannot answer without a knowledge base; check corpus.path in the config");
        }
    }
    result
}
