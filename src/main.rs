use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use feedfan::config::Config;
use feedfan::feed::FeedFetcher;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(name = "feedfan", about = "Fetch and parse RSS/Atom feeds in parallel")]
struct Args {
    /// Path to a TOML config file (optional)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API (default)
    Serve {
        /// Override the listen address
        #[arg(long, value_name = "ADDR")]
        bind: Option<SocketAddr>,
    },
    /// Fetch the given URLs once and print the result as JSON
    Fetch {
        #[arg(value_name = "URL", required = true)]
        urls: Vec<String>,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    let mut config = match path {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config file '{}'", path.display()))?,
        None => Config::default(),
    };
    config
        .apply_env()
        .context("Invalid configuration in environment")?;
    Ok(config)
}

/// Cancel `token` on Ctrl+C.
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Shutdown signal received");
                token.cancel();
            }
            Err(e) => tracing::warn!(error = %e, "Failed to listen for shutdown signal"),
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing for debug logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let mut config = load_config(args.config.as_ref())?;

    let fetcher =
        FeedFetcher::new(config.fetch.clone()).context("Failed to build HTTP client")?;
    let shutdown = CancellationToken::new();
    cancel_on_ctrl_c(shutdown.clone());

    match args.command.unwrap_or(Command::Serve { bind: None }) {
        Command::Serve { bind } => {
            if let Some(bind) = bind {
                config.bind_address = bind;
            }
            let origins = config
                .cors_origins()
                .context("Refusing to start without a CORS policy")?;

            tracing::info!(
                environment = %config.environment,
                timeout_ms = config.fetch.timeout_ms,
                max_redirects = config.fetch.max_redirects,
                "Starting feedfan"
            );

            feedfan::api::serve(config.bind_address, fetcher, &origins, shutdown)
                .await
                .with_context(|| format!("Server failed on {}", config.bind_address))?;
        }
        Command::Fetch { urls } => {
            let mut result = fetcher.fetch_all(&urls, &shutdown).await;
            result.sort_by_url();
            let json =
                serde_json::to_string_pretty(&result).context("Failed to encode result")?;
            println!("{json}");
        }
    }

    Ok(())
}
