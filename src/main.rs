//! Hazel entry point: console chat by default, `serve` for the web GUI.

use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use clap::Parser;
use dotenvy::dotenv;
use tracing::error;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use hazel::config::{Cli, Command, HazelConfig};
use hazel::{build_chat_service, console, server};

#[tokio::main]
async fn main() {
    // Load .env (if present) before clap reads CONFIG_FILE / PORT
    let _ = dotenv();

    let cli = Cli::parse();
    let command = cli.command();

    // Console output shares the terminal with the conversation, so stay quiet
    // unless RUST_LOG says otherwise (M-LOG-STRUCTURED)
    let default_level = match command {
        Command::Chat => "warn",
        Command::Serve { .. } => "info",
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let config = match HazelConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = run(command, &config).await {
        error!(error = %format!("{e:#}"), "Fatal error");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(command: Command, config: &HazelConfig) -> anyhow::Result<()> {
    let chat = build_chat_service(config).await?;
    match command {
        Command::Chat => console::run_stdio(&chat).await,
        Command::Serve { .. } => server::start_server(config, chat).await,
    }
}
