use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::api::AppState;
use crate::config::AppConfig;
use crate::ytdlp::YtDlp;

mod api;
mod config;
mod download;
mod extractor;
mod info;
mod probe;
mod validate;
mod ytdlp;

#[derive(Parser)]
#[command(name = "tubegrab", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the web client and the /api endpoints
    Serve {
        #[arg(long)]
        bind: Option<String>,
    },
    /// Print the normalized metadata for one video URL
    Info { url: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve { bind } => serve(bind).await,
        Command::Info { url } => probe::run(&url).await,
    }
}

async fn serve(bind: Option<String>) -> Result<()> {
    let mut config = AppConfig::from_env()?;
    if let Some(bind) = bind {
        config.bind_address = bind;
    }

    let extractor = Arc::new(YtDlp::new(&config.ytdlp_path));
    let state = AppState::new(extractor, config.user_agent.clone());
    let app = api::router(state);

    let addr = config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on {} (extractor: {})", addr, config.ytdlp_path);
    axum::serve(listener, app).await?;

    Ok(())
}
