use agent_host::ChatOrchestrator;
use anyhow::Result;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod repl;
mod terminal;

use terminal::TerminalRenderer;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays the conversation.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let (settings, loaded) = config::load_settings_or_default();
    if loaded {
        info!("loaded settings from {:?}", config::config_path());
    } else {
        info!("no settings file found, using defaults");
    }

    let renderer = Arc::new(TerminalRenderer::new(std::io::stdout()));
    let session = Arc::new(ChatOrchestrator::from_settings(&settings, renderer)?);
    println!("{}", repl::HELP);

    repl::run(session, BufReader::new(tokio::io::stdin())).await
}
