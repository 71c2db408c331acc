use std::fs::OpenOptions;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod api;
mod app;
mod config;
mod handler;
mod token;
mod tui;
mod ui;

use api::ApiClient;
use app::{App, Screen};
use config::Config;
use token::TokenStore;

#[derive(Parser)]
#[command(name = "chatbot")]
#[command(about = "Terminal chat client for the chatbot backend")]
#[command(version)]
struct Cli {
    /// Base URL of the chatbot backend
    #[arg(long, env = "CHATBOT_API_BASE")]
    api_base: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging()?;

    let config = Config::load().unwrap_or_else(|_| Config::new());
    let api_base = config.resolve_api_base(cli.api_base);
    info!(api_base = %api_base, "starting");

    let tokens = TokenStore::new()?;
    let api = ApiClient::new(&api_base, tokens);
    let mut app = App::new(api);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();

    // Chat-screen entry with a stored token: load history immediately. A
    // failure in that fetch sends us back to the login screen.
    if app.screen == Screen::Chat {
        handler::spawn_history_fetch(&app.api, &events.sender());
    }

    let result = run(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    result
}

async fn run(terminal: &mut tui::Tui, app: &mut App, events: &mut tui::EventHandler) -> Result<()> {
    let tx = events.sender();
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;
        if let Some(event) = events.next().await {
            handler::handle_event(app, event, &tx);
        }
    }
    Ok(())
}

/// Log to a file; the terminal belongs to the TUI.
fn init_logging() -> Result<()> {
    let log_dir = dirs::config_dir()
        .ok_or_else(|| anyhow!("Could not determine config directory"))?
        .join("chatbot-cli");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("chatbot.log"))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Arc::new(log_file))
        .with_ansi(false)
        .init();
    Ok(())
}
