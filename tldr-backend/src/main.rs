use dotenv::dotenv;
use std::process::ExitCode;
use std::sync::Arc;

mod ai;
mod channels;
mod config;
mod error;
mod http;
mod summarizer;

use ai::LlmClient;
use channels::mastodon::start_mastodon_listener;
use channels::{EventDispatcher, MastodonClient};
use config::Config;

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    env_logger::init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    log::info!("Initializing {} backend", config.llm.provider);
    let llm = match LlmClient::from_config(&config) {
        Ok(llm) => llm,
        Err(e) => {
            log::error!("Failed to initialize generation backend: {}", e);
            return ExitCode::FAILURE;
        }
    };
    log::info!("Using {} model {}", llm.provider(), llm.model());

    let mastodon = match MastodonClient::new(&config.server.mastodon_server, &config.server.access_token) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            log::error!("Failed to initialize Mastodon client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Validate the token before opening the stream
    let account = match mastodon.verify_credentials().await {
        Ok(account) => account,
        Err(e) => {
            log::error!("Mastodon: {}", e);
            return ExitCode::FAILURE;
        }
    };
    log::info!("Mastodon: Credentials validated for @{}", account.acct);

    let bot_handle = config.bot_handle().unwrap_or(account.acct);
    log::info!("Ignoring mentions from own handle @{}", bot_handle);

    let dispatcher = Arc::new(EventDispatcher::new(
        mastodon.clone(),
        llm,
        Some(bot_handle),
    ));

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            // Dropping the sender would stop the listener, so hold it
            log::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
        log::info!("Received Ctrl-C, shutting down");
        let _ = shutdown_tx.send(());
    });

    match start_mastodon_listener(mastodon, dispatcher, shutdown_rx).await {
        Ok(()) => {
            log::info!("Mastodon listener stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("Mastodon listener exited: {}", e);
            ExitCode::FAILURE
        }
    }
}
