use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use dance_signup::bot::{self, TelegramTransport};
use dance_signup::config::Config;
use dance_signup::conversation::ConversationMachine;
use dance_signup::db::PgSessionStore;
use dance_signup::media::HttpMediaFetcher;
use dance_signup::notifier::BookingNotifier;
use dance_signup::router::Router;
use dance_signup::session_store::{InMemSessionStore, SessionStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize logging; also captures `log` records
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting dance studio signup bot");

    let config = Config::from_env()?;
    if config.admin.is_none() {
        warn!("ADMIN_CHAT_ID is not set, booking notifications are disabled");
    }

    let store: Arc<dyn SessionStore> = match &config.database_url {
        Some(url) => {
            info!("Using PostgreSQL session store");
            Arc::new(PgSessionStore::connect(url).await?)
        }
        None => {
            warn!("DATABASE_URL is not set, bookings are kept in memory only");
            Arc::new(InMemSessionStore::new())
        }
    };

    let machine = ConversationMachine::new(store, config.slots.clone());
    let router = Arc::new(Router::new(
        machine,
        BookingNotifier::new(config.admin),
        config.studio.clone(),
    ));

    let bot = Bot::new(config.bot_token.clone());
    bot.set_my_commands(bot::bot_commands()).await?;

    let media = Arc::new(HttpMediaFetcher::new(config.recovery.clone())?);
    let transport = Arc::new(TelegramTransport::new(bot.clone(), media));

    info!(slots = config.slots.len(), "Bot initialized, starting dispatcher");

    Dispatcher::builder(bot, bot::schema())
        .dependencies(dptree::deps![router, transport])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
