//! Callback Handler module for processing inline keyboard callback queries

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::debug;

use crate::booking::UserIdentity;
use crate::events::{EventKind, InboundEvent};
use crate::router::Router;

use super::transport::TelegramTransport;

/// Handle callback queries from inline keyboards
pub async fn callback_handler(
    bot: Bot,
    q: CallbackQuery,
    router: Arc<Router>,
    transport: Arc<TelegramTransport>,
) -> Result<()> {
    let user = UserIdentity(q.from.id.0 as i64);
    debug!(user_id = %user, data = ?q.data, "Received callback query");

    // Stop the client's loading indicator before doing any work
    bot.answer_callback_query(q.id.clone()).await?;

    if let Some(payload) = q.data {
        let event = InboundEvent::new(user, EventKind::ButtonPress(payload));
        let actions = router.handle(event).await;
        transport.deliver(actions).await;
    }

    Ok(())
}
