//! Message Handler module for processing incoming text messages and commands

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::debug;

use crate::booking::UserIdentity;
use crate::events::InboundEvent;
use crate::router::Router;

use super::transport::TelegramTransport;

/// Handle incoming messages. Only text from an identifiable sender is routed.
pub async fn message_handler(
    msg: Message,
    router: Arc<Router>,
    transport: Arc<TelegramTransport>,
) -> Result<()> {
    let Some(user) = msg.from.as_ref().map(|from| UserIdentity(from.id.0 as i64)) else {
        debug!(chat_id = %msg.chat.id, "Ignoring message without sender");
        return Ok(());
    };

    let Some(text) = msg.text() else {
        debug!(user_id = %user, "Ignoring non-text message");
        return Ok(());
    };

    debug!(user_id = %user, message_length = text.len(), "Received text message");

    let event = InboundEvent::from_text(user, text);
    let actions = router.handle(event).await;
    transport.deliver(actions).await;

    Ok(())
}
