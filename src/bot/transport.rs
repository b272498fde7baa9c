//! Transport module: delivers outbound actions through the Telegram Bot API

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{InputFile, MessageId};
use tracing::{debug, error, warn};

use crate::booking::UserIdentity;
use crate::events::{OutboundAction, OutboundContent, Target};
use crate::media::{fetch_for_screen, MediaFetcher, PhotoDelivery};

use super::ui_builder::{create_inline_keyboard, split_caption, text_after_photo};

/// Sends actions to Telegram and remembers the last map sent to each user
pub struct TelegramTransport {
    bot: Bot,
    media: Arc<dyn MediaFetcher>,
    locations: Mutex<HashMap<UserIdentity, MessageId>>,
}

impl TelegramTransport {
    pub fn new(bot: Bot, media: Arc<dyn MediaFetcher>) -> Self {
        Self {
            bot,
            media,
            locations: Mutex::new(HashMap::new()),
        }
    }

    fn locations(&self) -> MutexGuard<'_, HashMap<UserIdentity, MessageId>> {
        self.locations.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Deliver actions in order. A failed action is logged and does not stop
    /// the ones after it.
    pub async fn deliver(&self, actions: Vec<OutboundAction>) {
        for action in actions {
            let target = action.target;
            if let Err(e) = self.send(target, action.content).await {
                match target {
                    Target::Admin(id) => error!(admin_id = %id, error = %e, "Failed to notify administrator"),
                    Target::User(id) => error!(user_id = %id, error = %e, "Failed to send message"),
                }
            }
        }
    }

    async fn send(&self, target: Target, content: OutboundContent) -> Result<()> {
        let identity = target.identity();
        let chat_id = ChatId(identity.0);

        match content {
            OutboundContent::Text(text) => {
                self.bot.send_message(chat_id, text).await?;
            }
            OutboundContent::TextWithButtons { text, buttons } => {
                self.bot
                    .send_message(chat_id, text)
                    .reply_markup(create_inline_keyboard(&buttons))
                    .await?;
            }
            OutboundContent::Location { latitude, longitude } => {
                let sent = self.bot.send_location(chat_id, latitude, longitude).await?;
                self.locations().insert(identity, sent.id);
            }
            OutboundContent::DismissLocation => {
                let previous = self.locations().remove(&identity);
                if let Some(message_id) = previous {
                    debug!(user_id = %identity, "Removing location message");
                    self.bot.delete_message(chat_id, message_id).await?;
                }
            }
            OutboundContent::Photo { url, caption } => {
                self.send_photo(chat_id, &url, &caption).await?;
            }
        }

        Ok(())
    }

    async fn send_photo(&self, chat_id: ChatId, url: &str, caption: &str) -> Result<()> {
        match fetch_for_screen(self.media.as_ref(), url).await {
            PhotoDelivery::Photo(bytes) => {
                let (photo_caption, _) = split_caption(caption);

                let mut request = self.bot.send_photo(chat_id, InputFile::memory(bytes));
                if let Some(photo_caption) = photo_caption {
                    request = request.caption(photo_caption);
                }
                let photo_sent = match request.await {
                    Ok(_) => true,
                    Err(e) => {
                        warn!(chat_id = %chat_id, error = %e, "Photo rejected, sending caption as text");
                        false
                    }
                };

                if let Some(text) = text_after_photo(caption, photo_sent) {
                    self.bot.send_message(chat_id, text).await?;
                }
            }
            PhotoDelivery::TextOnly => {
                if !caption.is_empty() {
                    self.bot.send_message(chat_id, caption).await?;
                }
            }
        }

        Ok(())
    }
}
