//! UI Builder module for creating keyboards and command menus

use teloxide::types::{BotCommand, InlineKeyboardButton, InlineKeyboardMarkup};

use crate::events::Button;
use crate::localization::t;

/// Telegram's limit on photo captions, in characters
pub const CAPTION_LIMIT: usize = 1024;

/// Create an inline keyboard, one row per inner slice
pub fn create_inline_keyboard(rows: &[Vec<Button>]) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(rows.iter().map(|row| {
        row.iter()
            .map(|button| InlineKeyboardButton::callback(button.label.clone(), button.payload.clone()))
            .collect::<Vec<_>>()
    }))
}

/// Split a caption into the part sent with the photo and a follow-up text.
///
/// Captions over the limit go out as a separate message in full.
pub fn split_caption(caption: &str) -> (Option<&str>, Option<&str>) {
    if caption.is_empty() {
        (None, None)
    } else if caption.chars().count() <= CAPTION_LIMIT {
        (Some(caption), None)
    } else {
        (None, Some(caption))
    }
}

/// Text to send once the photo attempt is over: the overflow caption after a
/// delivered photo, or the whole caption when the photo was rejected
pub fn text_after_photo(caption: &str, photo_sent: bool) -> Option<&str> {
    if photo_sent {
        split_caption(caption).1
    } else if caption.is_empty() {
        None
    } else {
        Some(caption)
    }
}

/// Commands shown in the Telegram command menu
pub fn bot_commands() -> Vec<BotCommand> {
    vec![
        BotCommand::new("start", t("command-start")),
        BotCommand::new("signup", t("command-signup")),
        BotCommand::new("my_lesson", t("command-my-lesson")),
        BotCommand::new("cancel", t("command-cancel")),
        BotCommand::new("help", t("command-help")),
    ]
}
