//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules:
//! - `message_handler`: Turns incoming text messages into inbound events
//! - `callback_handler`: Turns inline keyboard presses into inbound events
//! - `transport`: Sends outbound actions to Telegram
//! - `ui_builder`: Creates keyboards and the command menu

pub mod callback_handler;
pub mod message_handler;
pub mod transport;
pub mod ui_builder;

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;

pub use callback_handler::callback_handler;
pub use message_handler::message_handler;
pub use transport::TelegramTransport;
pub use ui_builder::{bot_commands, create_inline_keyboard};

/// Update routing tree. Expects `Arc<Router>` and `Arc<TelegramTransport>`
/// among the dispatcher dependencies.
pub fn schema() -> UpdateHandler<anyhow::Error> {
    dptree::entry()
        .branch(Update::filter_message().endpoint(message_handler))
        .branch(Update::filter_callback_query().endpoint(callback_handler))
}
