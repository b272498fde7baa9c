//! Inbound events and outbound actions exchanged with the chat transport

use regex::Regex;
use std::sync::LazyLock;

use crate::booking::UserIdentity;

static COMMAND_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/([A-Za-z0-9_]+)(?:@[A-Za-z0-9_]+)?(?:\s|$)").expect("command pattern is valid")
});

/// Payload prefix of the slot selection buttons
pub const SLOT_PAYLOAD_PREFIX: &str = "date_";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Command(String),
    ButtonPress(String),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub user: UserIdentity,
    pub kind: EventKind,
}

impl InboundEvent {
    pub fn new(user: UserIdentity, kind: EventKind) -> Self {
        Self { user, kind }
    }

    /// Classify a text message: `/name`, `/name@bot` or `/name args` become a
    /// command, everything else is free text.
    pub fn from_text(user: UserIdentity, text: &str) -> Self {
        let kind = match parse_command(text) {
            Some(name) => EventKind::Command(name),
            None => EventKind::Text(text.to_string()),
        };
        Self { user, kind }
    }
}

/// Lower-cased command name of a `/command` message
pub fn parse_command(text: &str) -> Option<String> {
    COMMAND_PATTERN
        .captures(text.trim_start())
        .and_then(|captures| captures.get(1))
        .map(|name| name.as_str().to_lowercase())
}

/// Button payload for the slot at `index`
pub fn slot_payload(index: usize) -> String {
    format!("{SLOT_PAYLOAD_PREFIX}{index}")
}

/// Parse a `date_<index>` payload. `None` for other payloads or a bad index.
pub fn parse_slot_payload(payload: &str) -> Option<usize> {
    payload.strip_prefix(SLOT_PAYLOAD_PREFIX)?.parse().ok()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub payload: String,
}

impl Button {
    pub fn new(label: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            payload: payload.into(),
        }
    }
}

/// Recipient of an outbound action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    User(UserIdentity),
    Admin(UserIdentity),
}

impl Target {
    pub fn identity(self) -> UserIdentity {
        match self {
            Target::User(id) | Target::Admin(id) => id,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OutboundContent {
    Text(String),
    /// Text with an inline keyboard, one inner vec per row
    TextWithButtons { text: String, buttons: Vec<Vec<Button>> },
    Location { latitude: f64, longitude: f64 },
    /// Photo fetched from `url`; the caption alone is sent if the fetch fails
    Photo { url: String, caption: String },
    /// Remove the map previously sent to this user, if any
    DismissLocation,
}

impl OutboundContent {
    /// Text carried by this content, if any
    pub fn text(&self) -> Option<&str> {
        match self {
            OutboundContent::Text(text) | OutboundContent::TextWithButtons { text, .. } => Some(text),
            OutboundContent::Photo { caption, .. } => Some(caption),
            OutboundContent::Location { .. } | OutboundContent::DismissLocation => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutboundAction {
    pub target: Target,
    pub content: OutboundContent,
}

impl OutboundAction {
    pub fn to_user(user: UserIdentity, content: OutboundContent) -> Self {
        Self {
            target: Target::User(user),
            content,
        }
    }

    pub fn to_admin(admin: UserIdentity, content: OutboundContent) -> Self {
        Self {
            target: Target::Admin(admin),
            content,
        }
    }
}
