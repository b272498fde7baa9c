//! Menu renderer: static screens, dialogue prompts and booking views.
//!
//! Every function here is pure; the text comes from the Fluent resources.

use crate::booking::ConfirmedBooking;
use crate::config::StudioInfo;
use crate::dialogue::Prompt;
use crate::events::{slot_payload, Button, OutboundContent};
use crate::localization::{t, t_args};

pub const PAYLOAD_SIGNUP: &str = "signup";
pub const PAYLOAD_BACK: &str = "back";
pub const PAYLOAD_MY_BOOKING: &str = "my_lesson";
pub const PAYLOAD_CANCEL_BOOKING: &str = "cancel_my_lesson";

/// Navigable static screens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Main menu greeting shown on `/start`
    Welcome,
    /// Main menu reached with the back button
    Main,
    About,
    Info,
    Location,
    Contacts,
    Help,
}

impl Screen {
    /// Screen addressed by a button payload or command name
    pub fn from_name(name: &str) -> Option<Screen> {
        match name {
            "start" => Some(Screen::Welcome),
            "about" => Some(Screen::About),
            "info" | "program" | "requirements" => Some(Screen::Info),
            "location" => Some(Screen::Location),
            "contacts" => Some(Screen::Contacts),
            "help" => Some(Screen::Help),
            _ => None,
        }
    }
}

pub fn main_menu_buttons() -> Vec<Vec<Button>> {
    vec![
        vec![Button::new(t("button-signup"), PAYLOAD_SIGNUP)],
        vec![Button::new(t("button-my-booking"), PAYLOAD_MY_BOOKING)],
        vec![Button::new(t("button-about"), "about")],
        vec![Button::new(t("button-info"), "info")],
        vec![Button::new(t("button-location"), "location")],
        vec![Button::new(t("button-contacts"), "contacts")],
    ]
}

pub fn back_buttons() -> Vec<Vec<Button>> {
    vec![vec![Button::new(t("button-back"), PAYLOAD_BACK)]]
}

fn with_back(text: String) -> OutboundContent {
    OutboundContent::TextWithButtons {
        text,
        buttons: back_buttons(),
    }
}

/// Render a static screen as the messages to send, in order
pub fn render(screen: Screen, studio: &StudioInfo) -> Vec<OutboundContent> {
    match screen {
        Screen::Welcome | Screen::Main => {
            let key = if screen == Screen::Welcome { "menu-welcome" } else { "menu-main" };
            vec![
                OutboundContent::DismissLocation,
                OutboundContent::TextWithButtons {
                    text: t(key),
                    buttons: main_menu_buttons(),
                },
            ]
        }
        Screen::About => render_album(&studio.albums.about, t("about-text")),
        Screen::Info => render_album(&studio.albums.info, t("info-text")),
        Screen::Location => vec![
            OutboundContent::Location {
                latitude: studio.latitude,
                longitude: studio.longitude,
            },
            with_back(t_args("location-text", &[("address", &studio.address)])),
        ],
        Screen::Contacts => vec![with_back(t_args(
            "contacts-text",
            &[("phones", &studio.phones.join("\n"))],
        ))],
        Screen::Help => vec![OutboundContent::Text(t("help-text"))],
    }
}

/// Photos with the caption on the first one, then the back prompt.
/// An empty album degrades to the caption alone.
fn render_album(urls: &[String], caption: String) -> Vec<OutboundContent> {
    let mut contents = Vec::with_capacity(urls.len() + 1);

    if urls.is_empty() {
        contents.push(OutboundContent::Text(caption));
    } else {
        for (i, url) in urls.iter().enumerate() {
            contents.push(OutboundContent::Photo {
                url: url.clone(),
                caption: if i == 0 { caption.clone() } else { String::new() },
            });
        }
    }

    contents.push(with_back(t("choose-action")));
    contents
}

/// Question for the next dialogue step
pub fn render_prompt(prompt: &Prompt) -> OutboundContent {
    match prompt {
        Prompt::Slots(slots) if slots.is_empty() => with_back(t("signup-no-slots")),
        Prompt::Slots(slots) => OutboundContent::TextWithButtons {
            text: t("signup-choose-date"),
            buttons: slots
                .iter()
                .enumerate()
                .map(|(i, slot)| vec![Button::new(slot.clone(), slot_payload(i))])
                .collect(),
        },
        Prompt::Phone { chosen_slot } => {
            OutboundContent::Text(t_args("prompt-phone", &[("slot", chosen_slot)]))
        }
        Prompt::ParentName => OutboundContent::Text(t("prompt-parent-name")),
        Prompt::ChildName => OutboundContent::Text(t("prompt-child-name")),
        Prompt::Age => OutboundContent::Text(t("prompt-age")),
        Prompt::Experience => OutboundContent::Text(t("prompt-experience")),
        Prompt::Source => OutboundContent::Text(t("prompt-source")),
    }
}

/// Confirmation sent to the user after a completed signup
pub fn render_confirmation(booking: &ConfirmedBooking, studio: &StudioInfo) -> OutboundContent {
    with_back(t_args(
        "signup-complete",
        &[
            ("slot", &booking.chosen_slot),
            ("address", &studio.address),
            ("phones", &studio.phones.join(" или ")),
        ],
    ))
}

pub fn render_signup_cancelled() -> OutboundContent {
    OutboundContent::Text(t("signup-cancelled"))
}

/// "My booking" screen
pub fn render_booking(booking: Option<&ConfirmedBooking>) -> OutboundContent {
    match booking {
        Some(booking) => OutboundContent::TextWithButtons {
            text: t_args(
                "booking-details",
                &[
                    ("slot", &booking.chosen_slot),
                    ("parent_name", &booking.parent_name),
                    ("phone", &booking.phone),
                    ("child_name", &booking.child_name),
                    ("age", &booking.age),
                    ("experience", &booking.prior_experience),
                    ("source", &booking.referral_source),
                ],
            ),
            buttons: vec![
                vec![Button::new(t("button-cancel-booking"), PAYLOAD_CANCEL_BOOKING)],
                vec![Button::new(t("button-back"), PAYLOAD_BACK)],
            ],
        },
        None => OutboundContent::TextWithButtons {
            text: t("booking-none"),
            buttons: signup_or_back(),
        },
    }
}

/// Reply to a booking cancellation request
pub fn render_booking_cancelled(cancelled: bool) -> OutboundContent {
    if cancelled {
        OutboundContent::TextWithButtons {
            text: t("booking-cancelled"),
            buttons: signup_or_back(),
        }
    } else {
        with_back(t("booking-none-to-cancel"))
    }
}

pub fn render_error() -> OutboundContent {
    OutboundContent::Text(t("error-generic"))
}

fn signup_or_back() -> Vec<Vec<Button>> {
    vec![
        vec![Button::new(t("button-signup"), PAYLOAD_SIGNUP)],
        vec![Button::new(t("button-back"), PAYLOAD_BACK)],
    ]
}
