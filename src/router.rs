//! # Router Module
//!
//! Maps inbound events to handlers. Routing is a pure function of the user's
//! current dialogue step and the event; the `Router` then runs the handler
//! and turns its result into outbound actions. Nothing is sent from here, so
//! no lock is held while the transport talks to Telegram.

use tracing::{debug, error, info, warn};

use crate::booking::UserIdentity;
use crate::config::StudioInfo;
use crate::conversation::{ConversationError, ConversationMachine};
use crate::dialogue::{DialogueInput, DialogueStep, Effect, InputKind, TransitionError};
use crate::events::{parse_slot_payload, EventKind, InboundEvent, OutboundAction, SLOT_PAYLOAD_PREFIX};
use crate::menu::{self, Screen, PAYLOAD_BACK, PAYLOAD_CANCEL_BOOKING, PAYLOAD_MY_BOOKING, PAYLOAD_SIGNUP};
use crate::notifier::BookingNotifier;

/// Handler selected for an inbound event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Screen(Screen),
    StartSignup,
    /// Abandon the signup in progress
    CancelSignup,
    SelectSlot(usize),
    FreeText(String),
    ShowBooking,
    CancelBooking,
    Drop,
}

/// Pick the handler for `kind` given the user's current step
pub fn route(step: DialogueStep, kind: &EventKind) -> Route {
    match kind {
        EventKind::Command(name) => match name.as_str() {
            "signup" => Route::StartSignup,
            "cancel" => cancel_route(step),
            "my_lesson" => Route::ShowBooking,
            other => Screen::from_name(other).map_or(Route::Drop, Route::Screen),
        },
        EventKind::ButtonPress(payload) => match payload.as_str() {
            PAYLOAD_SIGNUP => Route::StartSignup,
            PAYLOAD_BACK => cancel_route(step),
            PAYLOAD_MY_BOOKING => Route::ShowBooking,
            PAYLOAD_CANCEL_BOOKING => Route::CancelBooking,
            p if p.starts_with(SLOT_PAYLOAD_PREFIX) => match parse_slot_payload(p) {
                Some(index) if step.accepts() == Some(InputKind::SlotSelection) => {
                    Route::SelectSlot(index)
                }
                _ => Route::Drop,
            },
            other => Screen::from_name(other).map_or(Route::Drop, Route::Screen),
        },
        EventKind::Text(text) if step.accepts() == Some(InputKind::FreeText) => {
            Route::FreeText(text.clone())
        }
        EventKind::Text(_) => Route::Drop,
    }
}

fn cancel_route(step: DialogueStep) -> Route {
    if step.is_idle() {
        Route::Screen(Screen::Main)
    } else {
        Route::CancelSignup
    }
}

/// Dispatches events to the conversation machine, the booking store and the
/// menu renderer
pub struct Router {
    machine: ConversationMachine,
    notifier: BookingNotifier,
    studio: StudioInfo,
}

impl Router {
    pub fn new(machine: ConversationMachine, notifier: BookingNotifier, studio: StudioInfo) -> Self {
        Self {
            machine,
            notifier,
            studio,
        }
    }

    pub fn machine(&self) -> &ConversationMachine {
        &self.machine
    }

    /// Handle one event and return the actions to deliver, in order.
    ///
    /// A storage failure drops the user's signup in progress and answers with
    /// a generic error message.
    pub async fn handle(&self, event: InboundEvent) -> Vec<OutboundAction> {
        let user = event.user;
        match self.dispatch(event).await {
            Ok(actions) => actions,
            Err(e) => {
                error!(user_id = %user, error = %e, "Failed to handle event");
                if let Err(reset_err) = self.machine.reset(user).await {
                    warn!(user_id = %user, error = %reset_err, "Failed to reset conversation");
                }
                vec![OutboundAction::to_user(user, menu::render_error())]
            }
        }
    }

    async fn dispatch(&self, event: InboundEvent) -> Result<Vec<OutboundAction>, ConversationError> {
        let user = event.user;
        let step = self.machine.step(user).await?;
        let route = route(step, &event.kind);
        debug!(user_id = %user, step = ?step, route = ?route, "Routed event");

        match route {
            Route::Drop => Ok(Vec::new()),
            Route::Screen(screen) => Ok(self.screen(user, screen)),
            Route::StartSignup => self.feed(user, DialogueInput::StartSignup).await,
            Route::CancelSignup => self.feed(user, DialogueInput::Cancel).await,
            Route::SelectSlot(index) => self.feed(user, DialogueInput::SelectSlot(index)).await,
            Route::FreeText(text) => self.feed(user, DialogueInput::Text(text)).await,
            Route::ShowBooking => {
                let booking = self.machine.store().get_booking(user).await?;
                Ok(vec![OutboundAction::to_user(user, menu::render_booking(booking.as_ref()))])
            }
            Route::CancelBooking => self.cancel_booking(user).await,
        }
    }

    fn screen(&self, user: UserIdentity, screen: Screen) -> Vec<OutboundAction> {
        menu::render(screen, &self.studio)
            .into_iter()
            .map(|content| OutboundAction::to_user(user, content))
            .collect()
    }

    /// Run a dialogue input through the machine and render its effects
    async fn feed(&self, user: UserIdentity, input: DialogueInput) -> Result<Vec<OutboundAction>, ConversationError> {
        let is_cancel = matches!(input, DialogueInput::Cancel);

        match self.machine.handle(user, input).await {
            Ok(outcome) => {
                if outcome.stale_conversation {
                    if let Err(e) = self.machine.reset(user).await {
                        warn!(user_id = %user, error = %e, "Failed to reset conversation");
                    }
                }
                Ok(self.render_effects(user, outcome.effects))
            }
            // The signup ended between routing and handling
            Err(ConversationError::Transition(TransitionError::NoActiveDialogue)) if is_cancel => {
                Ok(self.screen(user, Screen::Main))
            }
            Err(ConversationError::Transition(e @ TransitionError::SlotOutOfRange { .. })) => {
                warn!(user_id = %user, error = %e, "Ignoring slot selection");
                Ok(Vec::new())
            }
            Err(ConversationError::Transition(
                e @ (TransitionError::NoActiveDialogue | TransitionError::UnexpectedInput { .. }),
            )) => {
                debug!(user_id = %user, error = %e, "Dropping stale input");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    fn render_effects(&self, user: UserIdentity, effects: Vec<Effect>) -> Vec<OutboundAction> {
        let mut actions = Vec::new();

        for effect in effects {
            match effect {
                Effect::Prompt(prompt) => {
                    actions.push(OutboundAction::to_user(user, menu::render_prompt(&prompt)));
                }
                Effect::Cancelled => {
                    info!(user_id = %user, "Signup cancelled");
                    actions.push(OutboundAction::to_user(user, menu::render_signup_cancelled()));
                    actions.extend(self.screen(user, Screen::Main));
                }
                Effect::Commit(booking) => {
                    match self.notifier.new_booking(&booking) {
                        Ok(action) => actions.push(action),
                        Err(e) => warn!(user_id = %user, error = %e, "Booking notification not sent"),
                    }
                    actions.push(OutboundAction::to_user(
                        user,
                        menu::render_confirmation(&booking, &self.studio),
                    ));
                }
            }
        }

        actions
    }

    async fn cancel_booking(&self, user: UserIdentity) -> Result<Vec<OutboundAction>, ConversationError> {
        let mut actions = Vec::new();

        match self.machine.store().delete_booking(user).await? {
            Some(booking) => {
                info!(user_id = %user, slot = %booking.chosen_slot, "Booking cancelled by user");
                match self.notifier.booking_cancelled(&booking) {
                    Ok(action) => actions.push(action),
                    Err(e) => warn!(user_id = %user, error = %e, "Cancellation notification not sent"),
                }
                actions.push(OutboundAction::to_user(user, menu::render_booking_cancelled(true)));
            }
            None => {
                actions.push(OutboundAction::to_user(user, menu::render_booking_cancelled(false)));
            }
        }

        Ok(actions)
    }
}
