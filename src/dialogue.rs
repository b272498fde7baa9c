//! Signup dialogue module: steps, inputs and the pure transition function.
//!
//! The transition function never performs I/O. It takes the user's current
//! conversation (if any), one input and a context, and returns the next
//! conversation together with the effects the caller has to carry out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::booking::{ConfirmedBooking, DraftBooking, Field, UserIdentity};

/// Where a user currently is in the signup dialogue
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DialogueStep {
    #[default]
    Idle,
    AwaitingDate,
    AwaitingPhone,
    AwaitingParentName,
    AwaitingChildName,
    AwaitingAge,
    AwaitingExperience,
    AwaitingSource,
}

/// Kind of input a step accepts
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputKind {
    SlotSelection,
    FreeText,
}

impl DialogueStep {
    /// Every non-idle step in dialogue order
    pub const SIGNUP: [DialogueStep; 7] = [
        DialogueStep::AwaitingDate,
        DialogueStep::AwaitingPhone,
        DialogueStep::AwaitingParentName,
        DialogueStep::AwaitingChildName,
        DialogueStep::AwaitingAge,
        DialogueStep::AwaitingExperience,
        DialogueStep::AwaitingSource,
    ];

    /// Step reached after this one accepted its input
    pub fn next(self) -> DialogueStep {
        match self {
            DialogueStep::Idle => DialogueStep::AwaitingDate,
            DialogueStep::AwaitingDate => DialogueStep::AwaitingPhone,
            DialogueStep::AwaitingPhone => DialogueStep::AwaitingParentName,
            DialogueStep::AwaitingParentName => DialogueStep::AwaitingChildName,
            DialogueStep::AwaitingChildName => DialogueStep::AwaitingAge,
            DialogueStep::AwaitingAge => DialogueStep::AwaitingExperience,
            DialogueStep::AwaitingExperience => DialogueStep::AwaitingSource,
            DialogueStep::AwaitingSource => DialogueStep::Idle,
        }
    }

    /// Draft field written by a free-text step
    pub fn field(self) -> Option<Field> {
        match self {
            DialogueStep::AwaitingPhone => Some(Field::Phone),
            DialogueStep::AwaitingParentName => Some(Field::ParentName),
            DialogueStep::AwaitingChildName => Some(Field::ChildName),
            DialogueStep::AwaitingAge => Some(Field::Age),
            DialogueStep::AwaitingExperience => Some(Field::Experience),
            DialogueStep::AwaitingSource => Some(Field::Source),
            DialogueStep::Idle | DialogueStep::AwaitingDate => None,
        }
    }

    pub fn accepts(self) -> Option<InputKind> {
        match self {
            DialogueStep::Idle => None,
            DialogueStep::AwaitingDate => Some(InputKind::SlotSelection),
            _ => Some(InputKind::FreeText),
        }
    }

    /// Number of values a draft holds once the user is at this step
    pub fn collected_before(self) -> usize {
        DialogueStep::SIGNUP
            .iter()
            .position(|step| *step == self)
            .unwrap_or(0)
    }

    pub fn is_idle(self) -> bool {
        self == DialogueStep::Idle
    }
}

/// In-progress signup of one user. Exists only while the step is not idle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub step: DialogueStep,
    pub draft: DraftBooking,
}

/// Input accepted by the dialogue
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DialogueInput {
    StartSignup,
    SelectSlot(usize),
    Text(String),
    Cancel,
}

/// Next question to put to the user
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Prompt {
    Slots(Vec<String>),
    Phone { chosen_slot: String },
    ParentName,
    ChildName,
    Age,
    Experience,
    Source,
}

impl Prompt {
    fn for_step(step: DialogueStep, draft: &DraftBooking) -> Option<Prompt> {
        let prompt = match step {
            DialogueStep::Idle => return None,
            DialogueStep::AwaitingDate => Prompt::Slots(draft.offered_slots().to_vec()),
            DialogueStep::AwaitingPhone => Prompt::Phone {
                chosen_slot: draft.chosen_slot().unwrap_or_default().to_string(),
            },
            DialogueStep::AwaitingParentName => Prompt::ParentName,
            DialogueStep::AwaitingChildName => Prompt::ChildName,
            DialogueStep::AwaitingAge => Prompt::Age,
            DialogueStep::AwaitingExperience => Prompt::Experience,
            DialogueStep::AwaitingSource => Prompt::Source,
        };
        Some(prompt)
    }
}

/// Work the caller must carry out after a transition
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Ask the user for the next value
    Prompt(Prompt),
    /// Store the booking, then notify the admin, then confirm to the user
    Commit(ConfirmedBooking),
    /// The draft was discarded
    Cancelled,
}

/// Result of a state transition
#[derive(Debug)]
pub struct Transition {
    /// `None` means the user is back to idle
    pub next: Option<Conversation>,
    pub effects: Vec<Effect>,
}

impl Transition {
    pub fn new(next: Option<Conversation>) -> Self {
        Self {
            next,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn step(&self) -> DialogueStep {
        self.next
            .as_ref()
            .map(|conversation| conversation.step)
            .unwrap_or_default()
    }
}

/// Inputs rejected by the transition function. None of them changes state.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("No signup in progress")]
    NoActiveDialogue,
    #[error("Slot index {index} is out of range ({offered} offered)")]
    SlotOutOfRange { index: usize, offered: usize },
    #[error("Step {step:?} does not accept {input}")]
    UnexpectedInput { step: DialogueStep, input: &'static str },
    #[error("Draft is missing field {0}")]
    MissingField(&'static str),
}

/// Values the transition needs from outside the conversation
#[derive(Debug, Clone)]
pub struct TransitionContext<'a> {
    pub user: UserIdentity,
    pub slots: &'a [String],
    pub now: DateTime<Utc>,
}

/// Pure transition function over the signup table.
///
/// Given the same conversation, input and context it always returns the same
/// result. Rejected inputs leave the conversation exactly as it was.
pub fn transition(
    current: Option<&Conversation>,
    input: DialogueInput,
    ctx: &TransitionContext<'_>,
) -> Result<Transition, TransitionError> {
    match (current, input) {
        // Entering (or restarting) the flow always offers a fresh slot list
        (_, DialogueInput::StartSignup) => {
            let draft = DraftBooking::new(ctx.slots.to_vec());
            let prompt = Prompt::Slots(draft.offered_slots().to_vec());
            Ok(Transition::new(Some(Conversation {
                step: DialogueStep::AwaitingDate,
                draft,
            }))
            .with_effect(Effect::Prompt(prompt)))
        }

        (Some(_), DialogueInput::Cancel) => Ok(Transition::new(None).with_effect(Effect::Cancelled)),

        (None, _) => Err(TransitionError::NoActiveDialogue),

        (Some(conversation), DialogueInput::SelectSlot(index)) => {
            if conversation.step.accepts() != Some(InputKind::SlotSelection) {
                return Err(TransitionError::UnexpectedInput {
                    step: conversation.step,
                    input: "a slot selection",
                });
            }

            let mut draft = conversation.draft.clone();
            if draft.choose_slot(index).is_none() {
                return Err(TransitionError::SlotOutOfRange {
                    index,
                    offered: draft.offered_slots().len(),
                });
            }

            Ok(advance(conversation.step, draft))
        }

        (Some(conversation), DialogueInput::Text(text)) => {
            let field = conversation
                .step
                .field()
                .ok_or(TransitionError::UnexpectedInput {
                    step: conversation.step,
                    input: "free text",
                })?;

            let mut draft = conversation.draft.clone();
            draft.record(field, text);

            let next = conversation.step.next();
            if !next.is_idle() {
                return Ok(advance(conversation.step, draft));
            }

            let booking = draft
                .into_confirmed(ctx.user, ctx.now)
                .map_err(TransitionError::MissingField)?;
            Ok(Transition::new(None).with_effect(Effect::Commit(booking)))
        }
    }
}

fn advance(from: DialogueStep, draft: DraftBooking) -> Transition {
    let step = from.next();
    let prompt = Prompt::for_step(step, &draft);
    let transition = Transition::new(Some(Conversation { step, draft }));
    match prompt {
        Some(prompt) => transition.with_effect(Effect::Prompt(prompt)),
        None => transition,
    }
}
