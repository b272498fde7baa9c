use anyhow::Result;
use std::sync::Arc;

use dance_signup::booking::UserIdentity;
use dance_signup::conversation::{ConversationError, ConversationMachine};
use dance_signup::dialogue::{DialogueInput, DialogueStep, Effect, TransitionError};
use dance_signup::session_store::{InMemSessionStore, SessionStore};

fn offer() -> Vec<String> {
    vec!["25.08.2025 в 11:00".to_string(), "26.08.2025 в 11:00".to_string()]
}

fn setup() -> (Arc<InMemSessionStore>, ConversationMachine) {
    let store = Arc::new(InMemSessionStore::new());
    let machine = ConversationMachine::new(store.clone(), offer());
    (store, machine)
}

async fn complete_signup(machine: &ConversationMachine, user: UserIdentity, slot: usize, answers: [&str; 6]) -> Result<Vec<Effect>> {
    machine.handle(user, DialogueInput::StartSignup).await?;
    machine.handle(user, DialogueInput::SelectSlot(slot)).await?;
    let mut effects = Vec::new();
    for answer in answers {
        effects = machine.handle(user, DialogueInput::Text(answer.to_string())).await?.effects;
    }
    Ok(effects)
}

/// Full signup: the booking holds the chosen slot and the literal answers
#[tokio::test]
async fn test_full_signup_commits_booking() -> Result<()> {
    let (store, machine) = setup();
    let user = UserIdentity(1001);

    let effects = complete_signup(&machine, user, 0, ["+7000", "Anna", "Mia", "5", "none", "friend"]).await?;

    let booking = store.get_booking(user).await?.expect("booking should be stored");
    assert_eq!(booking.chosen_slot, "25.08.2025 в 11:00");
    assert_eq!(booking.phone, "+7000");
    assert_eq!(booking.parent_name, "Anna");
    assert_eq!(booking.child_name, "Mia");
    assert_eq!(booking.age, "5");
    assert_eq!(booking.prior_experience, "none");
    assert_eq!(booking.referral_source, "friend");

    assert_eq!(effects, vec![Effect::Commit(booking)]);
    assert_eq!(machine.step(user).await?, DialogueStep::Idle);
    assert!(store.get_conversation(user).await?.is_none());

    Ok(())
}

/// Cancelling after the slot choice leaves no booking and an idle user
#[tokio::test]
async fn test_cancel_mid_flow() -> Result<()> {
    let (store, machine) = setup();
    let user = UserIdentity(1002);

    machine.handle(user, DialogueInput::StartSignup).await?;
    machine.handle(user, DialogueInput::SelectSlot(1)).await?;
    assert_eq!(machine.step(user).await?, DialogueStep::AwaitingPhone);

    let outcome = machine.handle(user, DialogueInput::Cancel).await?;
    assert_eq!(outcome.effects, vec![Effect::Cancelled]);

    assert!(store.get_booking(user).await?.is_none());
    assert_eq!(machine.step(user).await?, DialogueStep::Idle);

    Ok(())
}

/// Cancelling a new signup leaves an earlier booking in place
#[tokio::test]
async fn test_cancel_keeps_previous_booking() -> Result<()> {
    let (store, machine) = setup();
    let user = UserIdentity(1003);

    complete_signup(&machine, user, 1, ["1", "2", "3", "4", "5", "6"]).await?;
    machine.handle(user, DialogueInput::StartSignup).await?;
    machine.handle(user, DialogueInput::SelectSlot(0)).await?;
    machine.handle(user, DialogueInput::Cancel).await?;

    let booking = store.get_booking(user).await?.expect("earlier booking should remain");
    assert_eq!(booking.chosen_slot, "26.08.2025 в 11:00");

    Ok(())
}

/// A second completed signup replaces the first booking
#[tokio::test]
async fn test_second_signup_overwrites_booking() -> Result<()> {
    let (store, machine) = setup();
    let user = UserIdentity(1004);

    complete_signup(&machine, user, 0, ["a", "b", "c", "d", "e", "f"]).await?;
    complete_signup(&machine, user, 1, ["g", "h", "i", "j", "k", "l"]).await?;

    let booking = store.get_booking(user).await?.expect("booking should be stored");
    assert_eq!(booking.chosen_slot, "26.08.2025 в 11:00");
    assert_eq!(booking.phone, "g");
    assert_eq!(store.booking_count().await, 1);

    Ok(())
}

#[tokio::test]
async fn test_out_of_range_slot_changes_nothing() -> Result<()> {
    let (store, machine) = setup();
    let user = UserIdentity(1005);

    machine.handle(user, DialogueInput::StartSignup).await?;
    let before = store.get_conversation(user).await?;

    let err = machine.handle(user, DialogueInput::SelectSlot(5)).await.unwrap_err();
    assert!(matches!(
        err,
        ConversationError::Transition(TransitionError::SlotOutOfRange { index: 5, offered: 2 })
    ));

    assert_eq!(store.get_conversation(user).await?, before);
    assert_eq!(machine.step(user).await?, DialogueStep::AwaitingDate);

    Ok(())
}

/// Two users signing up at the same time never see each other's answers
#[tokio::test]
async fn test_concurrent_users_are_isolated() -> Result<()> {
    let (store, machine) = setup();
    let machine = Arc::new(machine);

    let first = {
        let machine = Arc::clone(&machine);
        tokio::spawn(async move {
            complete_signup(&machine, UserIdentity(1), 0, ["p1", "a1", "c1", "1", "e1", "s1"]).await
        })
    };
    let second = {
        let machine = Arc::clone(&machine);
        tokio::spawn(async move {
            complete_signup(&machine, UserIdentity(2), 1, ["p2", "a2", "c2", "2", "e2", "s2"]).await
        })
    };
    first.await??;
    second.await??;

    let one = store.get_booking(UserIdentity(1)).await?.expect("booking for user 1");
    let two = store.get_booking(UserIdentity(2)).await?.expect("booking for user 2");
    assert_eq!((one.chosen_slot.as_str(), one.phone.as_str()), ("25.08.2025 в 11:00", "p1"));
    assert_eq!((two.chosen_slot.as_str(), two.phone.as_str()), ("26.08.2025 в 11:00", "p2"));

    Ok(())
}

/// A double tap on a slot button selects once; the second press is rejected
#[tokio::test]
async fn test_double_tap_is_serialized() -> Result<()> {
    let (_store, machine) = setup();
    let machine = Arc::new(machine);
    let user = UserIdentity(1006);

    machine.handle(user, DialogueInput::StartSignup).await?;

    let taps: Vec<_> = (0..2)
        .map(|_| {
            let machine = Arc::clone(&machine);
            tokio::spawn(async move { machine.handle(user, DialogueInput::SelectSlot(0)).await })
        })
        .collect();

    let mut accepted = 0;
    for tap in taps {
        match tap.await? {
            Ok(_) => accepted += 1,
            Err(ConversationError::Transition(TransitionError::UnexpectedInput { .. })) => {}
            Err(e) => return Err(e.into()),
        }
    }

    assert_eq!(accepted, 1);
    assert_eq!(machine.step(user).await?, DialogueStep::AwaitingPhone);

    Ok(())
}

#[tokio::test]
async fn test_reset_drops_progress() -> Result<()> {
    let (_store, machine) = setup();
    let user = UserIdentity(1007);

    machine.handle(user, DialogueInput::StartSignup).await?;
    machine.reset(user).await?;

    assert_eq!(machine.step(user).await?, DialogueStep::Idle);

    Ok(())
}

/// Cancelling at any step of a new signup returns to idle, leaves no draft
/// and keeps the earlier booking as it was
#[tokio::test]
async fn test_cancel_at_every_step_keeps_booking() -> Result<()> {
    let (store, machine) = setup();
    let user = UserIdentity(1008);

    complete_signup(&machine, user, 1, ["+7000", "Anna", "Mia", "5", "none", "friend"]).await?;
    let booking = store.get_booking(user).await?.expect("booking should be stored");

    for target in DialogueStep::SIGNUP {
        machine.handle(user, DialogueInput::StartSignup).await?;
        if target != DialogueStep::AwaitingDate {
            machine.handle(user, DialogueInput::SelectSlot(0)).await?;
        }
        while machine.step(user).await? != target {
            machine.handle(user, DialogueInput::Text("other".to_string())).await?;
        }

        let outcome = machine.handle(user, DialogueInput::Cancel).await?;
        assert_eq!(outcome.effects, vec![Effect::Cancelled], "cancel at {target:?}");

        assert_eq!(machine.step(user).await?, DialogueStep::Idle);
        assert!(store.get_conversation(user).await?.is_none());
        assert_eq!(store.get_booking(user).await?.as_ref(), Some(&booking));
    }

    Ok(())
}
