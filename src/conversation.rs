//! Conversation state machine: applies dialogue transitions to the session
//! store, one user at a time.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::booking::UserIdentity;
use crate::dialogue::{transition, DialogueInput, DialogueStep, Effect, TransitionContext, TransitionError};
use crate::session_store::{SessionStore, StoreError};

#[derive(Debug, Error)]
pub enum ConversationError {
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What happened to the user's conversation
#[derive(Debug)]
pub struct Outcome {
    pub step: DialogueStep,
    pub effects: Vec<Effect>,
    /// The stored conversation could not be removed after a commit
    pub stale_conversation: bool,
}

/// One async mutex per user with work in flight.
///
/// Entries are dropped once nobody holds or waits on them.
#[derive(Default)]
struct UserLocks {
    inner: Mutex<HashMap<UserIdentity, Arc<tokio::sync::Mutex<()>>>>,
}

impl UserLocks {
    fn acquire(&self, user: UserIdentity) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(locks.entry(user).or_default())
    }

    fn release(&self, user: UserIdentity, lock: Arc<tokio::sync::Mutex<()>>) {
        let mut locks = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        // The map and this caller hold the only references
        if Arc::strong_count(&lock) == 2 {
            locks.remove(&user);
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

/// Signup dialogue for every user, backed by a session store
pub struct ConversationMachine {
    store: Arc<dyn SessionStore>,
    slots: Vec<String>,
    locks: UserLocks,
}

impl ConversationMachine {
    pub fn new(store: Arc<dyn SessionStore>, slots: Vec<String>) -> Self {
        Self {
            store,
            slots,
            locks: UserLocks::default(),
        }
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Current step of the user, `Idle` when no signup is in progress
    pub async fn step(&self, user: UserIdentity) -> Result<DialogueStep, StoreError> {
        Ok(self
            .store
            .get_conversation(user)
            .await?
            .map(|conversation| conversation.step)
            .unwrap_or_default())
    }

    /// Feed one input to the user's dialogue.
    ///
    /// The read-modify-write of the user's conversation runs under that
    /// user's lock, so a second event from the same user observes the state
    /// left by the first. A completed signup is written to the store before
    /// this returns; the returned effects still carry it so the caller can
    /// send the notifications.
    pub async fn handle(
        &self,
        user: UserIdentity,
        input: DialogueInput,
    ) -> Result<Outcome, ConversationError> {
        let lock = self.locks.acquire(user);
        let result = {
            let _guard = lock.lock().await;
            self.apply(user, input).await
        };
        self.locks.release(user, lock);
        result
    }

    /// Drop whatever the user had in progress
    pub async fn reset(&self, user: UserIdentity) -> Result<(), StoreError> {
        let lock = self.locks.acquire(user);
        let result = {
            let _guard = lock.lock().await;
            self.store.delete_conversation(user).await
        };
        self.locks.release(user, lock);
        result
    }

    async fn apply(&self, user: UserIdentity, input: DialogueInput) -> Result<Outcome, ConversationError> {
        let current = self.store.get_conversation(user).await?;
        let from = current
            .as_ref()
            .map(|conversation| conversation.step)
            .unwrap_or_default();

        let ctx = TransitionContext {
            user,
            slots: &self.slots,
            now: Utc::now(),
        };

        let transition = match transition(current.as_ref(), input, &ctx) {
            Ok(transition) => transition,
            Err(err) => {
                debug!(user_id = %user, step = ?from, error = %err, "Input rejected");
                return Err(err.into());
            }
        };

        let mut committed = false;
        for effect in &transition.effects {
            if let Effect::Commit(booking) = effect {
                self.store.put_booking(booking).await?;
                committed = true;
                info!(user_id = %user, slot = %booking.chosen_slot, "Booking committed");
            }
        }

        let mut stale_conversation = false;
        match &transition.next {
            Some(conversation) => self.store.put_conversation(user, conversation).await?,
            None => {
                if let Err(e) = self.store.delete_conversation(user).await {
                    // A stored booking must still be announced
                    if !committed {
                        return Err(e.into());
                    }
                    warn!(user_id = %user, error = %e, "Booking stored but conversation not cleared");
                    stale_conversation = true;
                }
            }
        }

        let step = transition.step();
        debug!(user_id = %user, from = ?from, to = ?step, "Dialogue transition");

        Ok(Outcome {
            step,
            effects: transition.effects,
            stale_conversation,
        })
    }

    #[cfg(test)]
    fn tracked_locks(&self) -> usize {
        self.locks.len()
    }
}
