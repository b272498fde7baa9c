//! # Session Store Module
//!
//! Per-user storage for the two independent maps the bot keeps: confirmed
//! bookings and in-progress conversations. The store has no logic of its own
//! beyond single-key lookup, insert and delete.

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::booking::{ConfirmedBooking, UserIdentity};
use crate::dialogue::Conversation;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Key-value storage keyed by user identity
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get_booking(&self, user: UserIdentity) -> Result<Option<ConfirmedBooking>, StoreError>;

    /// Insert or overwrite the user's booking
    async fn put_booking(&self, booking: &ConfirmedBooking) -> Result<(), StoreError>;

    /// Remove the user's booking, returning it if there was one
    async fn delete_booking(&self, user: UserIdentity) -> Result<Option<ConfirmedBooking>, StoreError>;

    async fn get_conversation(&self, user: UserIdentity) -> Result<Option<Conversation>, StoreError>;

    async fn put_conversation(
        &self,
        user: UserIdentity,
        conversation: &Conversation,
    ) -> Result<(), StoreError>;

    async fn delete_conversation(&self, user: UserIdentity) -> Result<(), StoreError>;
}

/// In-memory store, used by tests and when no database is configured
#[derive(Debug, Default)]
pub struct InMemSessionStore {
    bookings: RwLock<HashMap<UserIdentity, ConfirmedBooking>>,
    conversations: RwLock<HashMap<UserIdentity, Conversation>>,
}

impl InMemSessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn booking_count(&self) -> usize {
        self.bookings.read().await.len()
    }
}

#[async_trait]
impl SessionStore for InMemSessionStore {
    async fn get_booking(&self, user: UserIdentity) -> Result<Option<ConfirmedBooking>, StoreError> {
        Ok(self.bookings.read().await.get(&user).cloned())
    }

    async fn put_booking(&self, booking: &ConfirmedBooking) -> Result<(), StoreError> {
        self.bookings
            .write()
            .await
            .insert(booking.user, booking.clone());
        Ok(())
    }

    async fn delete_booking(&self, user: UserIdentity) -> Result<Option<ConfirmedBooking>, StoreError> {
        Ok(self.bookings.write().await.remove(&user))
    }

    async fn get_conversation(&self, user: UserIdentity) -> Result<Option<Conversation>, StoreError> {
        Ok(self.conversations.read().await.get(&user).cloned())
    }

    async fn put_conversation(
        &self,
        user: UserIdentity,
        conversation: &Conversation,
    ) -> Result<(), StoreError> {
        self.conversations
            .write()
            .await
            .insert(user, conversation.clone());
        Ok(())
    }

    async fn delete_conversation(&self, user: UserIdentity) -> Result<(), StoreError> {
        self.conversations.write().await.remove(&user);
        Ok(())
    }
}
