use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, info};
use sqlx::postgres::PgPool;
use sqlx::types::Json;
use sqlx::Row;

use crate::booking::{ConfirmedBooking, UserIdentity};
use crate::dialogue::Conversation;
use crate::session_store::{SessionStore, StoreError};

/// Initialize the database schema
pub async fn init_database_schema(pool: &PgPool) -> Result<()> {
    info!("Initializing database schema...");

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS bookings (
            user_id BIGINT PRIMARY KEY,
            booking JSONB NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create bookings table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS conversations (
            user_id BIGINT PRIMARY KEY,
            conversation JSONB NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create conversations table")?;

    info!("Database schema initialized successfully");
    Ok(())
}

/// Session store backed by PostgreSQL. Each map lives in its own table.
#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self> {
        info!("Connecting to database");
        let pool = PgPool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        init_database_schema(&pool).await?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn get_booking(&self, user: UserIdentity) -> Result<Option<ConfirmedBooking>, StoreError> {
        let row = sqlx::query("SELECT booking FROM bookings WHERE user_id = $1")
            .bind(user.0)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let Json(booking): Json<ConfirmedBooking> = row.try_get("booking")?;
                Ok(Some(booking))
            }
            None => Ok(None),
        }
    }

    async fn put_booking(&self, booking: &ConfirmedBooking) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO bookings (user_id, booking, updated_at)
             VALUES ($1, $2, NOW())
             ON CONFLICT (user_id)
             DO UPDATE SET booking = EXCLUDED.booking, updated_at = NOW()",
        )
        .bind(booking.user.0)
        .bind(Json(booking))
        .execute(&self.pool)
        .await?;

        debug!("Booking stored for user {}", booking.user);
        Ok(())
    }

    async fn delete_booking(&self, user: UserIdentity) -> Result<Option<ConfirmedBooking>, StoreError> {
        let row = sqlx::query("DELETE FROM bookings WHERE user_id = $1 RETURNING booking")
            .bind(user.0)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let Json(booking): Json<ConfirmedBooking> = row.try_get("booking")?;
                info!("Booking deleted for user {}", user);
                Ok(Some(booking))
            }
            None => Ok(None),
        }
    }

    async fn get_conversation(&self, user: UserIdentity) -> Result<Option<Conversation>, StoreError> {
        let row = sqlx::query("SELECT conversation FROM conversations WHERE user_id = $1")
            .bind(user.0)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let Json(conversation): Json<Conversation> = row.try_get("conversation")?;
                Ok(Some(conversation))
            }
            None => Ok(None),
        }
    }

    async fn put_conversation(
        &self,
        user: UserIdentity,
        conversation: &Conversation,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO conversations (user_id, conversation, updated_at)
             VALUES ($1, $2, NOW())
             ON CONFLICT (user_id)
             DO UPDATE SET conversation = EXCLUDED.conversation, updated_at = NOW()",
        )
        .bind(user.0)
        .bind(Json(conversation))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_conversation(&self, user: UserIdentity) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM conversations WHERE user_id = $1")
            .bind(user.0)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
