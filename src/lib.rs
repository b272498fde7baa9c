//! # Dance Studio Signup Bot
//!
//! A Telegram bot that walks parents through a trial-lesson signup for a
//! children's dance studio, stores the booking and notifies the studio
//! administrator.

pub mod booking;
pub mod bot;
pub mod circuit_breaker;
pub mod config;
pub mod conversation;
pub mod db;
pub mod dialogue;
pub mod events;
pub mod localization;
pub mod media;
pub mod menu;
pub mod notifier;
pub mod router;
pub mod session_store;
