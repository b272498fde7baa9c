//! # Configuration Module
//!
//! Deployment settings read from the environment (and `.env`): bot token,
//! administrator chat, offered slots, static studio details and the media
//! fetch policy.

use std::env;
use thiserror::Error;
use tracing::warn;

use crate::booking::UserIdentity;

/// Slots offered when `SIGNUP_SLOTS` is not set
pub const DEFAULT_SLOTS: [&str; 3] = [
    "16.08.2025 с 11:00 до 13:00",
    "23.08.2025 с 11:00 до 13:00",
    "30.08.2025 с 11:00 до 13:00",
];

pub const DEFAULT_PHOTO_BASE_URL: &str = "https://raw.githubusercontent.com/syakimmm/vavilon/main/";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Recovery configuration for remote media fetching
#[derive(Debug, Clone)]
pub struct RecoveryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Base delay between retries in milliseconds
    pub base_retry_delay_ms: u64,
    /// Maximum delay between retries in milliseconds
    pub max_retry_delay_ms: u64,
    /// Timeout for a single fetch in seconds
    pub operation_timeout_secs: u64,
    /// Circuit breaker failure threshold
    pub circuit_breaker_threshold: u32,
    /// Circuit breaker reset timeout in seconds
    pub circuit_breaker_reset_secs: u64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_retry_delay_ms: 500,
            max_retry_delay_ms: 5000,
            operation_timeout_secs: 10,
            circuit_breaker_threshold: 5,
            circuit_breaker_reset_secs: 60,
        }
    }
}

/// Photo albums attached to the information screens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoAlbums {
    pub about: Vec<String>,
    pub info: Vec<String>,
}

impl PhotoAlbums {
    pub fn from_base_url(base_url: &str) -> Self {
        Self {
            about: vec![format!("{base_url}онас.JPG")],
            info: vec![format!("{base_url}всечтонужно знать о наборах.JPG")],
        }
    }
}

impl Default for PhotoAlbums {
    fn default() -> Self {
        Self::from_base_url(DEFAULT_PHOTO_BASE_URL)
    }
}

/// Static details of the studio shown on the information screens
#[derive(Debug, Clone, PartialEq)]
pub struct StudioInfo {
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub phones: Vec<String>,
    pub albums: PhotoAlbums,
}

impl Default for StudioInfo {
    fn default() -> Self {
        Self {
            address: "г. Томск, ул. Иркутский тракт, 86/1".to_string(),
            latitude: 56.50849,
            longitude: 85.02575,
            phones: vec![
                "+7 (913) 880-84-58 - Руководитель Плотникова Марина Николаевна".to_string(),
                "+7 (983) 236-42-84 - Юлия".to_string(),
            ],
            albums: PhotoAlbums::default(),
        }
    }
}

/// Complete bot configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    /// Recipient of booking notifications; `None` disables them
    pub admin: Option<UserIdentity>,
    /// PostgreSQL connection string; the in-memory store is used without it
    pub database_url: Option<String>,
    pub slots: Vec<String>,
    pub studio: StudioInfo,
    pub recovery: RecoveryConfig,
}

impl Config {
    /// Read the configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from any variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bot_token = lookup("TELEGRAM_BOT_TOKEN")
            .filter(|token| !token.trim().is_empty())
            .ok_or(ConfigError::Missing("TELEGRAM_BOT_TOKEN"))?;

        let admin = lookup("ADMIN_CHAT_ID").and_then(|raw| match parse_admin(&raw) {
            Ok(admin) => Some(admin),
            Err(e) => {
                warn!(error = %e, "Admin notifications disabled");
                None
            }
        });

        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let slots = lookup("SIGNUP_SLOTS")
            .map(|raw| parse_slots(&raw))
            .filter(|slots| !slots.is_empty())
            .unwrap_or_else(|| DEFAULT_SLOTS.iter().map(|slot| slot.to_string()).collect());

        let mut studio = StudioInfo::default();
        if let Some(base_url) = lookup("PHOTO_BASE_URL") {
            studio.albums = PhotoAlbums::from_base_url(&base_url);
        }

        let mut recovery = RecoveryConfig::default();
        if let Some(raw) = lookup("MEDIA_TIMEOUT_SECS") {
            recovery.operation_timeout_secs = parse_number("MEDIA_TIMEOUT_SECS", &raw)?;
        }
        if let Some(raw) = lookup("MEDIA_MAX_RETRIES") {
            recovery.max_retries = parse_number("MEDIA_MAX_RETRIES", &raw)?;
        }

        Ok(Self {
            bot_token,
            admin,
            database_url,
            slots,
            studio,
            recovery,
        })
    }
}

fn parse_admin(raw: &str) -> Result<UserIdentity, ConfigError> {
    raw.trim()
        .parse::<i64>()
        .map(UserIdentity)
        .map_err(|_| ConfigError::Invalid {
            name: "ADMIN_CHAT_ID",
            value: raw.to_string(),
        })
}

/// Split a `;`-separated slot list, dropping empty entries
pub fn parse_slots(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|slot| !slot.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_number<T: std::str::FromStr>(name: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_token_is_required() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("TELEGRAM_BOT_TOKEN"));
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[("TELEGRAM_BOT_TOKEN", "t")])).unwrap();
        assert_eq!(config.admin, None);
        assert_eq!(config.database_url, None);
        assert_eq!(config.slots.len(), 3);
        assert_eq!(config.slots[0], "16.08.2025 с 11:00 до 13:00");
    }

    #[test]
    fn test_invalid_admin_is_treated_as_absent() {
        let config = Config::from_lookup(lookup_from(&[
            ("TELEGRAM_BOT_TOKEN", "t"),
            ("ADMIN_CHAT_ID", "ВАШ_CHAT_ID"),
        ]))
        .unwrap();
        assert_eq!(config.admin, None);
    }

    #[test]
    fn test_custom_slots_and_admin() {
        let config = Config::from_lookup(lookup_from(&[
            ("TELEGRAM_BOT_TOKEN", "t"),
            ("ADMIN_CHAT_ID", " -100123 "),
            ("SIGNUP_SLOTS", "25.08.2025 в 11:00; ;26.08.2025 в 11:00"),
        ]))
        .unwrap();
        assert_eq!(config.admin, Some(UserIdentity(-100123)));
        assert_eq!(config.slots, vec!["25.08.2025 в 11:00", "26.08.2025 в 11:00"]);
    }

    #[test]
    fn test_invalid_media_timeout_is_an_error() {
        let err = Config::from_lookup(lookup_from(&[
            ("TELEGRAM_BOT_TOKEN", "t"),
            ("MEDIA_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "MEDIA_TIMEOUT_SECS", .. }));
    }
}
