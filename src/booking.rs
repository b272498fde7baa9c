//! # Booking Model Module
//!
//! Data types shared by the signup dialogue, the session store and the
//! notifier: user identities, the in-progress draft and the confirmed record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identity of a chat participant (the Telegram user id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserIdentity(pub i64);

impl fmt::Display for UserIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Free-text fields collected by the signup dialogue, in dialogue order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Field {
    Phone,
    ParentName,
    ChildName,
    Age,
    Experience,
    Source,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::Phone => "phone",
            Field::ParentName => "parent_name",
            Field::ChildName => "child_name",
            Field::Age => "age",
            Field::Experience => "prior_experience",
            Field::Source => "referral_source",
        }
    }
}

/// Booking being filled in while the user walks through the signup dialogue.
///
/// A field is `Some` only once the user has passed the step that collects it.
/// The slot list offered at the start of the flow is kept with the draft so
/// the selected index is checked against what the user actually saw.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftBooking {
    offered_slots: Vec<String>,
    chosen_slot: Option<String>,
    phone: Option<String>,
    parent_name: Option<String>,
    child_name: Option<String>,
    age: Option<String>,
    prior_experience: Option<String>,
    referral_source: Option<String>,
}

impl DraftBooking {
    pub fn new(offered_slots: Vec<String>) -> Self {
        Self {
            offered_slots,
            ..Default::default()
        }
    }

    pub fn offered_slots(&self) -> &[String] {
        &self.offered_slots
    }

    pub fn chosen_slot(&self) -> Option<&str> {
        self.chosen_slot.as_deref()
    }

    /// Record the slot at `index` of the offered list. Returns the slot
    /// string, or `None` if the index is out of range (nothing is recorded).
    pub fn choose_slot(&mut self, index: usize) -> Option<&str> {
        let slot = self.offered_slots.get(index)?.clone();
        self.chosen_slot = Some(slot);
        self.chosen_slot.as_deref()
    }

    pub fn record(&mut self, field: Field, value: String) {
        let slot = match field {
            Field::Phone => &mut self.phone,
            Field::ParentName => &mut self.parent_name,
            Field::ChildName => &mut self.child_name,
            Field::Age => &mut self.age,
            Field::Experience => &mut self.prior_experience,
            Field::Source => &mut self.referral_source,
        };
        *slot = Some(value);
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::Phone => self.phone.as_deref(),
            Field::ParentName => self.parent_name.as_deref(),
            Field::ChildName => self.child_name.as_deref(),
            Field::Age => self.age.as_deref(),
            Field::Experience => self.prior_experience.as_deref(),
            Field::Source => self.referral_source.as_deref(),
        }
    }

    /// Number of collected values, the chosen slot included
    pub fn collected(&self) -> usize {
        [
            &self.chosen_slot,
            &self.phone,
            &self.parent_name,
            &self.child_name,
            &self.age,
            &self.prior_experience,
            &self.referral_source,
        ]
        .iter()
        .filter(|value| value.is_some())
        .count()
    }

    /// Convert a fully collected draft into a confirmed booking.
    ///
    /// Fails with the name of the first absent field.
    pub fn into_confirmed(
        self,
        user: UserIdentity,
        confirmed_at: DateTime<Utc>,
    ) -> Result<ConfirmedBooking, &'static str> {
        Ok(ConfirmedBooking {
            user,
            chosen_slot: self.chosen_slot.ok_or("chosen_slot")?,
            phone: self.phone.ok_or(Field::Phone.name())?,
            parent_name: self.parent_name.ok_or(Field::ParentName.name())?,
            child_name: self.child_name.ok_or(Field::ChildName.name())?,
            age: self.age.ok_or(Field::Age.name())?,
            prior_experience: self.prior_experience.ok_or(Field::Experience.name())?,
            referral_source: self.referral_source.ok_or(Field::Source.name())?,
            confirmed_at,
        })
    }
}

/// Completed signup, at most one per user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedBooking {
    pub user: UserIdentity,
    pub chosen_slot: String,
    pub phone: String,
    pub parent_name: String,
    pub child_name: String,
    pub age: String,
    pub prior_experience: String,
    pub referral_source: String,
    pub confirmed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slots() -> Vec<String> {
        vec!["25.08.2025 в 11:00".to_string(), "26.08.2025 в 11:00".to_string()]
    }

    #[test]
    fn test_choose_slot_in_range() {
        let mut draft = DraftBooking::new(slots());
        assert_eq!(draft.choose_slot(1), Some("26.08.2025 в 11:00"));
        assert_eq!(draft.collected(), 1);
    }

    #[test]
    fn test_choose_slot_out_of_range_records_nothing() {
        let mut draft = DraftBooking::new(slots());
        assert_eq!(draft.choose_slot(2), None);
        assert_eq!(draft.chosen_slot(), None);
        assert_eq!(draft.collected(), 0);
    }

    #[test]
    fn test_into_confirmed_reports_missing_field() {
        let mut draft = DraftBooking::new(slots());
        draft.choose_slot(0);
        draft.record(Field::Phone, "+7000".to_string());

        let err = draft.into_confirmed(UserIdentity(1), Utc::now()).unwrap_err();
        assert_eq!(err, "parent_name");
    }

    #[test]
    fn test_empty_text_is_a_recorded_value() {
        let mut draft = DraftBooking::new(slots());
        draft.record(Field::Age, String::new());
        assert_eq!(draft.get(Field::Age), Some(""));
    }
}
