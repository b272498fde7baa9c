//! Booking notifier: administrator-facing summaries of booking changes

use thiserror::Error;

use crate::booking::{ConfirmedBooking, UserIdentity};
use crate::events::{OutboundAction, OutboundContent};
use crate::localization::t_args;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NotifyError {
    #[error("Administrator chat is not configured")]
    AdminNotConfigured,
}

#[derive(Debug, Clone)]
pub struct BookingNotifier {
    admin: Option<UserIdentity>,
}

impl BookingNotifier {
    pub fn new(admin: Option<UserIdentity>) -> Self {
        Self { admin }
    }

    fn to_admin(&self, text: String) -> Result<OutboundAction, NotifyError> {
        let admin = self.admin.ok_or(NotifyError::AdminNotConfigured)?;
        Ok(OutboundAction::to_admin(admin, OutboundContent::Text(text)))
    }

    /// Summary of a completed signup with every collected field
    pub fn new_booking(&self, booking: &ConfirmedBooking) -> Result<OutboundAction, NotifyError> {
        let user_id = booking.user.to_string();
        self.to_admin(t_args(
            "admin-new-booking",
            &[
                ("slot", &booking.chosen_slot),
                ("parent_name", &booking.parent_name),
                ("phone", &booking.phone),
                ("child_name", &booking.child_name),
                ("age", &booking.age),
                ("experience", &booking.prior_experience),
                ("source", &booking.referral_source),
                ("user_id", &user_id),
            ],
        ))
    }

    /// Notice that a user withdrew their booking
    pub fn booking_cancelled(&self, booking: &ConfirmedBooking) -> Result<OutboundAction, NotifyError> {
        let user_id = booking.user.to_string();
        self.to_admin(t_args(
            "admin-booking-cancelled",
            &[
                ("user_id", &user_id),
                ("slot", &booking.chosen_slot),
                ("parent_name", &booking.parent_name),
                ("phone", &booking.phone),
            ],
        ))
    }
}
