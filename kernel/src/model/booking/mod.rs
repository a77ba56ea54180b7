use chrono::{DateTime, Utc};
use strum::{AsRefStr, EnumString};

use crate::model::{
    id::{BookingId, UserId},
    room::BookingRoom,
    user::BookingUser,
};

pub mod event;
pub mod slot;

pub use slot::TimeSlot;

/// Lifecycle state of a booking. The only legal transition is
/// `Confirmed -> Cancelled`; cancelled is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

/// One entry of an availability listing. Deliberately a projection:
/// description and attendees never leak to availability consumers.
#[derive(Debug)]
pub struct AvailabilitySlot {
    pub booking_id: BookingId,
    pub title: String,
    pub slot: TimeSlot,
    pub booked_by: UserId,
}

#[derive(Debug)]
pub struct Booking {
    pub booking_id: BookingId,
    pub booked_by: BookingUser,
    pub title: String,
    pub description: Option<String>,
    pub slot: TimeSlot,
    pub status: BookingStatus,
    pub attendees: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub room: BookingRoom,
}
