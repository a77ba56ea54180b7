use chrono::{DateTime, NaiveDate, Utc};
use derive_new::new;

use crate::model::{
    booking::{BookingStatus, TimeSlot},
    id::{BookingId, RoomId, UserId},
};

#[derive(new)]
pub struct CreateBooking {
    pub room_id: RoomId,
    pub booked_by: UserId,
    pub title: String,
    pub description: Option<String>,
    pub slot: TimeSlot,
    pub attendees: Vec<String>,
}

/// Allow-listed booking update. Only these fields are writable through the
/// update path; status and ownership are not.
#[derive(new)]
pub struct UpdateBooking {
    pub booking_id: BookingId,
    pub requested_user: UserId,
    pub for_any_user: bool,
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub attendees: Option<Vec<String>>,
}

impl UpdateBooking {
    pub fn touches_time(&self) -> bool {
        self.start_time.is_some() || self.end_time.is_some()
    }
}

#[derive(new)]
pub struct CancelBooking {
    pub booking_id: BookingId,
    pub requested_user: UserId,
    pub for_any_user: bool,
}

/// Listing filters. `booked_by: None` is admin scope (all users).
#[derive(Debug, Default)]
pub struct BookingListOptions {
    pub booked_by: Option<UserId>,
    pub room_id: Option<RoomId>,
    pub date: Option<NaiveDate>,
    pub status: Option<BookingStatus>,
}
