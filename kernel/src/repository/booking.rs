use async_trait::async_trait;
use chrono::NaiveDate;
use shared::error::AppResult;

use crate::model::{
    booking::{
        event::{BookingListOptions, CancelBooking, CreateBooking, UpdateBooking},
        AvailabilitySlot, Booking,
    },
    id::{BookingId, RoomId, UserId},
};

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Persists a new confirmed booking. The room check, the conflict scan
    /// and the insert must execute atomically with respect to other writes
    /// on the same room's schedule.
    async fn create(&self, event: CreateBooking) -> AppResult<BookingId>;
    /// Applies an allow-listed update to a confirmed booking. When time
    /// fields are present the proposed slot is re-validated against the
    /// calendar, excluding the booking's own prior state.
    async fn update(&self, event: UpdateBooking) -> AppResult<()>;
    /// `confirmed -> cancelled`. Rejects missing or already-cancelled
    /// bookings rather than silently accepting them.
    async fn cancel(&self, event: CancelBooking) -> AppResult<()>;
    /// `booked_by: Some(..)` restricts visibility to that owner; `None` is
    /// admin scope.
    async fn find_by_id(
        &self,
        booking_id: BookingId,
        booked_by: Option<UserId>,
    ) -> AppResult<Option<Booking>>;
    async fn find_all(&self, options: BookingListOptions) -> AppResult<Vec<Booking>>;
    /// Confirmed bookings whose start falls inside the UTC day window of
    /// `date`, ordered by start time ascending.
    async fn find_confirmed_on(
        &self,
        room_id: RoomId,
        date: NaiveDate,
    ) -> AppResult<Vec<AvailabilitySlot>>;
}
