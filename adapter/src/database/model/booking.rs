use kernel::model::{
    booking::{AvailabilitySlot, Booking, BookingStatus, TimeSlot},
    id::{BookingId, RoomId, UserId},
    room::BookingRoom,
    user::BookingUser,
};
use shared::error::{AppError, ConflictingBooking};
use sqlx::types::chrono::{DateTime, Utc};

/// One booking joined with its room and its owner, as returned by the
/// listing and detail queries.
#[derive(sqlx::FromRow)]
pub struct BookingRow {
    pub booking_id: BookingId,
    pub room_id: RoomId,
    pub user_id: UserId,
    pub user_name: String,
    pub email: String,
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: String,
    pub attendees: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub room_name: String,
    pub location: String,
    pub capacity: i32,
    pub is_active: bool,
}

impl TryFrom<BookingRow> for Booking {
    type Error = AppError;

    fn try_from(value: BookingRow) -> Result<Self, Self::Error> {
        let BookingRow {
            booking_id,
            room_id,
            user_id,
            user_name,
            email,
            title,
            description,
            start_time,
            end_time,
            status,
            attendees,
            created_at,
            updated_at,
            room_name,
            location,
            capacity,
            is_active,
        } = value;
        // Rows can only hold intervals the write path already validated,
        // so a failure here means the table was tampered with.
        let slot = TimeSlot::new(start_time, end_time)?;
        let status = status
            .parse::<BookingStatus>()
            .map_err(|e| AppError::ConversionEntityError(e.to_string()))?;
        Ok(Booking {
            booking_id,
            booked_by: BookingUser {
                user_id,
                user_name,
                email,
            },
            title,
            description,
            slot,
            status,
            attendees,
            created_at,
            updated_at,
            room: BookingRoom {
                room_id,
                name: room_name,
                location,
                capacity,
                is_active,
            },
        })
    }
}

/// Projection used by the availability listing.
#[derive(sqlx::FromRow)]
pub struct AvailabilityRow {
    pub booking_id: BookingId,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub user_id: UserId,
}

impl TryFrom<AvailabilityRow> for AvailabilitySlot {
    type Error = AppError;

    fn try_from(value: AvailabilityRow) -> Result<Self, Self::Error> {
        let AvailabilityRow {
            booking_id,
            title,
            start_time,
            end_time,
            user_id,
        } = value;
        Ok(AvailabilitySlot {
            booking_id,
            title,
            slot: TimeSlot::new(start_time, end_time)?,
            booked_by: user_id,
        })
    }
}

/// The first confirmed booking found overlapping a proposed slot. Surfaced
/// to the caller inside the SchedulingConflict rejection.
#[derive(sqlx::FromRow)]
pub struct ConflictRow {
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl From<ConflictRow> for ConflictingBooking {
    fn from(value: ConflictRow) -> Self {
        let ConflictRow {
            title,
            start_time,
            end_time,
        } = value;
        ConflictingBooking {
            title,
            start_time,
            end_time,
        }
    }
}
