use chrono::{DateTime, NaiveDate, Utc};
use garde::Validate;
use kernel::model::{
    booking::{AvailabilitySlot, Booking, BookingStatus},
    id::{BookingId, RoomId, UserId},
    room::{BookingRoom, Room},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatusName {
    Confirmed,
    Cancelled,
}

impl From<BookingStatus> for BookingStatusName {
    fn from(value: BookingStatus) -> Self {
        match value {
            BookingStatus::Confirmed => Self::Confirmed,
            BookingStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl From<BookingStatusName> for BookingStatus {
    fn from(value: BookingStatusName) -> Self {
        match value {
            BookingStatusName::Confirmed => Self::Confirmed,
            BookingStatusName::Cancelled => Self::Cancelled,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    #[garde(skip)]
    pub room_id: RoomId,
    #[garde(length(min = 1))]
    pub title: String,
    #[garde(skip)]
    pub description: Option<String>,
    #[garde(skip)]
    pub start_time: DateTime<Utc>,
    #[garde(skip)]
    pub end_time: DateTime<Utc>,
    #[garde(skip)]
    #[serde(default)]
    pub attendees: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookingRequest {
    #[garde(inner(length(min = 1)))]
    pub title: Option<String>,
    #[garde(skip)]
    pub description: Option<String>,
    #[garde(skip)]
    pub start_time: Option<DateTime<Utc>>,
    #[garde(skip)]
    pub end_time: Option<DateTime<Utc>>,
    #[garde(skip)]
    pub attendees: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingListQuery {
    pub room: Option<RoomId>,
    pub date: Option<NaiveDate>,
    pub status: Option<BookingStatusName>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingsResponse {
    pub items: Vec<BookingResponse>,
}

impl From<Vec<Booking>> for BookingsResponse {
    fn from(value: Vec<Booking>) -> Self {
        Self {
            items: value.into_iter().map(BookingResponse::from).collect(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub booking_id: BookingId,
    pub booked_by: BookingUserResponse,
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: BookingStatusName,
    pub attendees: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub room: BookingRoomResponse,
}

impl From<Booking> for BookingResponse {
    fn from(value: Booking) -> Self {
        let Booking {
            booking_id,
            booked_by,
            title,
            description,
            slot,
            status,
            attendees,
            created_at,
            updated_at,
            room,
        } = value;
        Self {
            booking_id,
            booked_by: BookingUserResponse {
                user_id: booked_by.user_id,
                user_name: booked_by.user_name,
                email: booked_by.email,
            },
            title,
            description,
            start_time: slot.start(),
            end_time: slot.end(),
            status: status.into(),
            attendees,
            created_at,
            updated_at,
            room: room.into(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingUserResponse {
    pub user_id: UserId,
    pub user_name: String,
    pub email: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRoomResponse {
    pub room_id: RoomId,
    pub name: String,
    pub location: String,
    pub capacity: i32,
    pub is_active: bool,
}

impl From<BookingRoom> for BookingRoomResponse {
    fn from(value: BookingRoom) -> Self {
        let BookingRoom {
            room_id,
            name,
            location,
            capacity,
            is_active,
        } = value;
        Self {
            room_id,
            name,
            location,
            capacity,
            is_active,
        }
    }
}

/// The availability view: the room summary plus the day's confirmed slots,
/// ordered by start time. Descriptions and attendee lists are deliberately
/// not part of this view.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    pub room: AvailabilityRoomResponse,
    pub date: NaiveDate,
    pub bookings: Vec<AvailabilitySlotResponse>,
}

impl AvailabilityResponse {
    pub fn new(room: Room, date: NaiveDate, slots: Vec<AvailabilitySlot>) -> Self {
        Self {
            room: AvailabilityRoomResponse {
                room_id: room.room_id,
                name: room.name,
                capacity: room.capacity,
                location: room.location,
            },
            date,
            bookings: slots
                .into_iter()
                .map(AvailabilitySlotResponse::from)
                .collect(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRoomResponse {
    pub room_id: RoomId,
    pub name: String,
    pub capacity: i32,
    pub location: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilitySlotResponse {
    pub booking_id: BookingId,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub user_id: UserId,
}

impl From<AvailabilitySlot> for AvailabilitySlotResponse {
    fn from(value: AvailabilitySlot) -> Self {
        let AvailabilitySlot {
            booking_id,
            title,
            slot,
            booked_by,
        } = value;
        Self {
            booking_id,
            title,
            start_time: slot.start(),
            end_time: slot.end(),
            user_id: booked_by,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_accepts_camel_case_payloads() {
        let req: CreateBookingRequest = serde_json::from_str(
            r#"{
                "roomId": "22222222-2222-2222-2222-222222222222",
                "title": "Weekly sync",
                "startTime": "2025-03-10T10:00:00Z",
                "endTime": "2025-03-10T12:00:00Z"
            }"#,
        )
        .unwrap();
        assert_eq!(req.title, "Weekly sync");
        // attendees and description are optional
        assert!(req.attendees.is_empty());
        assert!(req.description.is_none());
    }

    #[test]
    fn status_names_round_trip_in_lowercase() {
        assert_eq!(
            serde_json::to_string(&BookingStatusName::Confirmed).unwrap(),
            r#""confirmed""#
        );
        let parsed: BookingStatusName = serde_json::from_str(r#""cancelled""#).unwrap();
        assert!(matches!(BookingStatus::from(parsed), BookingStatus::Cancelled));
    }
}
