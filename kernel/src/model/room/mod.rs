use crate::model::id::RoomId;

pub mod event;

#[derive(Debug)]
pub struct Room {
    pub room_id: RoomId,
    pub name: String,
    pub location: String,
    pub capacity: i32,
    pub description: String,
    pub amenities: Vec<String>,
    pub is_active: bool,
}

/// Room fields attached to a booking. Availability and booking listings
/// expose only this summary, never the full room record.
#[derive(Debug)]
pub struct BookingRoom {
    pub room_id: RoomId,
    pub name: String,
    pub location: String,
    pub capacity: i32,
    pub is_active: bool,
}
