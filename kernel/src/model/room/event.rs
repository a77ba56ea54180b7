use crate::model::id::{RoomId, UserId};

pub struct CreateRoom {
    pub name: String,
    pub location: String,
    pub capacity: i32,
    pub description: String,
    pub amenities: Vec<String>,
}

/// Allow-listed room update. `is_active` is settable here because
/// reactivating a room is an admin operation; booking updates have no
/// equivalent escape hatch.
#[derive(Debug)]
pub struct UpdateRoom {
    pub room_id: RoomId,
    pub name: Option<String>,
    pub location: Option<String>,
    pub capacity: Option<i32>,
    pub description: Option<String>,
    pub amenities: Option<Vec<String>>,
    pub is_active: Option<bool>,
    pub requested_user: UserId,
}

#[derive(Debug)]
pub struct DeleteRoom {
    pub room_id: RoomId,
    pub requested_user: UserId,
}
