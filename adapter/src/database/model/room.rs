use kernel::model::{id::RoomId, room::Room};

#[derive(sqlx::FromRow)]
pub struct RoomRow {
    pub room_id: RoomId,
    pub name: String,
    pub location: String,
    pub capacity: i32,
    pub description: String,
    pub amenities: Vec<String>,
    pub is_active: bool,
}

impl From<RoomRow> for Room {
    fn from(value: RoomRow) -> Self {
        let RoomRow {
            room_id,
            name,
            location,
            capacity,
            description,
            amenities,
            is_active,
        } = value;
        Room {
            room_id,
            name,
            location,
            capacity,
            description,
            amenities,
            is_active,
        }
    }
}
