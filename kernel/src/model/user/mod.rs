use crate::model::{id::UserId, role::Role};

pub mod event;

#[derive(Debug, PartialEq, Eq)]
pub struct User {
    pub user_id: UserId,
    pub user_name: String,
    pub email: String,
    pub role: Role,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// The user attached to a booking in list/detail views.
#[derive(Debug)]
pub struct BookingUser {
    pub user_id: UserId,
    pub user_name: String,
    pub email: String,
}
