use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use garde::Validate;
use kernel::model::{
    booking::{
        event::{BookingListOptions, CancelBooking, CreateBooking, UpdateBooking},
        TimeSlot,
    },
    id::{BookingId, RoomId},
};
use registry::AppRegistry;
use shared::error::{AppError, AppResult};

use crate::{
    extractor::AuthorizedUser,
    model::booking::{
        AvailabilityQuery, AvailabilityResponse, BookingListQuery, BookingResponse,
        BookingsResponse, CreateBookingRequest, UpdateBookingRequest,
    },
};

pub async fn register_booking(
    user: AuthorizedUser,
    State(registry): State<AppRegistry>,
    Json(req): Json<CreateBookingRequest>,
) -> AppResult<(StatusCode, Json<BookingResponse>)> {
    req.validate(&())?;

    // Future, ordering and duration checks happen here, before the room
    // and the calendar are consulted; the repository runs the remaining
    // two checks inside its transaction.
    let slot = TimeSlot::validated(req.start_time, req.end_time, Utc::now())?;

    let event = CreateBooking::new(
        req.room_id,
        user.id(),
        req.title,
        req.description,
        slot,
        req.attendees,
    );
    let booking_id = registry.booking_repository().create(event).await?;

    let booking = registry
        .booking_repository()
        .find_by_id(booking_id, None)
        .await?
        .ok_or_else(|| AppError::EntityNotFound("booking not found".into()))?;

    Ok((StatusCode::CREATED, Json(booking.into())))
}

pub async fn show_booking_list(
    user: AuthorizedUser,
    Query(query): Query<BookingListQuery>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<BookingsResponse>> {
    // Non-admin callers only ever see their own bookings.
    let booked_by = (!user.is_admin()).then(|| user.id());

    let options = BookingListOptions {
        booked_by,
        room_id: query.room,
        date: query.date,
        status: query.status.map(Into::into),
    };
    registry
        .booking_repository()
        .find_all(options)
        .await
        .map(BookingsResponse::from)
        .map(Json)
}

pub async fn show_booking(
    user: AuthorizedUser,
    Path(booking_id): Path<BookingId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<BookingResponse>> {
    let booked_by = (!user.is_admin()).then(|| user.id());

    registry
        .booking_repository()
        .find_by_id(booking_id, booked_by)
        .await
        .and_then(|booking| match booking {
            Some(booking) => Ok(Json(booking.into())),
            // Absent and not-yours are indistinguishable on purpose.
            None => Err(AppError::EntityNotFound("booking not found".into())),
        })
}

pub async fn update_booking(
    user: AuthorizedUser,
    Path(booking_id): Path<BookingId>,
    State(registry): State<AppRegistry>,
    Json(req): Json<UpdateBookingRequest>,
) -> AppResult<Json<BookingResponse>> {
    req.validate(&())?;

    let event = UpdateBooking::new(
        booking_id,
        user.id(),
        user.is_admin(),
        req.title,
        req.description,
        req.start_time,
        req.end_time,
        req.attendees,
    );
    registry.booking_repository().update(event).await?;

    let booking = registry
        .booking_repository()
        .find_by_id(booking_id, None)
        .await?
        .ok_or_else(|| AppError::EntityNotFound("booking not found".into()))?;

    Ok(Json(booking.into()))
}

pub async fn cancel_booking(
    user: AuthorizedUser,
    Path(booking_id): Path<BookingId>,
    State(registry): State<AppRegistry>,
) -> AppResult<StatusCode> {
    let event = CancelBooking::new(booking_id, user.id(), user.is_admin());
    registry
        .booking_repository()
        .cancel(event)
        .await
        .map(|_| StatusCode::OK)
}

pub async fn show_room_availability(
    _user: AuthorizedUser,
    Path(room_id): Path<RoomId>,
    Query(query): Query<AvailabilityQuery>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<AvailabilityResponse>> {
    let room = registry
        .room_repository()
        .find_by_id(room_id)
        .await?
        .filter(|room| room.is_active)
        .ok_or_else(|| AppError::EntityNotFound("room not found".into()))?;

    let slots = registry
        .booking_repository()
        .find_confirmed_on(room_id, query.date)
        .await?;

    Ok(Json(AvailabilityResponse::new(room, query.date, slots)))
}
