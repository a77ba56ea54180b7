use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use derive_new::new;
use kernel::{
    model::{
        booking::{
            event::{BookingListOptions, CancelBooking, CreateBooking, UpdateBooking},
            AvailabilitySlot, Booking, BookingStatus, TimeSlot,
        },
        id::{BookingId, RoomId, UserId},
    },
    repository::booking::BookingRepository,
};
use shared::error::{AppError, AppResult};

use crate::database::{
    model::booking::{AvailabilityRow, BookingRow, ConflictRow},
    ConnectionPool,
};

#[derive(new)]
pub struct BookingRepositoryImpl {
    db: ConnectionPool,
}

const BOOKING_COLUMNS: &str = r#"
    b.booking_id,
    b.room_id,
    b.booked_by AS user_id,
    u.user_name,
    u.email,
    b.title,
    b.description,
    b.start_time,
    b.end_time,
    b.status,
    b.attendees,
    b.created_at,
    b.updated_at,
    r.name AS room_name,
    r.location,
    r.capacity,
    r.is_active
"#;

const BOOKING_JOINS: &str = r#"
    FROM bookings AS b
    INNER JOIN rooms AS r ON b.room_id = r.room_id
    INNER JOIN users AS u ON b.booked_by = u.user_id
"#;

#[async_trait]
impl BookingRepository for BookingRepositoryImpl {
    async fn create(&self, event: CreateBooking) -> AppResult<BookingId> {
        let mut tx = self.db.begin().await?;

        // The room check, the overlap scan and the insert must commit as
        // one unit with respect to other writes on this room's schedule.
        // A bare check-then-insert lets two concurrent requests both pass
        // the scan and both insert; SERIALIZABLE aborts one of them.
        self.set_transaction_serializable(&mut tx).await?;

        self.ensure_room_available(&mut tx, event.room_id).await?;

        if let Some(conflict) = self
            .find_confirmed_overlap(&mut tx, event.room_id, &event.slot, None)
            .await?
        {
            return Err(AppError::SchedulingConflict(conflict.into()));
        }

        let booking_id = BookingId::new();
        let res = sqlx::query(
            r#"
                INSERT INTO bookings
                (booking_id, room_id, booked_by, title, description,
                start_time, end_time, status, attendees)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(booking_id)
        .bind(event.room_id)
        .bind(event.booked_by)
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.slot.start())
        .bind(event.slot.end())
        .bind(BookingStatus::Confirmed.as_ref())
        .bind(&event.attendees)
        .execute(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        if res.rows_affected() < 1 {
            return Err(AppError::NoRowsAffectedError(
                "No booking record has been created".into(),
            ));
        }

        tx.commit().await.map_err(AppError::TransactionError)?;

        Ok(booking_id)
    }

    async fn update(&self, event: UpdateBooking) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        // Same discipline as create: the interval re-validation and the
        // write belong to one serializable unit.
        self.set_transaction_serializable(&mut tx).await?;

        // Only a confirmed booking visible to the caller can be amended.
        let current: Option<BookingItem> = sqlx::query_as(
            r#"
                SELECT room_id, title, description, start_time, end_time, attendees
                FROM bookings
                WHERE booking_id = $1
                  AND status = 'confirmed'
                  AND ($2 OR booked_by = $3)
                FOR UPDATE
            "#,
        )
        .bind(event.booking_id)
        .bind(event.for_any_user)
        .bind(event.requested_user)
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        let Some(current) = current else {
            return Err(AppError::EntityNotFound(
                "booking not found or cannot be modified".into(),
            ));
        };

        // Non-time edits are applied as-is; a time change re-runs the full
        // request validation against the merged interval, excluding this
        // booking's own prior state from the overlap scan.
        let slot = if event.touches_time() {
            let start = event.start_time.unwrap_or(current.start_time);
            let end = event.end_time.unwrap_or(current.end_time);
            let slot = TimeSlot::validated(start, end, Utc::now())?;

            self.ensure_room_available(&mut tx, current.room_id).await?;

            if let Some(conflict) = self
                .find_confirmed_overlap(&mut tx, current.room_id, &slot, Some(event.booking_id))
                .await?
            {
                return Err(AppError::SchedulingConflict(conflict.into()));
            }
            slot
        } else {
            TimeSlot::new(current.start_time, current.end_time)?
        };

        // Explicit allow-list: status, ownership and room are not writable
        // through this path.
        let res = sqlx::query(
            r#"
                UPDATE bookings
                SET
                    title = $2,
                    description = $3,
                    start_time = $4,
                    end_time = $5,
                    attendees = $6
                WHERE booking_id = $1
            "#,
        )
        .bind(event.booking_id)
        .bind(event.title.unwrap_or(current.title))
        .bind(event.description.or(current.description))
        .bind(slot.start())
        .bind(slot.end())
        .bind(event.attendees.unwrap_or(current.attendees))
        .execute(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        if res.rows_affected() < 1 {
            return Err(AppError::NoRowsAffectedError(
                "No booking record has been updated".into(),
            ));
        }

        tx.commit().await.map_err(AppError::TransactionError)?;

        Ok(())
    }

    async fn cancel(&self, event: CancelBooking) -> AppResult<()> {
        // A single conditional UPDATE is atomic on its own: the status
        // predicate makes the confirmed -> cancelled transition one-way.
        let res = sqlx::query(
            r#"
                UPDATE bookings
                SET status = 'cancelled'
                WHERE booking_id = $1
                  AND status = 'confirmed'
                  AND ($2 OR booked_by = $3)
            "#,
        )
        .bind(event.booking_id)
        .bind(event.for_any_user)
        .bind(event.requested_user)
        .execute(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        if res.rows_affected() < 1 {
            return Err(AppError::EntityNotFound(
                "booking not found or already cancelled".into(),
            ));
        }

        Ok(())
    }

    async fn find_by_id(
        &self,
        booking_id: BookingId,
        booked_by: Option<UserId>,
    ) -> AppResult<Option<Booking>> {
        let row: Option<BookingRow> = sqlx::query_as(&format!(
            r#"
                SELECT {BOOKING_COLUMNS}
                {BOOKING_JOINS}
                WHERE b.booking_id = $1
                  AND ($2::uuid IS NULL OR b.booked_by = $2)
            "#
        ))
        .bind(booking_id)
        .bind(booked_by)
        .fetch_optional(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        row.map(Booking::try_from).transpose()
    }

    async fn find_all(&self, options: BookingListOptions) -> AppResult<Vec<Booking>> {
        let mut query = sqlx::QueryBuilder::new(format!(
            "SELECT {BOOKING_COLUMNS} {BOOKING_JOINS} WHERE 1 = 1"
        ));
        if let Some(booked_by) = options.booked_by {
            query.push(" AND b.booked_by = ").push_bind(booked_by);
        }
        if let Some(room_id) = options.room_id {
            query.push(" AND b.room_id = ").push_bind(room_id);
        }
        if let Some(status) = options.status {
            query
                .push(" AND b.status = ")
                .push_bind(status.as_ref().to_string());
        }
        if let Some(date) = options.date {
            let (from, to) = day_window(date);
            query
                .push(" AND b.start_time BETWEEN ")
                .push_bind(from)
                .push(" AND ")
                .push_bind(to);
        }
        query.push(" ORDER BY b.start_time ASC");

        let rows: Vec<BookingRow> = query
            .build_query_as()
            .fetch_all(self.db.inner_ref())
            .await
            .map_err(AppError::SpecificOperationError)?;

        rows.into_iter().map(Booking::try_from).collect()
    }

    async fn find_confirmed_on(
        &self,
        room_id: RoomId,
        date: NaiveDate,
    ) -> AppResult<Vec<AvailabilitySlot>> {
        let (from, to) = day_window(date);
        let rows: Vec<AvailabilityRow> = sqlx::query_as(
            r#"
                SELECT booking_id, title, start_time, end_time, booked_by AS user_id
                FROM bookings
                WHERE room_id = $1
                  AND status = 'confirmed'
                  AND start_time BETWEEN $2 AND $3
                ORDER BY start_time ASC
            "#,
        )
        .bind(room_id)
        .bind(from)
        .bind(to)
        .fetch_all(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        rows.into_iter().map(AvailabilitySlot::try_from).collect()
    }
}

/// Merge source for the allow-listed update.
#[derive(sqlx::FromRow)]
struct BookingItem {
    room_id: RoomId,
    title: String,
    description: Option<String>,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    attendees: Vec<String>,
}

/// The UTC day window `[00:00:00.000, 23:59:59.999]` bounding availability
/// and date-filtered listings to one calendar date.
fn day_window(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let from = date.and_time(NaiveTime::MIN).and_utc();
    let to = from + (Duration::days(1) - Duration::milliseconds(1));
    (from, to)
}

impl BookingRepositoryImpl {
    async fn set_transaction_serializable(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> AppResult<()> {
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut **tx)
            .await
            .map_err(AppError::SpecificOperationError)?;
        Ok(())
    }

    // The room must exist and be active before a slot on it can be taken.
    async fn ensure_room_available(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        room_id: RoomId,
    ) -> AppResult<()> {
        let row: Option<(bool,)> = sqlx::query_as(
            r#"
                SELECT is_active
                FROM rooms
                WHERE room_id = $1
            "#,
        )
        .bind(room_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        match row {
            Some((true,)) => Ok(()),
            _ => Err(AppError::RoomUnavailable),
        }
    }

    /// The conflict scan: first confirmed booking on the room whose
    /// half-open interval overlaps the proposed slot. Touching endpoints
    /// (`existing.end == proposed.start`) do not match, so back-to-back
    /// bookings pass. `exclude` keeps an update from conflicting with the
    /// booking's own prior state.
    async fn find_confirmed_overlap(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        room_id: RoomId,
        slot: &TimeSlot,
        exclude: Option<BookingId>,
    ) -> AppResult<Option<ConflictRow>> {
        sqlx::query_as(
            r#"
                SELECT title, start_time, end_time
                FROM bookings
                WHERE room_id = $1
                  AND status = 'confirmed'
                  AND start_time < $3
                  AND $2 < end_time
                  AND ($4::uuid IS NULL OR booking_id <> $4)
                LIMIT 1
            "#,
        )
        .bind(room_id)
        .bind(slot.start())
        .bind(slot.end())
        .bind(exclude)
        .fetch_optional(&mut **tx)
        .await
        .map_err(AppError::SpecificOperationError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const USER_ID: &str = "11111111-1111-1111-1111-111111111111";
    const OTHER_USER_ID: &str = "99999999-9999-9999-9999-999999999999";
    const ROOM_ID: &str = "22222222-2222-2222-2222-222222222222";
    const INACTIVE_ROOM_ID: &str = "33333333-3333-3333-3333-333333333333";

    fn user() -> UserId {
        USER_ID.parse().unwrap()
    }

    fn other_user() -> UserId {
        OTHER_USER_ID.parse().unwrap()
    }

    fn room() -> RoomId {
        ROOM_ID.parse().unwrap()
    }

    // All test slots live on the day after tomorrow so the future check
    // never interferes, whatever the wall clock says.
    fn test_day() -> NaiveDate {
        (Utc::now() + Duration::days(2)).date_naive()
    }

    fn at(hour: u32, min: u32) -> DateTime<Utc> {
        test_day()
            .and_time(NaiveTime::from_hms_opt(hour, min, 0).unwrap())
            .and_utc()
    }

    fn slot(start_hour: u32, end_hour: u32) -> TimeSlot {
        TimeSlot::new(at(start_hour, 0), at(end_hour, 0)).unwrap()
    }

    fn booking(title: &str, start_hour: u32, end_hour: u32) -> CreateBooking {
        CreateBooking::new(
            room(),
            user(),
            title.into(),
            None,
            slot(start_hour, end_hour),
            vec![],
        )
    }

    #[sqlx::test(migrations = "../migrations", fixtures("common"))]
    async fn conflict_is_reported_and_cancellation_releases_the_slot(
        pool: sqlx::PgPool,
    ) -> anyhow::Result<()> {
        let repo = BookingRepositoryImpl::new(ConnectionPool::new(pool));

        let first = repo.create(booking("Sprint planning", 10, 12)).await?;

        // Overlapping request is rejected with the holder's summary.
        let res = repo.create(booking("Standup", 11, 13)).await;
        match res {
            Err(AppError::SchedulingConflict(conflict)) => {
                assert_eq!(conflict.title, "Sprint planning");
                assert_eq!(conflict.start_time, at(10, 0));
                assert_eq!(conflict.end_time, at(12, 0));
            }
            other => panic!("expected SchedulingConflict, got {other:?}"),
        }

        repo.cancel(CancelBooking::new(first, user(), false)).await?;

        // The cancelled booking no longer holds the slot.
        repo.create(booking("Standup", 11, 13)).await?;

        Ok(())
    }

    #[sqlx::test(migrations = "../migrations", fixtures("common"))]
    async fn back_to_back_bookings_are_legal(pool: sqlx::PgPool) -> anyhow::Result<()> {
        let repo = BookingRepositoryImpl::new(ConnectionPool::new(pool));

        repo.create(booking("Morning", 10, 12)).await?;
        // Starts exactly when the first one ends.
        repo.create(booking("Afternoon", 12, 14)).await?;

        Ok(())
    }

    #[sqlx::test(migrations = "../migrations", fixtures("common"))]
    async fn missing_or_inactive_room_is_unavailable(pool: sqlx::PgPool) -> anyhow::Result<()> {
        let repo = BookingRepositoryImpl::new(ConnectionPool::new(pool));

        let mut to_inactive = booking("Anywhere", 10, 11);
        to_inactive.room_id = INACTIVE_ROOM_ID.parse().unwrap();
        assert!(matches!(
            repo.create(to_inactive).await,
            Err(AppError::RoomUnavailable)
        ));

        let mut to_missing = booking("Anywhere", 10, 11);
        to_missing.room_id = RoomId::new();
        assert!(matches!(
            repo.create(to_missing).await,
            Err(AppError::RoomUnavailable)
        ));

        Ok(())
    }

    #[sqlx::test(migrations = "../migrations", fixtures("common"))]
    async fn update_does_not_conflict_with_its_own_prior_state(
        pool: sqlx::PgPool,
    ) -> anyhow::Result<()> {
        let repo = BookingRepositoryImpl::new(ConnectionPool::new(pool));

        let booking_id = repo.create(booking("Review", 10, 12)).await?;

        // The new interval overlaps the old one; only the booking itself
        // occupies it, so the shift must go through.
        repo.update(UpdateBooking::new(
            booking_id,
            user(),
            false,
            None,
            None,
            Some(at(11, 0)),
            Some(at(13, 0)),
            None,
        ))
        .await?;

        let updated = repo.find_by_id(booking_id, None).await?.unwrap();
        assert_eq!(updated.slot.start(), at(11, 0));
        assert_eq!(updated.slot.end(), at(13, 0));

        Ok(())
    }

    #[sqlx::test(migrations = "../migrations", fixtures("common"))]
    async fn update_still_conflicts_with_other_bookings(
        pool: sqlx::PgPool,
    ) -> anyhow::Result<()> {
        let repo = BookingRepositoryImpl::new(ConnectionPool::new(pool));

        repo.create(booking("Holder", 14, 16)).await?;
        let booking_id = repo.create(booking("Mover", 10, 12)).await?;

        let res = repo
            .update(UpdateBooking::new(
                booking_id,
                user(),
                false,
                None,
                None,
                Some(at(15, 0)),
                Some(at(17, 0)),
                None,
            ))
            .await;
        assert!(matches!(res, Err(AppError::SchedulingConflict(_))));

        Ok(())
    }

    #[sqlx::test(migrations = "../migrations", fixtures("common"))]
    async fn update_scope_and_status_rules(pool: sqlx::PgPool) -> anyhow::Result<()> {
        let repo = BookingRepositoryImpl::new(ConnectionPool::new(pool));

        let booking_id = repo.create(booking("Owned", 10, 12)).await?;

        // Someone else cannot touch it...
        let res = repo
            .update(UpdateBooking::new(
                booking_id,
                other_user(),
                false,
                Some("Hijacked".into()),
                None,
                None,
                None,
                None,
            ))
            .await;
        assert!(matches!(res, Err(AppError::EntityNotFound(_))));

        // ...but an admin-scoped update can, and a title-only edit leaves
        // the interval alone.
        repo.update(UpdateBooking::new(
            booking_id,
            other_user(),
            true,
            Some("Renamed".into()),
            None,
            None,
            None,
            None,
        ))
        .await?;

        let updated = repo.find_by_id(booking_id, None).await?.unwrap();
        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.slot, slot(10, 12));
        assert_eq!(updated.status, BookingStatus::Confirmed);

        // Once cancelled, the booking is immutable and a second cancel is
        // rejected rather than silently accepted.
        repo.cancel(CancelBooking::new(booking_id, user(), false))
            .await?;
        let res = repo
            .update(UpdateBooking::new(
                booking_id,
                user(),
                false,
                Some("Too late".into()),
                None,
                None,
                None,
                None,
            ))
            .await;
        assert!(matches!(res, Err(AppError::EntityNotFound(_))));
        let res = repo
            .cancel(CancelBooking::new(booking_id, user(), false))
            .await;
        assert!(matches!(res, Err(AppError::EntityNotFound(_))));

        Ok(())
    }

    #[sqlx::test(migrations = "../migrations", fixtures("common"))]
    async fn availability_is_ordered_and_excludes_cancelled(
        pool: sqlx::PgPool,
    ) -> anyhow::Result<()> {
        let repo = BookingRepositoryImpl::new(ConnectionPool::new(pool));

        repo.create(booking("Late", 14, 15)).await?;
        repo.create(booking("Early", 9, 10)).await?;
        repo.create(booking("Midday", 11, 12)).await?;
        let cancelled = repo.create(booking("Dropped", 10, 11)).await?;
        repo.cancel(CancelBooking::new(cancelled, user(), false))
            .await?;

        let slots = repo.find_confirmed_on(room(), test_day()).await?;
        let titles: Vec<&str> = slots.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, ["Early", "Midday", "Late"]);
        assert!(slots.windows(2).all(|w| w[0].slot.start() <= w[1].slot.start()));

        // Another day is empty.
        let other_day = test_day() + Duration::days(1);
        assert!(repo.find_confirmed_on(room(), other_day).await?.is_empty());

        Ok(())
    }

    #[sqlx::test(migrations = "../migrations", fixtures("common"))]
    async fn listing_respects_owner_scope_and_filters(
        pool: sqlx::PgPool,
    ) -> anyhow::Result<()> {
        let repo = BookingRepositoryImpl::new(ConnectionPool::new(pool));

        repo.create(booking("Mine", 9, 10)).await?;
        let mut theirs = booking("Theirs", 11, 12);
        theirs.booked_by = other_user();
        let theirs_id = repo.create(theirs).await?;
        repo.cancel(CancelBooking::new(theirs_id, other_user(), false))
            .await?;

        // Owner scope.
        let mine = repo
            .find_all(BookingListOptions {
                booked_by: Some(user()),
                ..Default::default()
            })
            .await?;
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].title, "Mine");

        // Admin scope sees everything, cancelled included.
        let all = repo.find_all(BookingListOptions::default()).await?;
        assert_eq!(all.len(), 2);

        // Status filter.
        let cancelled = repo
            .find_all(BookingListOptions {
                status: Some(BookingStatus::Cancelled),
                ..Default::default()
            })
            .await?;
        assert_eq!(cancelled.len(), 1);
        assert_eq!(cancelled[0].title, "Theirs");

        // Date filter bounded to the test day.
        let on_day = repo
            .find_all(BookingListOptions {
                date: Some(test_day()),
                ..Default::default()
            })
            .await?;
        assert_eq!(on_day.len(), 2);
        let off_day = repo
            .find_all(BookingListOptions {
                date: Some(test_day() + Duration::days(1)),
                ..Default::default()
            })
            .await?;
        assert!(off_day.is_empty());

        Ok(())
    }

    #[sqlx::test(migrations = "../migrations", fixtures("common"))]
    async fn concurrent_requests_cannot_double_book(pool: sqlx::PgPool) -> anyhow::Result<()> {
        let repo_a = BookingRepositoryImpl::new(ConnectionPool::new(pool.clone()));
        let repo_b = BookingRepositoryImpl::new(ConnectionPool::new(pool));

        let (res_a, res_b) = tokio::join!(
            repo_a.create(booking("Racer A", 10, 12)),
            repo_b.create(booking("Racer B", 11, 13)),
        );

        // One of the two may also fail with a serialization abort; what
        // must never happen is both committing.
        let successes = [&res_a, &res_b].iter().filter(|r| r.is_ok()).count();
        assert!(successes <= 1, "both overlapping requests committed");

        let slots = repo_a.find_confirmed_on(room(), test_day()).await?;
        for (i, a) in slots.iter().enumerate() {
            for b in &slots[i + 1..] {
                assert!(!a.slot.overlaps(&b.slot), "confirmed bookings overlap");
            }
        }

        Ok(())
    }
}
