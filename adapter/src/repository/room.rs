use async_trait::async_trait;
use derive_new::new;
use kernel::{
    model::{
        id::RoomId,
        room::{
            event::{CreateRoom, DeleteRoom, UpdateRoom},
            Room,
        },
    },
    repository::room::RoomRepository,
};
use shared::error::{AppError, AppResult};

use crate::database::{model::room::RoomRow, ConnectionPool};

#[derive(new)]
pub struct RoomRepositoryImpl {
    db: ConnectionPool,
}

const ROOM_COLUMNS: &str = r#"
    room_id,
    name,
    location,
    capacity,
    description,
    amenities,
    is_active
"#;

#[async_trait]
impl RoomRepository for RoomRepositoryImpl {
    async fn create(&self, event: CreateRoom) -> AppResult<RoomId> {
        let room_id = RoomId::new();
        let res = sqlx::query(
            r#"
                INSERT INTO rooms (room_id, name, location, capacity, description, amenities)
                VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(room_id)
        .bind(&event.name)
        .bind(&event.location)
        .bind(event.capacity)
        .bind(&event.description)
        .bind(&event.amenities)
        .execute(self.db.inner_ref())
        .await
        .map_err(duplicate_name_or_operation_error)?;

        if res.rows_affected() < 1 {
            return Err(AppError::NoRowsAffectedError(
                "No room record has been created".into(),
            ));
        }

        Ok(room_id)
    }

    async fn find_all(&self, active_only: bool) -> AppResult<Vec<Room>> {
        let sql = if active_only {
            format!(
                "SELECT {ROOM_COLUMNS} FROM rooms WHERE is_active = TRUE ORDER BY name ASC"
            )
        } else {
            format!("SELECT {ROOM_COLUMNS} FROM rooms ORDER BY name ASC")
        };
        let rows: Vec<RoomRow> = sqlx::query_as(&sql)
            .fetch_all(self.db.inner_ref())
            .await
            .map_err(AppError::SpecificOperationError)?;

        Ok(rows.into_iter().map(Room::from).collect())
    }

    async fn find_by_id(&self, room_id: RoomId) -> AppResult<Option<Room>> {
        let row: Option<RoomRow> = sqlx::query_as(&format!(
            "SELECT {ROOM_COLUMNS} FROM rooms WHERE room_id = $1"
        ))
        .bind(room_id)
        .fetch_optional(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        Ok(row.map(Room::from))
    }

    async fn update(&self, event: UpdateRoom) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        // Load the current record first so Option fields can be merged in
        // one explicit UPDATE. The row lock keeps two admin edits from
        // interleaving.
        let current: Option<RoomRow> = sqlx::query_as(&format!(
            "SELECT {ROOM_COLUMNS} FROM rooms WHERE room_id = $1 FOR UPDATE"
        ))
        .bind(event.room_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        let Some(current) = current else {
            return Err(AppError::EntityNotFound("room not found".into()));
        };

        let UpdateRoom {
            room_id,
            name,
            location,
            capacity,
            description,
            amenities,
            is_active,
            requested_user: _,
        } = event;

        let res = sqlx::query(
            r#"
                UPDATE rooms
                SET
                    name = $2,
                    location = $3,
                    capacity = $4,
                    description = $5,
                    amenities = $6,
                    is_active = $7
                WHERE room_id = $1
            "#,
        )
        .bind(room_id)
        .bind(name.unwrap_or(current.name))
        .bind(location.unwrap_or(current.location))
        .bind(capacity.unwrap_or(current.capacity))
        .bind(description.unwrap_or(current.description))
        .bind(amenities.unwrap_or(current.amenities))
        .bind(is_active.unwrap_or(current.is_active))
        .execute(&mut *tx)
        .await
        .map_err(duplicate_name_or_operation_error)?;

        if res.rows_affected() < 1 {
            return Err(AppError::NoRowsAffectedError(
                "No room record has been updated".into(),
            ));
        }

        tx.commit().await.map_err(AppError::TransactionError)?;

        Ok(())
    }

    // Rooms are never physically deleted; deactivation hides them from
    // listings and blocks new bookings.
    async fn deactivate(&self, event: DeleteRoom) -> AppResult<()> {
        let res = sqlx::query(
            r#"
                UPDATE rooms
                SET is_active = FALSE
                WHERE room_id = $1
            "#,
        )
        .bind(event.room_id)
        .execute(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        if res.rows_affected() < 1 {
            return Err(AppError::EntityNotFound("room not found".into()));
        }

        Ok(())
    }
}

fn duplicate_name_or_operation_error(e: sqlx::Error) -> AppError {
    match &e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AppError::UnprocessableEntity("room with this name already exists".into())
        }
        _ => AppError::SpecificOperationError(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[sqlx::test(migrations = "../migrations")]
    async fn test_register_room(pool: sqlx::PgPool) -> anyhow::Result<()> {
        let repo = RoomRepositoryImpl::new(ConnectionPool::new(pool));

        let room = CreateRoom {
            name: "Test Room".into(),
            location: "Test Location".into(),
            capacity: 5,
            description: "Test Description".into(),
            amenities: vec!["WiFi".into()],
        };

        let room_id = repo.create(room).await?;

        let res = repo.find_by_id(room_id).await?;
        assert!(res.is_some());

        let Room {
            room_id: id,
            name,
            location,
            capacity,
            description,
            amenities,
            is_active,
        } = res.unwrap();
        assert_eq!(id, room_id);
        assert_eq!(name, "Test Room");
        assert_eq!(location, "Test Location");
        assert_eq!(capacity, 5);
        assert_eq!(description, "Test Description");
        assert_eq!(amenities, vec!["WiFi".to_string()]);
        assert!(is_active);

        Ok(())
    }

    #[sqlx::test(migrations = "../migrations")]
    async fn test_duplicate_room_name_is_rejected(pool: sqlx::PgPool) -> anyhow::Result<()> {
        let repo = RoomRepositoryImpl::new(ConnectionPool::new(pool));

        let make = |name: &str| CreateRoom {
            name: name.into(),
            location: "1F".into(),
            capacity: 10,
            description: String::new(),
            amenities: vec![],
        };

        repo.create(make("Conference A")).await?;
        // The uniqueness check is case-insensitive.
        let res = repo.create(make("conference a")).await;
        assert!(matches!(res, Err(AppError::UnprocessableEntity(_))));

        Ok(())
    }

    #[sqlx::test(migrations = "../migrations")]
    async fn test_deactivated_room_is_hidden_from_active_listing(
        pool: sqlx::PgPool,
    ) -> anyhow::Result<()> {
        let repo = RoomRepositoryImpl::new(ConnectionPool::new(pool));

        let room_id = repo
            .create(CreateRoom {
                name: "Basement".into(),
                location: "B1".into(),
                capacity: 3,
                description: String::new(),
                amenities: vec![],
            })
            .await?;

        repo.deactivate(DeleteRoom {
            room_id,
            requested_user: kernel::model::id::UserId::new(),
        })
        .await?;

        assert!(repo.find_all(true).await?.is_empty());
        assert_eq!(repo.find_all(false).await?.len(), 1);

        // A second deactivation still reports success shape of the row
        // being present; a missing room does not.
        let res = repo
            .deactivate(DeleteRoom {
                room_id: RoomId::new(),
                requested_user: kernel::model::id::UserId::new(),
            })
            .await;
        assert!(matches!(res, Err(AppError::EntityNotFound(_))));

        Ok(())
    }
}
