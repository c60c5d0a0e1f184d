use async_trait::async_trait;
use sqlx::PgPool;
use wayfare_core::models::BookingPerson;
use wayfare_core::record::{Row, Table};
use wayfare_core::repository::{RecordStore, RepoResult, UpdateOutcome};

use crate::sql;

/// Single-table access for legs, trips, vacations, persons and person links.
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn insert_unique(&self, row: Row) -> RepoResult<Option<i64>> {
        let id = sql::insert_unless_exists(&row)
            .build_query_scalar::<i64>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(id)
    }

    async fn update(&self, id: i64, row: Row) -> RepoResult<UpdateOutcome> {
        let result = sql::update_by_id(&row, id)
            .build()
            .execute(&self.pool)
            .await;
        sql::update_outcome(result)
    }

    async fn delete(&self, table: Table, id: i64) -> RepoResult<bool> {
        let result = sql::delete_by_id(&table, id)
            .build()
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn link_person(&self, booking_id: i64, person_id: i64) -> RepoResult<Option<i64>> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO bookings_persons (booking_id, person_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING RETURNING id",
        )
        .bind(booking_id)
        .bind(person_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(id)
    }

    async fn update_link(&self, id: i64, link: &BookingPerson) -> RepoResult<UpdateOutcome> {
        let result = sqlx::query("UPDATE bookings_persons SET booking_id = $2, person_id = $3 WHERE id = $1")
            .bind(id)
            .bind(link.booking_id)
            .bind(link.person_id)
            .execute(&self.pool)
            .await;
        sql::update_outcome(result)
    }

    async fn unlink_person(&self, booking_id: i64, person_id: i64) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM bookings_persons WHERE booking_id = $1 AND person_id = $2")
            .bind(booking_id)
            .bind(person_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
