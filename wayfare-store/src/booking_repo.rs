use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;
use wayfare_core::booking::{BookingDetails, BookingFields, BookingKey, BookingReferences, BookingRow};
use wayfare_core::record::{Row, Table, Value};
use wayfare_core::repository::{BookingStore, BookingTransaction, RepoResult, UpdateOutcome};

use crate::sql;

const BOOKING_COLUMNS: &str = "id, registrar_email, vacation_day_count, total_days, total_price, \
     price_per_pax, start_date, end_date, origin, destination, \
     outbound_trip_id, inbound_trip_id, vacation_id";

pub struct PgBookingStore {
    pool: PgPool,
}

impl PgBookingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal struct for type-safe querying
#[derive(sqlx::FromRow)]
struct BookingRecord {
    id: i64,
    registrar_email: String,
    vacation_day_count: i64,
    total_days: i64,
    total_price: i64,
    price_per_pax: Option<i64>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    origin: Option<String>,
    destination: Option<String>,
    outbound_trip_id: Option<i64>,
    inbound_trip_id: Option<i64>,
    vacation_id: Option<i64>,
}

impl From<BookingRecord> for BookingRow {
    fn from(r: BookingRecord) -> Self {
        BookingRow {
            id: r.id,
            details: BookingDetails {
                registrar_email: r.registrar_email,
                vacation_day_count: r.vacation_day_count,
                total_days: r.total_days,
                total_price: r.total_price,
                price_per_pax: r.price_per_pax,
                start_date: r.start_date,
                end_date: r.end_date,
                origin: r.origin,
                destination: r.destination,
            },
            outbound_trip_id: r.outbound_trip_id,
            inbound_trip_id: r.inbound_trip_id,
            vacation_id: r.vacation_id,
        }
    }
}

/// A booking transaction on one pooled connection; rolled back when dropped
/// without `commit`.
pub struct PgBookingTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl BookingTransaction for PgBookingTransaction {
    async fn find_booking(&mut self, key: &BookingKey) -> RepoResult<Option<i64>> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT id FROM bookings
            WHERE registrar_email = $1 AND vacation_day_count = $2 AND total_days = $3 AND total_price = $4
            "#,
        )
        .bind(&key.registrar_email)
        .bind(key.vacation_day_count)
        .bind(key.total_days)
        .bind(key.total_price)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(id)
    }

    async fn insert_booking(&mut self, details: &BookingDetails) -> RepoResult<Option<i64>> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO bookings (registrar_email, vacation_day_count, total_days, total_price,
                                  price_per_pax, start_date, end_date, origin, destination)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (registrar_email, vacation_day_count, total_days, total_price) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(&details.registrar_email)
        .bind(details.vacation_day_count)
        .bind(details.total_days)
        .bind(details.total_price)
        .bind(details.price_per_pax)
        .bind(details.start_date)
        .bind(details.end_date)
        .bind(&details.origin)
        .bind(&details.destination)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(id)
    }

    async fn attach_references(
        &mut self,
        booking_id: i64,
        refs: &BookingReferences,
    ) -> RepoResult<()> {
        let result = sqlx::query(
            "UPDATE bookings SET outbound_trip_id = $1, inbound_trip_id = $2, vacation_id = $3 WHERE id = $4",
        )
        .bind(refs.outbound_trip_id)
        .bind(refs.inbound_trip_id)
        .bind(refs.vacation_id)
        .bind(booking_id)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(format!("booking {} does not exist", booking_id).into());
        }
        Ok(())
    }

    async fn link_person(&mut self, booking_id: i64, person_id: i64) -> RepoResult<bool> {
        let result = sqlx::query(
            "INSERT INTO bookings_persons (booking_id, person_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(booking_id)
        .bind(person_id)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn resolve(&mut self, row: Row) -> RepoResult<i64> {
        let inserted = sql::insert_unless_exists(&row)
            .build_query_scalar::<i64>()
            .fetch_optional(&mut *self.tx)
            .await?;
        if let Some(id) = inserted {
            debug!(table = row.table.name, id, "Inserted reference row");
            return Ok(id);
        }

        let id = sql::select_id_by_key(&row)
            .build_query_scalar::<i64>()
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(id)
    }

    async fn fetch(&mut self, table: Table, id: i64) -> RepoResult<Option<Vec<Value>>> {
        let row = sql::select_by_id(&table, id)
            .build()
            .fetch_optional(&mut *self.tx)
            .await?;
        match row {
            Some(row) => Ok(Some(sql::decode_values(&table, &row)?)),
            None => Ok(None),
        }
    }

    async fn fetch_booking(&mut self, id: i64) -> RepoResult<Option<BookingRow>> {
        let record = sqlx::query_as::<_, BookingRecord>(&format!(
            "SELECT {} FROM bookings WHERE id = $1",
            BOOKING_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(record.map(BookingRow::from))
    }

    async fn fetch_booking_person_ids(&mut self, booking_id: i64) -> RepoResult<Vec<i64>> {
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT person_id FROM bookings_persons WHERE booking_id = $1 ORDER BY id",
        )
        .bind(booking_id)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(ids)
    }

    async fn commit(self: Box<Self>) -> RepoResult<()> {
        let PgBookingTransaction { tx } = *self;
        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl BookingStore for PgBookingStore {
    async fn begin(&self) -> RepoResult<Box<dyn BookingTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgBookingTransaction { tx }))
    }

    async fn begin_read_only(&self) -> RepoResult<Box<dyn BookingTransaction>> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;
        Ok(Box::new(PgBookingTransaction { tx }))
    }

    async fn list_bookings(&self, registrar_email: &str) -> RepoResult<Vec<BookingRow>> {
        let records = sqlx::query_as::<_, BookingRecord>(&format!(
            "SELECT {} FROM bookings WHERE registrar_email = $1 ORDER BY id",
            BOOKING_COLUMNS
        ))
        .bind(registrar_email)
        .fetch_all(&self.pool)
        .await?;
        Ok(records.into_iter().map(BookingRow::from).collect())
    }

    async fn create_booking(&self, fields: &BookingFields) -> RepoResult<Option<i64>> {
        let details = &fields.details;
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO bookings (registrar_email, vacation_day_count, total_days, total_price,
                                  price_per_pax, start_date, end_date, origin, destination,
                                  outbound_trip_id, inbound_trip_id, vacation_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (registrar_email, vacation_day_count, total_days, total_price) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(&details.registrar_email)
        .bind(details.vacation_day_count)
        .bind(details.total_days)
        .bind(details.total_price)
        .bind(details.price_per_pax)
        .bind(details.start_date)
        .bind(details.end_date)
        .bind(&details.origin)
        .bind(&details.destination)
        .bind(fields.outbound_trip_id)
        .bind(fields.inbound_trip_id)
        .bind(fields.vacation_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(id)
    }

    async fn update_booking(&self, id: i64, fields: &BookingFields) -> RepoResult<UpdateOutcome> {
        let details = &fields.details;
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET registrar_email = $2, vacation_day_count = $3, total_days = $4, total_price = $5,
                price_per_pax = $6, start_date = $7, end_date = $8, origin = $9, destination = $10,
                outbound_trip_id = $11, inbound_trip_id = $12, vacation_id = $13
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&details.registrar_email)
        .bind(details.vacation_day_count)
        .bind(details.total_days)
        .bind(details.total_price)
        .bind(details.price_per_pax)
        .bind(details.start_date)
        .bind(details.end_date)
        .bind(&details.origin)
        .bind(&details.destination)
        .bind(fields.outbound_trip_id)
        .bind(fields.inbound_trip_id)
        .bind(fields.vacation_id)
        .execute(&self.pool)
        .await;
        sql::update_outcome(result)
    }

    async fn delete_booking(&self, id: i64) -> RepoResult<bool> {
        // bookings_persons rows go with it (ON DELETE CASCADE)
        let result = sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
