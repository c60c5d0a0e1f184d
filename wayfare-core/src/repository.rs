use async_trait::async_trait;

use crate::booking::{BookingDetails, BookingFields, BookingKey, BookingReferences, BookingRow};
use crate::models::{BookingPerson, User, UserUpdate};
use crate::record::{Row, Table, Value};

pub type RepoError = Box<dyn std::error::Error + Send + Sync>;
pub type RepoResult<T> = Result<T, RepoError>;

/// Result of an update addressed by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    NotFound,
    /// Another row already holds the new business key; nothing was written.
    KeyTaken,
}

/// One store-level transaction. Dropping it without `commit` rolls it back.
#[async_trait]
pub trait BookingTransaction: Send {
    /// Id of the booking sharing `key`, if any.
    async fn find_booking(&mut self, key: &BookingKey) -> RepoResult<Option<i64>>;

    /// Inserts the booking's scalar columns with unset foreign keys.
    /// Returns `None` when a booking with the same key already exists.
    async fn insert_booking(&mut self, details: &BookingDetails) -> RepoResult<Option<i64>>;

    async fn attach_references(
        &mut self,
        booking_id: i64,
        refs: &BookingReferences,
    ) -> RepoResult<()>;

    /// Links a person to a booking. Linking an already-linked pair is a no-op
    /// and returns `false`.
    async fn link_person(&mut self, booking_id: i64, person_id: i64) -> RepoResult<bool>;

    /// Returns the id of the row sharing `row`'s business key, inserting it first
    /// when no such row exists.
    async fn resolve(&mut self, row: Row) -> RepoResult<i64>;

    /// Column values of the row with `id`, in `table.columns` order.
    async fn fetch(&mut self, table: Table, id: i64) -> RepoResult<Option<Vec<Value>>>;

    async fn fetch_booking(&mut self, id: i64) -> RepoResult<Option<BookingRow>>;

    /// Person ids linked to a booking, in link order.
    async fn fetch_booking_person_ids(&mut self, booking_id: i64) -> RepoResult<Vec<i64>>;

    async fn commit(self: Box<Self>) -> RepoResult<()>;
}

/// Repository trait for booking data access
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn begin(&self) -> RepoResult<Box<dyn BookingTransaction>>;

    /// Opens a snapshot transaction that rejects writes.
    async fn begin_read_only(&self) -> RepoResult<Box<dyn BookingTransaction>>;

    async fn list_bookings(&self, registrar_email: &str) -> RepoResult<Vec<BookingRow>>;

    /// Inserts a flat booking row as given. Returns `None` when a booking with
    /// the same key already exists.
    async fn create_booking(&self, fields: &BookingFields) -> RepoResult<Option<i64>>;

    async fn update_booking(&self, id: i64, fields: &BookingFields) -> RepoResult<UpdateOutcome>;

    /// Deletes a booking and its person links. Returns `false` if it did not exist.
    async fn delete_booking(&self, id: i64) -> RepoResult<bool>;
}

/// Repository trait for single-table record access
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Inserts `row` unless one with the same business key exists (`None`).
    async fn insert_unique(&self, row: Row) -> RepoResult<Option<i64>>;

    async fn update(&self, id: i64, row: Row) -> RepoResult<UpdateOutcome>;

    async fn delete(&self, table: Table, id: i64) -> RepoResult<bool>;

    /// Returns the new link id, or `None` when the pair is already linked.
    async fn link_person(&self, booking_id: i64, person_id: i64) -> RepoResult<Option<i64>>;

    /// Re-points the link with `id` at another booking/person pair.
    async fn update_link(&self, id: i64, link: &BookingPerson) -> RepoResult<UpdateOutcome>;

    async fn unlink_person(&self, booking_id: i64, person_id: i64) -> RepoResult<bool>;
}

/// Repository trait for user accounts
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Returns `false` when a user with the same email exists.
    async fn create_user(&self, user: &User) -> RepoResult<bool>;

    /// Timestamps left unset in `update` keep their stored values.
    async fn update_user(&self, update: &UserUpdate) -> RepoResult<bool>;

    async fn delete_user(&self, github_email: &str) -> RepoResult<bool>;
}
