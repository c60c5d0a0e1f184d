//! In-memory store with the same transactional contract as the PostgreSQL backend.
//!
//! Transactions are serialized behind an async mutex and stage their writes on a
//! copy of the state; `commit` swaps the copy in, dropping the transaction
//! discards it. Faults can be injected to fail the Nth insert into a table.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::booking::{BookingDetails, BookingFields, BookingKey, BookingReferences, BookingRow};
use crate::models::{BookingPerson, User, UserUpdate};
use crate::record::{Row, Table, Value};
use crate::repository::{
    BookingStore, BookingTransaction, RecordStore, RepoResult, UpdateOutcome, UserRepository,
};

#[derive(Debug, Clone, Default)]
struct StoredRow {
    id: i64,
    values: Vec<Value>,
}

#[derive(Debug, Clone, Copy)]
struct StoredLink {
    id: i64,
    link: BookingPerson,
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    tables: HashMap<&'static str, Vec<StoredRow>>,
    next_ids: HashMap<&'static str, i64>,
    bookings: Vec<BookingRow>,
    booking_persons: Vec<StoredLink>,
    users: Vec<User>,
}

impl MemoryState {
    fn next_id(&mut self, table: &'static str) -> i64 {
        let next = self.next_ids.entry(table).or_insert(0);
        *next += 1;
        *next
    }

    fn find(&self, row: &Row) -> Option<i64> {
        self.tables
            .get(row.table.name)?
            .iter()
            .find(|stored| row.same_key(&stored.values))
            .map(|stored| stored.id)
    }

    fn insert(&mut self, row: Row) -> i64 {
        let id = self.next_id(row.table.name);
        self.tables.entry(row.table.name).or_default().push(StoredRow {
            id,
            values: row.values,
        });
        id
    }

    fn link(&mut self, booking_id: i64, person_id: i64) -> Option<i64> {
        let link = BookingPerson {
            booking_id,
            person_id,
        };
        if self.booking_persons.iter().any(|stored| stored.link == link) {
            return None;
        }
        let id = self.next_id("bookings_persons");
        self.booking_persons.push(StoredLink { id, link });
        Some(id)
    }

    fn booking_key_taken(&self, key: &BookingKey, except: Option<i64>) -> bool {
        self.bookings
            .iter()
            .any(|b| Some(b.id) != except && key.matches(&b.details))
    }
}

#[derive(Debug, Clone)]
struct Fault {
    table: &'static str,
    nth: usize,
    seen: usize,
}

type Faults = Arc<StdMutex<Option<Fault>>>;

fn check_fault(faults: &Faults, table: &'static str) -> RepoResult<()> {
    let mut guard = faults.lock().map_err(|_| "fault registry poisoned")?;
    if let Some(fault) = guard.as_mut() {
        if fault.table == table {
            fault.seen += 1;
            if fault.seen == fault.nth {
                *guard = None;
                return Err(format!("injected failure inserting into {}", table).into());
            }
        }
    }
    Ok(())
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    faults: Faults,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the `nth` insert (1-based) into `table` fail, once.
    pub fn fail_nth_insert(&self, table: &'static str, nth: usize) {
        if let Ok(mut guard) = self.faults.lock() {
            *guard = Some(Fault { table, nth, seen: 0 });
        }
    }

    /// Committed row count for a record table, `bookings` or `bookings_persons`.
    pub async fn row_count(&self, table: &str) -> usize {
        let state = self.state.lock().await;
        match table {
            "bookings" => state.bookings.len(),
            "bookings_persons" => state.booking_persons.len(),
            "users" => state.users.len(),
            other => state.tables.get(other).map_or(0, Vec::len),
        }
    }
}

pub struct MemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    staged: MemoryState,
    read_only: bool,
    faults: Faults,
}

impl MemoryTransaction {
    fn writable(&mut self) -> RepoResult<&mut MemoryState> {
        if self.read_only {
            return Err("cannot write in a read-only transaction".into());
        }
        Ok(&mut self.staged)
    }
}

#[async_trait]
impl BookingTransaction for MemoryTransaction {
    async fn find_booking(&mut self, key: &BookingKey) -> RepoResult<Option<i64>> {
        Ok(self
            .staged
            .bookings
            .iter()
            .find(|b| key.matches(&b.details))
            .map(|b| b.id))
    }

    async fn insert_booking(&mut self, details: &BookingDetails) -> RepoResult<Option<i64>> {
        check_fault(&self.faults, "bookings")?;
        let state = self.writable()?;
        if state.booking_key_taken(&details.key(), None) {
            return Ok(None);
        }
        let id = state.next_id("bookings");
        state.bookings.push(BookingRow::new(id, details.clone()));
        Ok(Some(id))
    }

    async fn attach_references(
        &mut self,
        booking_id: i64,
        refs: &BookingReferences,
    ) -> RepoResult<()> {
        let state = self.writable()?;
        let booking = state
            .bookings
            .iter_mut()
            .find(|b| b.id == booking_id)
            .ok_or_else(|| format!("booking {} does not exist", booking_id))?;
        booking.attach(refs);
        Ok(())
    }

    async fn link_person(&mut self, booking_id: i64, person_id: i64) -> RepoResult<bool> {
        Ok(self.writable()?.link(booking_id, person_id).is_some())
    }

    async fn resolve(&mut self, row: Row) -> RepoResult<i64> {
        if let Some(id) = self.staged.find(&row) {
            return Ok(id);
        }
        check_fault(&self.faults, row.table.name)?;
        Ok(self.writable()?.insert(row))
    }

    async fn fetch(&mut self, table: Table, id: i64) -> RepoResult<Option<Vec<Value>>> {
        Ok(self
            .staged
            .tables
            .get(table.name)
            .and_then(|rows| rows.iter().find(|r| r.id == id))
            .map(|r| r.values.clone()))
    }

    async fn fetch_booking(&mut self, id: i64) -> RepoResult<Option<BookingRow>> {
        Ok(self.staged.bookings.iter().find(|b| b.id == id).cloned())
    }

    async fn fetch_booking_person_ids(&mut self, booking_id: i64) -> RepoResult<Vec<i64>> {
        Ok(self
            .staged
            .booking_persons
            .iter()
            .filter(|stored| stored.link.booking_id == booking_id)
            .map(|stored| stored.link.person_id)
            .collect())
    }

    async fn commit(self: Box<Self>) -> RepoResult<()> {
        let MemoryTransaction {
            mut guard,
            staged,
            read_only,
            ..
        } = *self;
        if !read_only {
            *guard = staged;
        }
        Ok(())
    }
}

impl MemoryStore {
    async fn open(&self, read_only: bool) -> MemoryTransaction {
        let guard = self.state.clone().lock_owned().await;
        let staged = guard.clone();
        MemoryTransaction {
            guard,
            staged,
            read_only,
            faults: self.faults.clone(),
        }
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn begin(&self) -> RepoResult<Box<dyn BookingTransaction>> {
        Ok(Box::new(self.open(false).await))
    }

    async fn begin_read_only(&self) -> RepoResult<Box<dyn BookingTransaction>> {
        Ok(Box::new(self.open(true).await))
    }

    async fn list_bookings(&self, registrar_email: &str) -> RepoResult<Vec<BookingRow>> {
        let state = self.state.lock().await;
        Ok(state
            .bookings
            .iter()
            .filter(|b| b.details.registrar_email == registrar_email)
            .cloned()
            .collect())
    }

    async fn delete_booking(&self, id: i64) -> RepoResult<bool> {
        let mut state = self.state.lock().await;
        let before = state.bookings.len();
        state.bookings.retain(|b| b.id != id);
        if state.bookings.len() == before {
            return Ok(false);
        }
        state.booking_persons.retain(|stored| stored.link.booking_id != id);
        Ok(true)
    }

    async fn create_booking(&self, fields: &BookingFields) -> RepoResult<Option<i64>> {
        let mut state = self.state.lock().await;
        if state.booking_key_taken(&fields.details.key(), None) {
            return Ok(None);
        }
        check_fault(&self.faults, "bookings")?;
        let id = state.next_id("bookings");
        state.bookings.push(BookingRow::with_fields(id, fields.clone()));
        Ok(Some(id))
    }

    async fn update_booking(&self, id: i64, fields: &BookingFields) -> RepoResult<UpdateOutcome> {
        let mut state = self.state.lock().await;
        if !state.bookings.iter().any(|b| b.id == id) {
            return Ok(UpdateOutcome::NotFound);
        }
        if state.booking_key_taken(&fields.details.key(), Some(id)) {
            return Ok(UpdateOutcome::KeyTaken);
        }
        if let Some(booking) = state.bookings.iter_mut().find(|b| b.id == id) {
            *booking = BookingRow::with_fields(id, fields.clone());
        }
        Ok(UpdateOutcome::Updated)
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert_unique(&self, row: Row) -> RepoResult<Option<i64>> {
        let mut state = self.state.lock().await;
        if state.find(&row).is_some() {
            return Ok(None);
        }
        check_fault(&self.faults, row.table.name)?;
        Ok(Some(state.insert(row)))
    }

    async fn update(&self, id: i64, row: Row) -> RepoResult<UpdateOutcome> {
        let mut state = self.state.lock().await;
        let Some(rows) = state.tables.get_mut(row.table.name) else {
            return Ok(UpdateOutcome::NotFound);
        };
        if rows.iter().any(|r| r.id != id && row.same_key(&r.values)) {
            return Ok(UpdateOutcome::KeyTaken);
        }
        match rows.iter_mut().find(|r| r.id == id) {
            Some(stored) => {
                stored.values = row.values;
                Ok(UpdateOutcome::Updated)
            }
            None => Ok(UpdateOutcome::NotFound),
        }
    }

    async fn delete(&self, table: Table, id: i64) -> RepoResult<bool> {
        let mut state = self.state.lock().await;
        let Some(rows) = state.tables.get_mut(table.name) else {
            return Ok(false);
        };
        let before = rows.len();
        rows.retain(|r| r.id != id);
        Ok(rows.len() != before)
    }

    async fn link_person(&self, booking_id: i64, person_id: i64) -> RepoResult<Option<i64>> {
        let mut state = self.state.lock().await;
        Ok(state.link(booking_id, person_id))
    }

    async fn update_link(&self, id: i64, link: &BookingPerson) -> RepoResult<UpdateOutcome> {
        let mut state = self.state.lock().await;
        if !state.booking_persons.iter().any(|stored| stored.id == id) {
            return Ok(UpdateOutcome::NotFound);
        }
        if state
            .booking_persons
            .iter()
            .any(|stored| stored.id != id && stored.link == *link)
        {
            return Ok(UpdateOutcome::KeyTaken);
        }
        if let Some(stored) = state.booking_persons.iter_mut().find(|stored| stored.id == id) {
            stored.link = *link;
        }
        Ok(UpdateOutcome::Updated)
    }

    async fn unlink_person(&self, booking_id: i64, person_id: i64) -> RepoResult<bool> {
        let mut state = self.state.lock().await;
        let before = state.booking_persons.len();
        state.booking_persons.retain(|stored| {
            stored.link.booking_id != booking_id || stored.link.person_id != person_id
        });
        Ok(state.booking_persons.len() != before)
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, user: &User) -> RepoResult<bool> {
        let mut state = self.state.lock().await;
        if state.users.iter().any(|u| u.github_email == user.github_email) {
            return Ok(false);
        }
        state.users.push(user.clone());
        Ok(true)
    }

    async fn update_user(&self, update: &UserUpdate) -> RepoResult<bool> {
        let mut state = self.state.lock().await;
        match state
            .users
            .iter_mut()
            .find(|u| u.github_email == update.github_email)
        {
            Some(existing) => {
                existing.name = update.name.clone();
                if let Some(registered_at) = update.registered_at {
                    existing.registered_at = registered_at;
                }
                if let Some(last_login) = update.last_login {
                    existing.last_login = last_login;
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_user(&self, github_email: &str) -> RepoResult<bool> {
        let mut state = self.state.lock().await;
        let before = state.users.len();
        state.users.retain(|u| u.github_email != github_email);
        Ok(state.users.len() != before)
    }
}
