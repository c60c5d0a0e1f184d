use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::info;
use wayfare_core::booking::BookingFields;
use wayfare_core::models::{BookingPerson, Leg, Person, Trip, User, UserUpdate, Vacation};
use wayfare_core::record::{Record, Row};
use wayfare_core::repository::UpdateOutcome;

use crate::error::AppError;
use crate::extract::AppJson;
use crate::state::AppState;

// ============================================================================
// Request Bodies
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct IdBody {
    pub id: i64,
}

/// `{"id": ..., <record fields>}`
#[derive(Debug, Deserialize)]
pub struct EditBody<R> {
    pub id: i64,
    #[serde(flatten)]
    pub record: R,
}

#[derive(Debug, Deserialize)]
pub struct UserBody {
    pub github_email: String,
    pub name: String,
    pub registered_at: Option<DateTime<Utc>>,
    pub last_login: Option<DateTime<Utc>>,
}

impl UserBody {
    /// Timestamps default to now on creation.
    fn into_user(self) -> User {
        let now = Utc::now();
        User {
            github_email: self.github_email,
            name: self.name,
            registered_at: self.registered_at.unwrap_or(now),
            last_login: self.last_login.unwrap_or(now),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UserEmailBody {
    pub github_email: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(record_routes::<Leg>("/leg"))
        .merge(record_routes::<Trip>("/trip"))
        .merge(record_routes::<Vacation>("/vacations"))
        .merge(record_routes::<Person>("/persons"))
        .route("/users/create", post(create_user))
        .route("/users/edit", post(edit_user))
        .route("/users/delete", post(delete_user))
        .route("/bookings/create", post(create_booking))
        .route("/bookings/edit", post(edit_booking))
        .route("/bookings/delete", post(delete_booking))
        .route("/bookings_persons/create", post(link_person))
        .route("/bookings_persons/edit", post(edit_link))
        .route("/bookings_persons/delete", post(unlink_person))
}

fn record_routes<R>(prefix: &str) -> Router<AppState>
where
    R: Record + DeserializeOwned + 'static,
{
    Router::new()
        .route(&format!("{}/create", prefix), post(create_record::<R>))
        .route(&format!("{}/edit", prefix), post(edit_record::<R>))
        .route(&format!("{}/delete", prefix), post(delete_record::<R>))
}

// ============================================================================
// Reference Records
// ============================================================================

async fn create_record<R>(
    State(state): State<AppState>,
    AppJson(record): AppJson<R>,
) -> Result<(StatusCode, Json<IdBody>), AppError>
where
    R: Record + DeserializeOwned + 'static,
{
    match state.records.insert_unique(Row::of(&record)).await? {
        Some(id) => {
            info!("Created {} row {}", R::TABLE.name, id);
            Ok((StatusCode::CREATED, Json(IdBody { id })))
        }
        None => Err(AppError::ConflictError(format!(
            "{} row with the same key already exists",
            R::TABLE.name
        ))),
    }
}

async fn edit_record<R>(
    State(state): State<AppState>,
    AppJson(body): AppJson<EditBody<R>>,
) -> Result<StatusCode, AppError>
where
    R: Record + DeserializeOwned + 'static,
{
    let outcome = state.records.update(body.id, Row::of(&body.record)).await?;
    updated(outcome, R::TABLE.name, body.id)
}

async fn delete_record<R>(
    State(state): State<AppState>,
    AppJson(body): AppJson<IdBody>,
) -> Result<StatusCode, AppError>
where
    R: Record + DeserializeOwned + 'static,
{
    if !state.records.delete(R::TABLE, body.id).await? {
        return Err(not_found(R::TABLE.name, body.id));
    }
    Ok(StatusCode::OK)
}

fn not_found(table: &str, id: i64) -> AppError {
    AppError::NotFoundError(format!("{} row {} not found", table, id))
}

fn updated(outcome: UpdateOutcome, table: &str, id: i64) -> Result<StatusCode, AppError> {
    match outcome {
        UpdateOutcome::Updated => Ok(StatusCode::OK),
        UpdateOutcome::NotFound => Err(not_found(table, id)),
        UpdateOutcome::KeyTaken => Err(AppError::ConflictError(format!(
            "another {} row already has the same key",
            table
        ))),
    }
}

// ============================================================================
// Users
// ============================================================================

async fn create_user(
    State(state): State<AppState>,
    AppJson(body): AppJson<UserBody>,
) -> Result<StatusCode, AppError> {
    let user = body.into_user();
    if !state.users.create_user(&user).await? {
        return Err(AppError::ConflictError(format!(
            "User {} already exists",
            user.github_email
        )));
    }
    Ok(StatusCode::CREATED)
}

async fn edit_user(
    State(state): State<AppState>,
    AppJson(update): AppJson<UserUpdate>,
) -> Result<StatusCode, AppError> {
    if !state.users.update_user(&update).await? {
        return Err(AppError::NotFoundError(format!("User {} not found", update.github_email)));
    }
    Ok(StatusCode::OK)
}

async fn delete_user(
    State(state): State<AppState>,
    AppJson(body): AppJson<UserEmailBody>,
) -> Result<StatusCode, AppError> {
    if !state.users.delete_user(&body.github_email).await? {
        return Err(AppError::NotFoundError(format!("User {} not found", body.github_email)));
    }
    Ok(StatusCode::OK)
}

// ============================================================================
// Flat Bookings
// ============================================================================

async fn create_booking(
    State(state): State<AppState>,
    AppJson(fields): AppJson<BookingFields>,
) -> Result<(StatusCode, Json<IdBody>), AppError> {
    match state.bookings.create_booking(&fields).await? {
        Some(id) => {
            info!("Created booking {} for {}", id, fields.details.registrar_email);
            Ok((StatusCode::CREATED, Json(IdBody { id })))
        }
        None => Err(AppError::ConflictError("Booking already exists".to_string())),
    }
}

async fn edit_booking(
    State(state): State<AppState>,
    AppJson(body): AppJson<EditBody<BookingFields>>,
) -> Result<StatusCode, AppError> {
    let outcome = state.bookings.update_booking(body.id, &body.record).await?;
    updated(outcome, "bookings", body.id)
}

async fn delete_booking(
    State(state): State<AppState>,
    AppJson(body): AppJson<IdBody>,
) -> Result<StatusCode, AppError> {
    if !state.bookings.delete_booking(body.id).await? {
        return Err(not_found("bookings", body.id));
    }
    Ok(StatusCode::OK)
}

// ============================================================================
// Booking <-> Person Links
// ============================================================================

async fn link_person(
    State(state): State<AppState>,
    AppJson(link): AppJson<BookingPerson>,
) -> Result<(StatusCode, Json<IdBody>), AppError> {
    match state.records.link_person(link.booking_id, link.person_id).await? {
        Some(id) => Ok((StatusCode::CREATED, Json(IdBody { id }))),
        None => Err(AppError::ConflictError("Booking person already exists".to_string())),
    }
}

/// `{"id": <link id>, "booking_id": ..., "person_id": ...}`
async fn edit_link(
    State(state): State<AppState>,
    AppJson(body): AppJson<EditBody<BookingPerson>>,
) -> Result<StatusCode, AppError> {
    let outcome = state.records.update_link(body.id, &body.record).await?;
    updated(outcome, "bookings_persons", body.id)
}

async fn unlink_person(
    State(state): State<AppState>,
    AppJson(link): AppJson<BookingPerson>,
) -> Result<StatusCode, AppError> {
    if !state.records.unlink_person(link.booking_id, link.person_id).await? {
        return Err(AppError::NotFoundError("Booking person not found".to_string()));
    }
    Ok(StatusCode::OK)
}
