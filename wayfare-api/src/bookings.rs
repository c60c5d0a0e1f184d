use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use wayfare_core::booking::{BookingRow, ComplexBooking, ComplexBookingView};

use crate::error::AppError;
use crate::extract::AppJson;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct BookingIdBody {
    pub booking_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct RegistrarBody {
    pub email: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/bookings/create-complex", post(create_complex_booking))
        .route(
            "/api/bookings/get-complex",
            get(get_complex_booking).post(get_complex_booking),
        )
        .route("/api/bookings/delete", post(delete_booking))
        .route("/api/bookings/get-all", post(list_bookings))
}

async fn create_complex_booking(
    State(state): State<AppState>,
    AppJson(booking): AppJson<ComplexBooking>,
) -> Result<(StatusCode, Json<BookingIdBody>), AppError> {
    let booking_id = state.composer().create_complex_booking(&booking).await?;
    Ok((StatusCode::CREATED, Json(BookingIdBody { booking_id })))
}

async fn get_complex_booking(
    State(state): State<AppState>,
    AppJson(body): AppJson<BookingIdBody>,
) -> Result<Json<ComplexBookingView>, AppError> {
    let view = state.reader().get_complex_booking(body.booking_id).await?;
    Ok(Json(view))
}

async fn delete_booking(
    State(state): State<AppState>,
    AppJson(body): AppJson<BookingIdBody>,
) -> Result<StatusCode, AppError> {
    if !state.bookings.delete_booking(body.booking_id).await? {
        return Err(AppError::NotFoundError(format!(
            "Booking {} not found",
            body.booking_id
        )));
    }
    info!("Booking deleted: {}", body.booking_id);
    Ok(StatusCode::NO_CONTENT)
}

async fn list_bookings(
    State(state): State<AppState>,
    AppJson(body): AppJson<RegistrarBody>,
) -> Result<Json<Vec<BookingRow>>, AppError> {
    let bookings = state.bookings.list_bookings(&body.email).await?;
    Ok(Json(bookings))
}
