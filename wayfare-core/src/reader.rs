use std::sync::Arc;

use tracing::debug;

use crate::booking::{ComplexBooking, ComplexBookingView, TripPayload};
use crate::dedup;
use crate::models::{Leg, Person, Trip, Vacation};
use crate::record::Record;
use crate::repository::{BookingStore, BookingTransaction};
use crate::{CoreError, CoreResult};

/// Rebuilds the nested booking representation by following foreign keys.
pub struct BookingReader {
    store: Arc<dyn BookingStore>,
}

impl BookingReader {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }

    /// A missing booking is `NotFoundError`; a missing child or an unset
    /// foreign key is `BrokenReference`.
    pub async fn get_complex_booking(&self, booking_id: i64) -> CoreResult<ComplexBookingView> {
        let mut tx = self.store.begin_read_only().await?;

        let row = tx
            .fetch_booking(booking_id)
            .await?
            .ok_or_else(|| CoreError::NotFoundError(format!("Booking {} not found", booking_id)))?;

        let outbound_trip = read_trip(tx.as_mut(), booking_id, row.outbound_trip_id).await?;
        let inbound_trip = read_trip(tx.as_mut(), booking_id, row.inbound_trip_id).await?;
        let vacation: Vacation = require(tx.as_mut(), booking_id, row.vacation_id).await?;

        let mut persons = Vec::new();
        for person_id in tx.fetch_booking_person_ids(booking_id).await? {
            persons.push(require::<Person>(tx.as_mut(), booking_id, Some(person_id)).await?);
        }
        tx.commit().await?;

        debug!(booking_id, persons = persons.len(), "Loaded complex booking");
        Ok(ComplexBookingView {
            booking_id,
            booking: ComplexBooking {
                details: row.details,
                outbound_trip,
                inbound_trip,
                vacation,
                persons,
            },
        })
    }
}

async fn require<R: Record>(
    tx: &mut dyn BookingTransaction,
    booking_id: i64,
    id: Option<i64>,
) -> CoreResult<R> {
    let broken = |detail: String| {
        CoreError::BrokenReference(format!("booking {}: {}", booking_id, detail))
    };
    let id = id.ok_or_else(|| broken(format!("{} reference is unset", R::TABLE.name)))?;
    dedup::load(tx, id)
        .await?
        .ok_or_else(|| broken(format!("{} row {} is missing", R::TABLE.name, id)))
}

async fn read_trip(
    tx: &mut dyn BookingTransaction,
    booking_id: i64,
    trip_id: Option<i64>,
) -> CoreResult<TripPayload> {
    let trip: Trip = require(tx, booking_id, trip_id).await?;
    let departure_feeder: Leg = require(tx, booking_id, Some(trip.departure_feeder_id)).await?;
    let trunk: Leg = require(tx, booking_id, Some(trip.trunk_id)).await?;
    let arrival_feeder: Leg = require(tx, booking_id, Some(trip.arrival_feeder_id)).await?;
    Ok(TripPayload {
        departure_feeder,
        trunk,
        arrival_feeder,
        total_price: trip.total_price,
    })
}
