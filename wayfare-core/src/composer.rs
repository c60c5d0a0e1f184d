use std::sync::Arc;

use tracing::{debug, info};

use crate::booking::{BookingReferences, ComplexBooking, TripPayload};
use crate::dedup;
use crate::repository::{BookingStore, BookingTransaction};
use crate::{CoreError, CoreResult};

/// Writes a nested booking and all of its reference data in one transaction.
pub struct BookingComposer {
    store: Arc<dyn BookingStore>,
}

impl BookingComposer {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }

    /// Creates the booking and returns its id. Nothing is persisted unless every
    /// step succeeds; an existing booking with the same
    /// (registrar_email, vacation_day_count, total_days, total_price) is a conflict.
    pub async fn create_complex_booking(&self, booking: &ComplexBooking) -> CoreResult<i64> {
        let mut tx = self.store.begin().await?;
        let key = booking.details.key();

        if let Some(existing) = tx.find_booking(&key).await? {
            debug!(booking_id = existing, "Duplicate booking submission");
            return Err(CoreError::ConflictError("Booking already exists".to_string()));
        }

        let booking_id = tx
            .insert_booking(&booking.details)
            .await?
            .ok_or_else(|| CoreError::ConflictError("Booking already exists".to_string()))?;
        debug!(booking_id, "Inserted booking row");

        for person in &booking.persons {
            let person_id = dedup::resolve(tx.as_mut(), person).await?;
            if !tx.link_person(booking_id, person_id).await? {
                debug!(booking_id, person_id, "Person already linked");
            }
        }

        let vacation_id = dedup::resolve(tx.as_mut(), &booking.vacation).await?;

        let outbound_legs = resolve_legs(tx.as_mut(), &booking.outbound_trip).await?;
        let inbound_legs = resolve_legs(tx.as_mut(), &booking.inbound_trip).await?;
        let outbound_trip_id =
            dedup::resolve(tx.as_mut(), &booking.outbound_trip.to_trip(outbound_legs)).await?;
        let inbound_trip_id =
            dedup::resolve(tx.as_mut(), &booking.inbound_trip.to_trip(inbound_legs)).await?;

        tx.attach_references(
            booking_id,
            &BookingReferences {
                outbound_trip_id,
                inbound_trip_id,
                vacation_id,
            },
        )
        .await?;
        tx.commit().await?;

        info!(
            booking_id,
            persons = booking.persons.len(),
            "Complex booking created for {}",
            booking.details.registrar_email
        );
        Ok(booking_id)
    }
}

/// Resolves a trip's legs in departure -> trunk -> arrival order.
async fn resolve_legs(tx: &mut dyn BookingTransaction, trip: &TripPayload) -> CoreResult<[i64; 3]> {
    let mut leg_ids = [0i64; 3];
    for (slot, leg) in leg_ids.iter_mut().zip(trip.legs()) {
        *slot = dedup::resolve(tx, leg).await?;
    }
    Ok(leg_ids)
}
