use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{Leg, Person, Trip, Vacation};

// ============================================================================
// Complex Booking Schema
// ============================================================================
// Shared by the composer (request) and the reader (response) so both sides
// always agree on the nested shape.

/// One directional journey as submitted by clients: three legs and a price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripPayload {
    pub departure_feeder: Leg,
    pub trunk: Leg,
    pub arrival_feeder: Leg,
    pub total_price: i64,
}

impl TripPayload {
    /// Legs in departure -> trunk -> arrival order.
    pub fn legs(&self) -> [&Leg; 3] {
        [&self.departure_feeder, &self.trunk, &self.arrival_feeder]
    }

    pub fn to_trip(&self, leg_ids: [i64; 3]) -> Trip {
        Trip {
            departure_feeder_id: leg_ids[0],
            trunk_id: leg_ids[1],
            arrival_feeder_id: leg_ids[2],
            total_price: self.total_price,
        }
    }
}

/// Scalar columns of a booking row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingDetails {
    pub registrar_email: String,
    pub vacation_day_count: i64,
    pub total_days: i64,
    pub total_price: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_per_pax: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
}

impl BookingDetails {
    pub fn key(&self) -> BookingKey {
        BookingKey {
            registrar_email: self.registrar_email.clone(),
            vacation_day_count: self.vacation_day_count,
            total_days: self.total_days,
            total_price: self.total_price,
        }
    }
}

/// Fields whose equality makes two bookings the same submission.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BookingKey {
    pub registrar_email: String,
    pub vacation_day_count: i64,
    pub total_days: i64,
    pub total_price: i64,
}

impl BookingKey {
    pub fn matches(&self, details: &BookingDetails) -> bool {
        self.registrar_email == details.registrar_email
            && self.vacation_day_count == details.vacation_day_count
            && self.total_days == details.total_days
            && self.total_price == details.total_price
    }
}

/// The nested booking payload accepted by create-complex and returned by get-complex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexBooking {
    #[serde(flatten)]
    pub details: BookingDetails,
    pub outbound_trip: TripPayload,
    pub inbound_trip: TripPayload,
    pub vacation: Vacation,
    #[serde(default)]
    pub persons: Vec<Person>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexBookingView {
    pub booking_id: i64,
    #[serde(flatten)]
    pub booking: ComplexBooking,
}

// ============================================================================
// Stored Booking Rows
// ============================================================================

/// Foreign keys filled in once the booking's children are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingReferences {
    pub outbound_trip_id: i64,
    pub inbound_trip_id: i64,
    pub vacation_id: i64,
}

/// A booking as stored: scalar columns plus (possibly unset) foreign keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRow {
    pub id: i64,
    #[serde(flatten)]
    pub details: BookingDetails,
    #[serde(rename = "outbound_trip")]
    pub outbound_trip_id: Option<i64>,
    #[serde(rename = "inbound_trip")]
    pub inbound_trip_id: Option<i64>,
    #[serde(rename = "vacation")]
    pub vacation_id: Option<i64>,
}

impl BookingRow {
    pub fn new(id: i64, details: BookingDetails) -> Self {
        Self {
            id,
            details,
            outbound_trip_id: None,
            inbound_trip_id: None,
            vacation_id: None,
        }
    }

    pub fn with_fields(id: i64, fields: BookingFields) -> Self {
        Self {
            id,
            details: fields.details,
            outbound_trip_id: fields.outbound_trip_id,
            inbound_trip_id: fields.inbound_trip_id,
            vacation_id: fields.vacation_id,
        }
    }

    pub fn attach(&mut self, refs: &BookingReferences) {
        self.outbound_trip_id = Some(refs.outbound_trip_id);
        self.inbound_trip_id = Some(refs.inbound_trip_id);
        self.vacation_id = Some(refs.vacation_id);
    }
}

/// A booking row written as-is through the flat booking endpoints; the
/// referenced trips and vacation must already exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingFields {
    #[serde(flatten)]
    pub details: BookingDetails,
    #[serde(default, rename = "outbound_trip")]
    pub outbound_trip_id: Option<i64>,
    #[serde(default, rename = "inbound_trip")]
    pub inbound_trip_id: Option<i64>,
    #[serde(default, rename = "vacation")]
    pub vacation_id: Option<i64>,
}
