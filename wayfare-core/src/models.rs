use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wayfare_shared::Masked;

use crate::record::{Column, ColumnKind, Record, Table, Value, ValueReader};
use crate::CoreResult;

// ============================================================================
// Reference Records
// ============================================================================

/// One directional segment of travel (feeder or trunk).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leg {
    #[serde(rename = "type")]
    pub leg_type: String,
    pub budget: String,
    pub origin_city: String,
    pub destination_city: String,
    pub price: i64,
    #[serde(default)]
    pub distance_from_previous: f64,
    #[serde(default)]
    pub distance_to_next: f64,
}

impl Record for Leg {
    const TABLE: Table = Table {
        name: "legs",
        columns: &[
            Column::key("leg_type", ColumnKind::Text),
            Column::key("budget", ColumnKind::Text),
            Column::key("origin_city", ColumnKind::Text),
            Column::key("destination_city", ColumnKind::Text),
            Column::key("price", ColumnKind::Integer),
            Column::attribute("distance_from_previous", ColumnKind::Real),
            Column::attribute("distance_to_next", ColumnKind::Real),
        ],
    };

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.leg_type.clone()),
            Value::Text(self.budget.clone()),
            Value::Text(self.origin_city.clone()),
            Value::Text(self.destination_city.clone()),
            Value::Integer(self.price),
            Value::Real(self.distance_from_previous),
            Value::Real(self.distance_to_next),
        ]
    }

    fn from_values(values: Vec<Value>) -> CoreResult<Self> {
        let mut r = ValueReader::new(Self::TABLE.name, values);
        Ok(Self {
            leg_type: r.text()?,
            budget: r.text()?,
            origin_city: r.text()?,
            destination_city: r.text()?,
            price: r.integer()?,
            distance_from_previous: r.real()?,
            distance_to_next: r.real()?,
        })
    }
}

/// Departure feeder, trunk and arrival feeder legs of one journey, by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trip {
    #[serde(rename = "departure_feeder")]
    pub departure_feeder_id: i64,
    #[serde(rename = "trunk")]
    pub trunk_id: i64,
    #[serde(rename = "arrival_feeder")]
    pub arrival_feeder_id: i64,
    pub total_price: i64,
}

impl Record for Trip {
    const TABLE: Table = Table {
        name: "trips",
        columns: &[
            Column::key("departure_feeder_id", ColumnKind::Integer),
            Column::key("trunk_id", ColumnKind::Integer),
            Column::key("arrival_feeder_id", ColumnKind::Integer),
            Column::key("total_price", ColumnKind::Integer),
        ],
    };

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Integer(self.departure_feeder_id),
            Value::Integer(self.trunk_id),
            Value::Integer(self.arrival_feeder_id),
            Value::Integer(self.total_price),
        ]
    }

    fn from_values(values: Vec<Value>) -> CoreResult<Self> {
        let mut r = ValueReader::new(Self::TABLE.name, values);
        Ok(Self {
            departure_feeder_id: r.integer()?,
            trunk_id: r.integer()?,
            arrival_feeder_id: r.integer()?,
            total_price: r.integer()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vacation {
    pub city: String,
    pub hotel_budget: String,
    pub sightseeing_budget: String,
    pub total_price: i64,
}

impl Record for Vacation {
    const TABLE: Table = Table {
        name: "vacations",
        columns: &[
            Column::key("city", ColumnKind::Text),
            Column::key("hotel_budget", ColumnKind::Text),
            Column::key("sightseeing_budget", ColumnKind::Text),
            Column::key("total_price", ColumnKind::Integer),
        ],
    };

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.city.clone()),
            Value::Text(self.hotel_budget.clone()),
            Value::Text(self.sightseeing_budget.clone()),
            Value::Integer(self.total_price),
        ]
    }

    fn from_values(values: Vec<Value>) -> CoreResult<Self> {
        let mut r = ValueReader::new(Self::TABLE.name, values);
        Ok(Self {
            city: r.text()?,
            hotel_budget: r.text()?,
            sightseeing_budget: r.text()?,
            total_price: r.integer()?,
        })
    }
}

/// A passport holder, shared across bookings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub nationality: String,
    pub passport_number: Masked<String>,
    pub first_name: String,
    pub last_name: String,
}

impl Record for Person {
    const TABLE: Table = Table {
        name: "persons",
        columns: &[
            Column::key("nationality", ColumnKind::Text),
            Column::key("passport_number", ColumnKind::Text),
            Column::key("first_name", ColumnKind::Text),
            Column::key("last_name", ColumnKind::Text),
        ],
    };

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.nationality.clone()),
            Value::Text(self.passport_number.expose().clone()),
            Value::Text(self.first_name.clone()),
            Value::Text(self.last_name.clone()),
        ]
    }

    fn from_values(values: Vec<Value>) -> CoreResult<Self> {
        let mut r = ValueReader::new(Self::TABLE.name, values);
        Ok(Self {
            nationality: r.text()?,
            passport_number: Masked(r.text()?),
            first_name: r.text()?,
            last_name: r.text()?,
        })
    }
}

// ============================================================================
// Users & Links
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub github_email: String,
    pub name: String,
    pub registered_at: DateTime<Utc>,
    pub last_login: DateTime<Utc>,
}

/// Changes applied to an existing user; unset timestamps are left as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserUpdate {
    pub github_email: String,
    pub name: String,
    #[serde(default)]
    pub registered_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingPerson {
    pub booking_id: i64,
    pub person_id: i64,
}
