//! Static airport reference data loaded from an airport CSV export. Only rows
//! typed `large_airport` are kept, so a full export can be pointed at directly.

use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::geo;
use crate::CoreResult;

// Column positions in the airport CSV.
const TYPE_COLUMN: usize = 2;
const NAME_COLUMN: usize = 3;
const LATITUDE_COLUMN: usize = 4;
const LONGITUDE_COLUMN: usize = 5;
const CITY_COLUMN: usize = 10;
const IATA_COLUMN: usize = 13;

const LARGE_AIRPORT: &str = "large_airport";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Airport {
    pub city: String,
    pub name: String,
    pub lat: f64,
    pub long: f64,
    pub iata_code: String,
}

impl Airport {
    fn from_record(record: &StringRecord) -> Option<Self> {
        let field = |index: usize| record.get(index).map(str::trim);
        Some(Self {
            city: field(CITY_COLUMN)?.to_string(),
            name: field(NAME_COLUMN)?.to_string(),
            lat: field(LATITUDE_COLUMN)?.parse().ok()?,
            long: field(LONGITUDE_COLUMN)?.parse().ok()?,
            iata_code: field(IATA_COLUMN)?.to_string(),
        })
    }
}

/// Immutable, load-once list of airports in file order.
#[derive(Debug, Clone, Default)]
pub struct AirportIndex {
    airports: Vec<Airport>,
}

impl AirportIndex {
    pub fn new(airports: Vec<Airport>) -> Self {
        Self { airports }
    }

    pub fn from_path(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)?;
        let index = Self::from_csv(reader)?;
        info!("Loaded {} airports from {}", index.len(), path.display());
        Ok(index)
    }

    pub fn from_reader<R: Read>(input: R) -> CoreResult<Self> {
        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(input);
        Self::from_csv(reader)
    }

    fn from_csv<R: Read>(mut reader: csv::Reader<R>) -> CoreResult<Self> {
        let mut airports = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record = record?;
            // +2: one for the header, one for 1-based line numbers
            let line = line + 2;
            let kind = record.get(TYPE_COLUMN).map(str::trim).unwrap_or_default();
            if kind != LARGE_AIRPORT {
                debug!("Skipping airport row {}: type {:?}", line, kind);
                continue;
            }
            match Airport::from_record(&record) {
                Some(airport) => airports.push(airport),
                None => warn!("Skipping airport row {}: missing or unparsable fields", line),
            }
        }
        Ok(Self { airports })
    }

    pub fn airports(&self) -> &[Airport] {
        &self.airports
    }

    pub fn len(&self) -> usize {
        self.airports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.airports.is_empty()
    }

    pub fn nearest(&self, lat: f64, long: f64) -> Option<&Airport> {
        geo::nearest_airport(lat, long, &self.airports)
    }
}
