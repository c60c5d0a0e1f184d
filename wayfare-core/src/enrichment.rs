use serde::{Deserialize, Serialize};

use crate::airports::{Airport, AirportIndex};
use crate::geo::haversine;
use crate::{CoreError, CoreResult};

/// A city endpoint of the journey as sent by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Locality {
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub city: String,
    pub lat: f64,
    pub long: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_before: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_next: Option<f64>,
}

/// An airport on the journey with distances to its neighbours, in km.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirportStop {
    pub city: String,
    pub name: String,
    pub lat: f64,
    pub long: f64,
    pub iata_code: String,
    pub to_before: f64,
    pub to_next: f64,
}

impl AirportStop {
    fn new(airport: &Airport, to_before: f64, to_next: f64) -> Self {
        Self {
            city: airport.city.clone(),
            name: airport.name.clone(),
            lat: airport.lat,
            long: airport.long,
            iata_code: airport.iata_code.clone(),
            to_before,
            to_next,
        }
    }
}

/// Any airports already present in the request are ignored and recomputed.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneralInfoRequest {
    pub origin: Locality,
    pub destination: Locality,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralInfo {
    pub origin: Locality,
    pub origin_airport: AirportStop,
    pub destination_airport: AirportStop,
    pub destination: Locality,
}

/// Annotates an origin/destination pair with the nearest airports and the three
/// leg distances: origin -> airport, airport -> airport, airport -> destination.
pub fn enrich_general_info(request: GeneralInfoRequest, airports: &AirportIndex) -> CoreResult<GeneralInfo> {
    let GeneralInfoRequest {
        mut origin,
        mut destination,
    } = request;

    let empty = || CoreError::InternalError("airport index is empty".to_string());
    let departure = airports.nearest(origin.lat, origin.long).ok_or_else(empty)?;
    let arrival = airports
        .nearest(destination.lat, destination.long)
        .ok_or_else(empty)?;

    let feeder_out = haversine(origin.lat, origin.long, departure.lat, departure.long);
    let trunk = haversine(departure.lat, departure.long, arrival.lat, arrival.long);
    let feeder_in = haversine(arrival.lat, arrival.long, destination.lat, destination.long);

    origin.to_next = Some(feeder_out);
    destination.to_before = Some(feeder_in);

    Ok(GeneralInfo {
        origin,
        origin_airport: AirportStop::new(departure, feeder_out, trunk),
        destination_airport: AirportStop::new(arrival, trunk, feeder_in),
        destination,
    })
}
