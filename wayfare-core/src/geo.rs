use crate::airports::Airport;

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometres between two points given in degrees.
pub fn haversine(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Linear scan for the airport closest to (`lat`, `lon`).
/// Ties keep the first airport encountered; `None` only for an empty list.
pub fn nearest_airport(lat: f64, lon: f64, airports: &[Airport]) -> Option<&Airport> {
    let mut best: Option<(&Airport, f64)> = None;
    for airport in airports {
        let distance = haversine(lat, lon, airport.lat, airport.long);
        if best.map_or(!distance.is_nan(), |(_, min)| distance < min) {
            best = Some((airport, distance));
        }
    }
    best.map(|(airport, _)| airport)
}
