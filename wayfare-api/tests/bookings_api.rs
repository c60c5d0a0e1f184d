use std::io::Write;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wayfare_api::{app, AppState};
use wayfare_core::airports::AirportIndex;
use wayfare_core::memory::MemoryStore;
use wayfare_store::app_config::CorsConfig;

const AIRPORTS_CSV: &str = "\
id,ident,type,name,latitude_deg,longitude_deg,elevation_ft,continent,iso_country,iso_region,municipality,scheduled_service,gps_code,iata_code
4330,LPPT,large_airport,Humberto Delgado Airport,38.7813,-9.13592,374,EU,PT,PT-11,Lisbon,yes,LPPT,LIS
4329,LPPR,large_airport,Francisco Sa Carneiro Airport,41.2481,-8.68139,228,EU,PT,PT-13,Porto,yes,LPPR,OPO
3422,KBOS,large_airport,General Edward Lawrence Logan International Airport,42.3643,-71.005203,20,NA,US,US-MA,Boston,yes,KBOS,BOS
";

fn airports() -> AirportIndex {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(AIRPORTS_CSV.as_bytes()).unwrap();
    AirportIndex::from_path(file.path()).unwrap()
}

fn test_app() -> (Router, MemoryStore) {
    let store = MemoryStore::new();
    let state = AppState {
        bookings: Arc::new(store.clone()),
        records: Arc::new(store.clone()),
        users: Arc::new(store.clone()),
        airports: Arc::new(airports()),
    };
    (app(state, &CorsConfig::default()), store)
}

async fn send_raw(app: &Router, method: Method, uri: &str, body: String) -> (StatusCode, String) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, String) {
    send_raw(app, Method::POST, uri, body.to_string()).await
}

fn leg(leg_type: &str, origin: &str, destination: &str, price: i64) -> Value {
    json!({
        "type": leg_type,
        "budget": "economy",
        "origin_city": origin,
        "destination_city": destination,
        "price": price,
        "distance_from_previous": 12.5,
        "distance_to_next": 430.0
    })
}

fn booking(email: &str, total_price: i64) -> Value {
    json!({
        "registrar_email": email,
        "outbound_trip": {
            "departure_feeder": leg("feeder", "Porto", "LIS", 40),
            "trunk": leg("trunk", "LIS", "JFK", 310),
            "arrival_feeder": leg("feeder", "JFK", "Boston", 55),
            "total_price": 405
        },
        "inbound_trip": {
            "departure_feeder": leg("feeder", "Boston", "JFK", 50),
            "trunk": leg("trunk", "JFK", "LIS", 290),
            "arrival_feeder": leg("feeder", "LIS", "Porto", 45),
            "total_price": 385
        },
        "vacation": {"city": "Boston", "hotel_budget": "mid", "sightseeing_budget": "low", "total_price": 600},
        "vacation_day_count": 3,
        "total_days": 3,
        "total_price": total_price,
        "persons": [
            {"nationality": "PT", "passport_number": "P100", "first_name": "Rita", "last_name": "Costa"},
            {"nationality": "PT", "passport_number": "P200", "first_name": "Joao", "last_name": "Costa"}
        ]
    })
}

async fn create(app: &Router, email: &str, total_price: i64) -> i64 {
    let (status, body) = post(app, "/api/bookings/create-complex", booking(email, total_price)).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let created: Value = serde_json::from_str(&body).unwrap();
    created["booking_id"].as_i64().unwrap()
}

// ============================================================================
// Complex Bookings
// ============================================================================

#[tokio::test]
async fn test_create_and_get_complex_booking() {
    let (app, _store) = test_app();
    let booking_id = create(&app, "rita@example.com", 1390).await;

    let (status, body) = post(&app, "/api/bookings/get-complex", json!({"booking_id": booking_id})).await;
    assert_eq!(status, StatusCode::OK);

    let view: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(view["booking_id"], booking_id);
    assert_eq!(view["registrar_email"], "rita@example.com");
    assert_eq!(view["outbound_trip"]["trunk"]["type"], "trunk");
    assert_eq!(view["outbound_trip"]["trunk"]["destination_city"], "JFK");
    assert_eq!(view["inbound_trip"]["arrival_feeder"]["destination_city"], "Porto");
    assert_eq!(view["vacation"]["city"], "Boston");
    assert_eq!(view["persons"][0]["passport_number"], "P100");
    assert_eq!(view["persons"][1]["first_name"], "Joao");

    // Also reachable with GET and a JSON body.
    let (status, _) = send_raw(
        &app,
        Method::GET,
        "/api/bookings/get-complex",
        json!({"booking_id": booking_id}).to_string(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_duplicate_booking_is_conflict() {
    let (app, store) = test_app();
    create(&app, "rita@example.com", 1390).await;

    let (status, body) = post(&app, "/api/bookings/create-complex", booking("rita@example.com", 1390)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, "Booking already exists");
    assert_eq!(store.row_count("bookings").await, 1);
}

#[tokio::test]
async fn test_malformed_bodies_are_bad_requests() {
    let (app, store) = test_app();

    let (status, _) = send_raw(&app, Method::POST, "/api/bookings/create-complex", "{not json".to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut missing_field = booking("rita@example.com", 1390);
    missing_field.as_object_mut().unwrap().remove("vacation");
    let (status, _) = post(&app, "/api/bookings/create-complex", missing_field).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut wrong_type = booking("rita@example.com", 1390);
    wrong_type["total_days"] = json!("three");
    let (status, body) = post(&app, "/api/bookings/create-complex", wrong_type).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!body.is_empty());

    assert_eq!(store.row_count("bookings").await, 0);
}

#[tokio::test]
async fn test_store_failure_rolls_back() {
    let (app, store) = test_app();
    store.fail_nth_insert("legs", 6);

    let (status, _) = post(&app, "/api/bookings/create-complex", booking("rita@example.com", 1390)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    for table in ["bookings", "bookings_persons", "persons", "vacations", "legs", "trips"] {
        assert_eq!(store.row_count(table).await, 0, "{} should be empty", table);
    }

    // The fault fired once; the same request now succeeds.
    create(&app, "rita@example.com", 1390).await;
}

#[tokio::test]
async fn test_missing_booking_vs_broken_reference() {
    let (app, _store) = test_app();

    let (status, _) = post(&app, "/api/bookings/get-complex", json!({"booking_id": 99})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let booking_id = create(&app, "rita@example.com", 1390).await;
    let (status, _) = post(&app, "/vacations/delete", json!({"id": 1})).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post(&app, "/api/bookings/get-complex", json!({"booking_id": booking_id})).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("Broken reference"), "{}", body);
}

#[tokio::test]
async fn test_list_and_delete_bookings() {
    let (app, store) = test_app();
    let first = create(&app, "rita@example.com", 1390).await;
    let second = create(&app, "rita@example.com", 1500).await;
    create(&app, "joao@example.com", 1390).await;

    let (status, body) = post(&app, "/api/bookings/get-all", json!({"email": "rita@example.com"})).await;
    assert_eq!(status, StatusCode::OK);
    let rows: Vec<Value> = serde_json::from_str(&body).unwrap();
    let ids: Vec<i64> = rows.iter().map(|r| r["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![first, second]);
    assert!(rows[0]["outbound_trip"].is_i64());

    let (status, _) = post(&app, "/api/bookings/delete", json!({"booking_id": first})).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(store.row_count("bookings_persons").await, 4);

    let (status, _) = post(&app, "/api/bookings/delete", json!({"booking_id": first})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// General Info
// ============================================================================

#[tokio::test]
async fn test_set_general_info() {
    let (app, _store) = test_app();
    let request = json!({
        "origin": {"country": "Portugal", "state": "Braga", "city": "Braga", "lat": 41.5454, "long": -8.4265},
        "destination": {"country": "USA", "state": "MA", "city": "Cambridge", "lat": 42.3736, "long": -71.1097}
    });

    let (status, body) = post(&app, "/api/set-general-info", request).await;
    assert_eq!(status, StatusCode::OK);

    let info: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(info["origin_airport"]["iata_code"], "OPO");
    assert_eq!(info["destination_airport"]["iata_code"], "BOS");
    assert_eq!(info["origin"]["to_next"], info["origin_airport"]["to_before"]);
    assert_eq!(info["origin_airport"]["to_next"], info["destination_airport"]["to_before"]);
    assert_eq!(info["destination"]["to_before"], info["destination_airport"]["to_next"]);
}

// ============================================================================
// Entity CRUD
// ============================================================================

#[tokio::test]
async fn test_leg_crud() {
    let (app, _store) = test_app();
    let trunk = leg("trunk", "LIS", "JFK", 310);

    let (status, body) = post(&app, "/leg/create", trunk.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = serde_json::from_str::<Value>(&body).unwrap()["id"].as_i64().unwrap();

    let (status, _) = post(&app, "/leg/create", trunk).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let mut edited = leg("trunk", "LIS", "EWR", 290);
    edited["id"] = json!(id);
    let (status, _) = post(&app, "/leg/edit", edited.clone()).await;
    assert_eq!(status, StatusCode::OK);

    edited["id"] = json!(id + 100);
    let (status, _) = post(&app, "/leg/edit", edited).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = post(&app, "/leg/delete", json!({"id": id})).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = post(&app, "/leg/delete", json!({"id": id})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_edit_onto_existing_key_is_conflict() {
    let (app, store) = test_app();

    let (_, body) = post(&app, "/leg/create", leg("trunk", "LIS", "JFK", 310)).await;
    let first = serde_json::from_str::<Value>(&body).unwrap()["id"].as_i64().unwrap();
    let (_, body) = post(&app, "/leg/create", leg("trunk", "LIS", "EWR", 290)).await;
    let second = serde_json::from_str::<Value>(&body).unwrap()["id"].as_i64().unwrap();

    let mut onto_first = leg("trunk", "LIS", "JFK", 310);
    onto_first["id"] = json!(second);
    let (status, _) = post(&app, "/leg/edit", onto_first).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // The refused edit left the second leg untouched; it still holds its key.
    let mut onto_second = leg("trunk", "LIS", "EWR", 290);
    onto_second["id"] = json!(first);
    let (status, _) = post(&app, "/leg/edit", onto_second).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = post(&app, "/leg/create", leg("trunk", "LIS", "EWR", 290)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(store.row_count("legs").await, 2);
}

#[tokio::test]
async fn test_flat_booking_crud() {
    let (app, store) = test_app();
    let complex_id = create(&app, "rita@example.com", 1390).await;

    let flat = json!({
        "registrar_email": "ines@example.com",
        "outbound_trip": 1,
        "vacation": 1,
        "vacation_day_count": 5,
        "inbound_trip": 2,
        "total_days": 7,
        "total_price": 2100
    });
    let (status, body) = post(&app, "/bookings/create", flat.clone()).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let id = serde_json::from_str::<Value>(&body).unwrap()["id"].as_i64().unwrap();

    let (status, body) = post(&app, "/bookings/create", flat.clone()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, "Booking already exists");

    // Shares trips and vacation with the complex booking, so it reads back whole.
    let (status, body) = post(&app, "/api/bookings/get-complex", json!({"booking_id": id})).await;
    assert_eq!(status, StatusCode::OK);
    let view: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(view["total_days"], 7);
    assert_eq!(view["outbound_trip"]["trunk"]["destination_city"], "JFK");

    let mut edited = flat.clone();
    edited["id"] = json!(id);
    edited["total_price"] = json!(2300);
    let (status, _) = post(&app, "/bookings/edit", edited.clone()).await;
    assert_eq!(status, StatusCode::OK);

    let mut onto_complex = edited.clone();
    onto_complex["registrar_email"] = json!("rita@example.com");
    onto_complex["vacation_day_count"] = json!(3);
    onto_complex["total_days"] = json!(3);
    onto_complex["total_price"] = json!(1390);
    let (status, _) = post(&app, "/bookings/edit", onto_complex).await;
    assert_eq!(status, StatusCode::CONFLICT);

    edited["id"] = json!(id + 100);
    let (status, _) = post(&app, "/bookings/edit", edited).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = post(&app, "/api/bookings/get-all", json!({"email": "ines@example.com"})).await;
    assert_eq!(status, StatusCode::OK);
    let rows: Vec<Value> = serde_json::from_str(&body).unwrap();
    assert_eq!(rows[0]["total_price"], 2300);

    let (status, _) = post(&app, "/bookings/delete", json!({"id": id})).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = post(&app, "/bookings/delete", json!({"id": id})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert_eq!(store.row_count("bookings").await, 1);
    let (status, _) = post(&app, "/api/bookings/get-complex", json!({"booking_id": complex_id})).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_person_and_link_crud() {
    let (app, store) = test_app();
    let booking_id = create(&app, "rita@example.com", 1390).await;

    let (status, body) = post(
        &app,
        "/persons/create",
        json!({"nationality": "ES", "passport_number": "E900", "first_name": "Lucia", "last_name": "Gil"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let person_id = serde_json::from_str::<Value>(&body).unwrap()["id"].as_i64().unwrap();

    let link = json!({"booking_id": booking_id, "person_id": person_id});
    let (status, body) = post(&app, "/bookings_persons/create", link.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    let link_id = serde_json::from_str::<Value>(&body).unwrap()["id"].as_i64().unwrap();
    let (status, body) = post(&app, "/bookings_persons/create", link.clone()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, "Booking person already exists");
    assert_eq!(store.row_count("bookings_persons").await, 3);

    // Person 1 is already linked to this booking through the complex create.
    let (status, _) = post(
        &app,
        "/bookings_persons/edit",
        json!({"id": link_id, "booking_id": booking_id, "person_id": 1}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = post(
        &app,
        "/bookings_persons/edit",
        json!({"id": link_id + 100, "booking_id": booking_id, "person_id": person_id}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = post(
        &app,
        "/bookings_persons/edit",
        json!({"id": link_id, "booking_id": booking_id, "person_id": person_id}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = post(&app, "/bookings_persons/delete", link.clone()).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = post(&app, "/bookings_persons/delete", link).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_user_crud() {
    let (app, store) = test_app();
    let user = json!({
        "github_email": "rita@example.com",
        "name": "Rita",
        "registered_at": "2025-01-10T09:00:00Z",
        "last_login": "2025-01-10T09:00:00Z"
    });

    let (status, _) = post(&app, "/users/create", user.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = post(&app, "/users/create", user).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = post(&app, "/users/edit", json!({"github_email": "rita@example.com", "name": "Rita C."})).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = post(&app, "/users/edit", json!({"github_email": "nobody@example.com", "name": "X"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = post(&app, "/users/delete", json!({"github_email": "rita@example.com"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(store.row_count("users").await, 0);
}
