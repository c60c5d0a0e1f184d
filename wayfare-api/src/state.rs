use std::sync::Arc;

use wayfare_core::airports::AirportIndex;
use wayfare_core::{BookingComposer, BookingReader, BookingStore, RecordStore, UserRepository};

#[derive(Clone)]
pub struct AppState {
    pub bookings: Arc<dyn BookingStore>,
    pub records: Arc<dyn RecordStore>,
    pub users: Arc<dyn UserRepository>,
    pub airports: Arc<AirportIndex>,
}

impl AppState {
    pub fn composer(&self) -> BookingComposer {
        BookingComposer::new(self.bookings.clone())
    }

    pub fn reader(&self) -> BookingReader {
        BookingReader::new(self.bookings.clone())
    }
}
