pub mod airports;
pub mod booking;
pub mod composer;
pub mod dedup;
pub mod enrichment;
pub mod geo;
pub mod models;
pub mod reader;
pub mod record;
pub mod repository;

#[cfg(any(test, feature = "test-util"))]
pub mod memory;

pub use composer::BookingComposer;
pub use reader::BookingReader;
pub use repository::{BookingStore, BookingTransaction, RecordStore, RepoError, RepoResult, UserRepository};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{0}")]
    ConflictError(String),
    #[error("{0}")]
    NotFoundError(String),
    #[error("Broken reference: {0}")]
    BrokenReference(String),
    #[error("Record decode failed: {0}")]
    DecodeError(String),
    #[error("Airport data error: {0}")]
    AirportDataError(#[from] csv::Error),
    #[error("Internal service error: {0}")]
    InternalError(String),
    #[error("Store operation failed: {0}")]
    StoreError(#[from] RepoError),
}

pub type CoreResult<T> = Result<T, CoreError>;
