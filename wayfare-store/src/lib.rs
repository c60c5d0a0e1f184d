pub mod app_config;
pub mod booking_repo;
pub mod database;
pub mod record_repo;
mod sql;
pub mod user_repo;

pub use app_config::Config;
pub use booking_repo::PgBookingStore;
pub use database::DbClient;
pub use record_repo::PgRecordStore;
pub use user_repo::PgUserRepository;
