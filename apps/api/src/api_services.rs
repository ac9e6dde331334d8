mod ban_store;
mod database;
mod sessions;

pub use ban_store::build_ban_repository;
pub use database::connect_and_migrate;
pub use sessions::build_postgres_session_layer;
