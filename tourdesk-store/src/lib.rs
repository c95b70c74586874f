pub mod app_config;
pub mod database;
pub mod pg_queue;
pub mod pg_repo;
pub mod receipts;

pub use database::DbClient;
pub use pg_repo::PgStore;
pub use receipts::LocalReceiptStorage;
