pub mod connection;
pub mod invoice_repository;
pub mod models;
pub mod schema;

pub use connection::{
    DbConnection, DbPool, create_connection_pool, get_connection_from_pool, run_migrations,
};
pub use invoice_repository::PostgresInvoiceRepository;
