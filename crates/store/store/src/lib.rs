pub mod database;
pub mod error;
pub mod testing;

pub use database::Database;
pub use error::StoreError;
