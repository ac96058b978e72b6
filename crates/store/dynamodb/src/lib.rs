mod config;
mod item;
mod store;
mod table;

pub use config::DynamoConfig;
pub use store::{DynamoDatabase, build_client};
pub use table::create_table;
