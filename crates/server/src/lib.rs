pub mod api;
pub mod blacklist;
pub mod config;
pub mod error;
pub mod inbox;
pub mod provider_factory;
pub mod store_factory;
pub mod telemetry;
