mod database;

pub use database::MemoryDatabase;
