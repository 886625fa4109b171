pub mod config;
pub mod database;

pub use config::ConfigService;
pub use database::Database;
