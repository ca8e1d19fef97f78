pub mod config;
pub mod database;

pub use config::AppConfig;
