//! Configuration management

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub app: AppSettings,
    pub database: DatabaseSettings,
    pub pagination: PaginationSettings,
    pub logging: LogSettings,
    pub cors: CorsSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub env: String,
    pub host: String,
    pub port: u16,
    pub name: String,
    pub version: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaginationSettings {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogSettings {
    /// Secret for the keyed log-correlation digests (see [`crate::pii`]).
    pub hash_secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorsSettings {
    pub allowed_origins: Vec<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let config = Config::builder()
            .set_default("app.env", "development")?
            .set_default("app.host", "127.0.0.1")?
            .set_default("app.port", 8080)?
            .set_default("app.name", "user-registry")?
            .set_default("app.version", env!("CARGO_PKG_VERSION"))?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 1)?
            .set_default("pagination.default_page_size", i64::from(DEFAULT_PAGE_SIZE))?
            .set_default("pagination.max_page_size", i64::from(MAX_PAGE_SIZE))?
            .set_default(
                "logging.hash_secret",
                "change-this-in-production-to-a-secure-random-value",
            )?
            .set_default(
                "cors.allowed_origins",
                vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:8080".to_string(),
                ],
            )?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::default().separator("__").try_parsing(true))
            .build()?;
        config.try_deserialize()
    }
}
