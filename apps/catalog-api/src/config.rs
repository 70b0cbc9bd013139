//! Configuration for the Catalog API

use core_config::{
    app_info, env_or_default, server::ServerConfig, AppInfo, ConfigError, CorsConfig, FromEnv,
    RateLimitConfig,
};
use database::mongodb::MongoConfig;

pub use core_config::Environment;

/// Where products and categories are kept
#[derive(Clone, Debug)]
pub enum StorageConfig {
    MongoDb(MongoConfig),
    /// Process-local store, lost on restart
    Memory,
}

impl FromEnv for StorageConfig {
    /// - CATALOG_STORAGE: `mongodb` (default) or `memory`
    fn from_env() -> Result<Self, ConfigError> {
        let backend = env_or_default("CATALOG_STORAGE", "mongodb");

        match backend.trim().to_ascii_lowercase().as_str() {
            "mongodb" | "mongo" => Ok(Self::MongoDb(MongoConfig::from_env()?)),
            "memory" => Ok(Self::Memory),
            other => Err(ConfigError::ParseError {
                key: "CATALOG_STORAGE".to_string(),
                details: format!("expected 'mongodb' or 'memory', got '{other}'"),
            }),
        }
    }
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub environment: Environment,
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub rate_limit: RateLimitConfig,
    pub storage: StorageConfig,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();

        Ok(Self {
            app: app_info!(),
            environment,
            server: ServerConfig::from_env()?,
            cors: CorsConfig::for_environment(environment)?,
            rate_limit: RateLimitConfig::from_env()?,
            storage: StorageConfig::from_env()?,
        })
    }
}
