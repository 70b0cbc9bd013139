//! Database connectivity for the catalog services
//!
//! Connection management, health checks, and startup retry for MongoDB.
//!
//! # Features
//!
//! - `mongodb` (default) - MongoDB connector, config, and health checks
//! - `config` - `core_config::FromEnv` support for [`mongodb::MongoConfig`]
//!
//! # Example
//!
//! ```ignore
//! use database::mongodb::{self, MongoConfig};
//!
//! let config = MongoConfig::new("mongodb://localhost:27017/product_catalog");
//! let client = mongodb::connect_from_config(&config).await?;
//! let db = client.database(&config.database_name());
//! ```

pub mod common;

#[cfg(feature = "mongodb")]
pub mod mongodb;

pub use common::{DatabaseError, DatabaseResult};
