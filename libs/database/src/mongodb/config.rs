#[cfg(feature = "config")]
use core_config::{ConfigError, FromEnv, env_parse_or};

/// Database used when neither the config nor the URI names one
pub const DEFAULT_DATABASE: &str = "product_catalog";

/// MongoDB connection settings
///
/// Built by hand in tests, or from the environment with the `config` feature.
///
/// ```ignore
/// use database::mongodb::MongoConfig;
///
/// let config = MongoConfig::new("mongodb://localhost:27017/product_catalog")
///     .with_app_name("catalog-api");
/// assert_eq!(config.database_name(), "product_catalog");
/// ```
#[derive(Clone, Debug)]
pub struct MongoConfig {
    /// Connection string, `mongodb://[user:pass@]host[:port][/database][?options]`
    pub uri: String,

    /// Explicit database name, takes precedence over the URI path
    pub database: Option<String>,

    pub app_name: Option<String>,
    pub max_pool_size: u32,
    pub min_pool_size: u32,
    pub connect_timeout_ms: u64,
    pub server_selection_timeout_ms: u64,
}

impl MongoConfig {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ..Self::default()
        }
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = Some(app_name.into());
        self
    }

    pub fn with_pool_size(mut self, max_pool_size: u32) -> Self {
        self.max_pool_size = max_pool_size;
        self
    }

    /// Resolved database: explicit name, then the URI path, then [`DEFAULT_DATABASE`].
    pub fn database_name(&self) -> String {
        self.database
            .clone()
            .filter(|name| !name.is_empty())
            .or_else(|| database_from_uri(&self.uri))
            .unwrap_or_else(|| DEFAULT_DATABASE.to_string())
    }

    /// URI with credentials masked, safe for logs.
    pub fn redacted_uri(&self) -> String {
        match (self.uri.find("://"), self.uri.rfind('@')) {
            (Some(scheme_end), Some(at)) if at > scheme_end => {
                format!("{}://***@{}", &self.uri[..scheme_end], &self.uri[at + 1..])
            }
            _ => self.uri.clone(),
        }
    }
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            uri: "mongodb://localhost:27017".to_string(),
            database: None,
            app_name: None,
            max_pool_size: 10,
            min_pool_size: 0,
            connect_timeout_ms: 10_000,
            server_selection_timeout_ms: 5_000,
        }
    }
}

fn database_from_uri(uri: &str) -> Option<String> {
    let rest = &uri[uri.find("://")? + 3..];
    let path = &rest[rest.find('/')? + 1..];
    let name = path.split('?').next().unwrap_or_default();
    (!name.is_empty()).then(|| name.to_string())
}

/// Environment variables:
/// - `MONGODB_URI`, falling back to `MONGODB_URL` (required)
/// - `MONGODB_DATABASE` (optional, otherwise taken from the URI path)
/// - `MONGODB_APP_NAME` (optional)
/// - `MONGODB_MAX_POOL_SIZE` (default: 10)
/// - `MONGODB_MIN_POOL_SIZE` (default: 0)
/// - `MONGODB_CONNECT_TIMEOUT_MS` (default: 10000)
/// - `MONGODB_SERVER_SELECTION_TIMEOUT_MS` (default: 5000)
#[cfg(feature = "config")]
impl FromEnv for MongoConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let uri = std::env::var("MONGODB_URI")
            .or_else(|_| std::env::var("MONGODB_URL"))
            .map_err(|_| ConfigError::MissingEnvVar("MONGODB_URI".to_string()))?;

        let defaults = Self::default();

        Ok(Self {
            uri,
            database: std::env::var("MONGODB_DATABASE").ok(),
            app_name: std::env::var("MONGODB_APP_NAME").ok(),
            max_pool_size: env_parse_or("MONGODB_MAX_POOL_SIZE", defaults.max_pool_size)?,
            min_pool_size: env_parse_or("MONGODB_MIN_POOL_SIZE", defaults.min_pool_size)?,
            connect_timeout_ms: env_parse_or(
                "MONGODB_CONNECT_TIMEOUT_MS",
                defaults.connect_timeout_ms,
            )?,
            server_selection_timeout_ms: env_parse_or(
                "MONGODB_SERVER_SELECTION_TIMEOUT_MS",
                defaults.server_selection_timeout_ms,
            )?,
        })
    }
}
