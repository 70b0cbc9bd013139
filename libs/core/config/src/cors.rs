use crate::{ConfigError, Environment, FromEnv};

/// Which origins may call the API from a browser.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AllowedOrigins {
    Any,
    List(Vec<String>),
}

/// CORS policy
#[derive(Clone, Debug)]
pub struct CorsConfig {
    pub origins: AllowedOrigins,
}

impl CorsConfig {
    pub fn any() -> Self {
        Self {
            origins: AllowedOrigins::Any,
        }
    }

    /// Development always allows any origin. Elsewhere `ALLOWED_ORIGINS` is a
    /// comma separated list; unset or `*` allows any origin.
    pub fn for_environment(environment: Environment) -> Result<Self, ConfigError> {
        if environment.is_development() {
            return Ok(Self::any());
        }
        Self::from_env()
    }
}

impl FromEnv for CorsConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let raw = match std::env::var("ALLOWED_ORIGINS") {
            Ok(raw) => raw,
            Err(_) => return Ok(Self::any()),
        };

        if raw.trim() == "*" {
            return Ok(Self::any());
        }

        let origins: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        if origins.is_empty() {
            return Err(ConfigError::ParseError {
                key: "ALLOWED_ORIGINS".to_string(),
                details: "no origins listed".to_string(),
            });
        }

        Ok(Self {
            origins: AllowedOrigins::List(origins),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_development_allows_any_origin() {
        temp_env::with_var("ALLOWED_ORIGINS", Some("https://shop.example.com"), || {
            let config = CorsConfig::for_environment(Environment::Development).unwrap();
            assert_eq!(config.origins, AllowedOrigins::Any);
        });
    }

    #[test]
    fn test_production_reads_origin_list() {
        temp_env::with_var(
            "ALLOWED_ORIGINS",
            Some("https://shop.example.com, https://admin.example.com"),
            || {
                let config = CorsConfig::for_environment(Environment::Production).unwrap();
                assert_eq!(
                    config.origins,
                    AllowedOrigins::List(vec![
                        "https://shop.example.com".to_string(),
                        "https://admin.example.com".to_string()
                    ])
                );
            },
        );
    }

    #[test]
    fn test_production_without_origins_allows_any() {
        temp_env::with_var_unset("ALLOWED_ORIGINS", || {
            let config = CorsConfig::for_environment(Environment::Production).unwrap();
            assert_eq!(config.origins, AllowedOrigins::Any);
        });
    }

    #[test]
    fn test_empty_origin_list_is_rejected() {
        temp_env::with_var("ALLOWED_ORIGINS", Some(" , "), || {
            assert!(CorsConfig::from_env().is_err());
        });
    }
}
