use std::env;

use thiserror::Error;

pub const MEMORY_DATABASE_URL: &str = "memory://";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Credentials for the superuser created at startup.
#[derive(Clone, PartialEq, Eq)]
pub struct SuperuserSeed {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for SuperuserSeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuperuserSeed")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub bcrypt_cost: u32,
    pub superuser: Option<SuperuserSeed>,
}

impl Config {
    /// Reads configuration from the process environment. Call
    /// `dotenvy::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let port = match lookup("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: raw,
            })?,
            None => 3000,
        };

        let bcrypt_cost = match lookup("BCRYPT_COST") {
            Some(raw) => match raw.parse::<u32>() {
                Ok(cost) if (4..=31).contains(&cost) => cost,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "BCRYPT_COST",
                        value: raw,
                    })
                }
            },
            None => bcrypt::DEFAULT_COST,
        };

        let superuser = match (
            lookup("SUPERUSER_USERNAME"),
            lookup("SUPERUSER_EMAIL"),
            lookup("SUPERUSER_PASSWORD"),
        ) {
            (Some(username), Some(email), Some(password)) => Some(SuperuserSeed {
                username,
                email,
                password,
            }),
            (None, None, None) => None,
            _ => return Err(ConfigError::Missing("SUPERUSER_USERNAME/EMAIL/PASSWORD")),
        };

        Ok(Self {
            database_url,
            host,
            port,
            bcrypt_cost,
            superuser,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn uses_memory_store(&self) -> bool {
        self.database_url == MEMORY_DATABASE_URL
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn applies_defaults() {
        let config = Config::from_lookup(lookup(&[("DATABASE_URL", "memory://")])).unwrap();
        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
        assert_eq!(config.bcrypt_cost, bcrypt::DEFAULT_COST);
        assert!(config.uses_memory_store());
        assert!(config.superuser.is_none());
    }

    #[test]
    fn requires_database_url() {
        assert_eq!(
            Config::from_lookup(lookup(&[])).unwrap_err(),
            ConfigError::Missing("DATABASE_URL")
        );
    }

    #[test]
    fn rejects_bad_numbers() {
        let err = Config::from_lookup(lookup(&[("DATABASE_URL", "x"), ("PORT", "http")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PORT", .. }));

        let err = Config::from_lookup(lookup(&[("DATABASE_URL", "x"), ("BCRYPT_COST", "2")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "BCRYPT_COST", .. }));
    }

    #[test]
    fn superuser_seed_needs_all_three_values() {
        let err = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "x"),
            ("SUPERUSER_USERNAME", "root"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Missing(_)));

        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/users"),
            ("SUPERUSER_USERNAME", "root"),
            ("SUPERUSER_EMAIL", "root@example.com"),
            ("SUPERUSER_PASSWORD", "changeme"),
        ]))
        .unwrap();
        let seed = config.superuser.unwrap();
        assert_eq!(seed.username, "root");
        assert!(!format!("{seed:?}").contains("changeme"));
    }
}
