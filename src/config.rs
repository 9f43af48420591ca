//! Job configuration, read from the environment.

use std::{path::PathBuf, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::BatchError;

/// Environment key of the source directory.
pub const SOURCE_DIR_KEY: &str = "GEODATA_TEST_DIR";

/// Default destination table.
pub const DEFAULT_TABLE: &str = "test_address";

/// Default file name prefix of the address files.
pub const DEFAULT_FILE_PREFIX: &str = "match_building";

/// Default file name suffix of the address files.
pub const DEFAULT_FILE_SUFFIX: &str = "txt";

/// Default commit interval: one record per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 1;

/// Default number of tolerated read/write errors.
pub const DEFAULT_SKIP_LIMIT: usize = 0;

/// Default location of the restart cursor.
pub const DEFAULT_CURSOR_PATH: &str = "address_job.cursor.json";

/// Default maximum database connections in the pool.
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 5;

/// Address import configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Directory scanned for address files.
    pub source_dir: PathBuf,
    pub file_prefix: String,
    pub file_suffix: String,
    pub database: DatabaseConfig,
    pub table: String,
    pub chunk_size: usize,
    pub skip_limit: usize,
    /// Restart cursor file, `None` when restart is disabled.
    pub cursor_path: Option<PathBuf>,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl BatchConfig {
    /// Load configuration from a `.env` file, the environment and defaults
    pub fn load() -> Result<Self, BatchError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from `lookup`, which returns the value of a
    /// key when it is set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, BatchError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| BatchError::Configuration(format!("{} is not set", key)))
        };

        let restartable: bool = parse_or(&lookup, "ADDRESS_RESTARTABLE", true)?;
        let cursor_path = restartable.then(|| {
            PathBuf::from(
                lookup("ADDRESS_CURSOR_PATH").unwrap_or_else(|| DEFAULT_CURSOR_PATH.to_string()),
            )
        });

        let config = BatchConfig {
            source_dir: PathBuf::from(required(SOURCE_DIR_KEY)?),
            file_prefix: lookup("ADDRESS_FILE_PREFIX")
                .unwrap_or_else(|| DEFAULT_FILE_PREFIX.to_string()),
            file_suffix: lookup("ADDRESS_FILE_SUFFIX")
                .unwrap_or_else(|| DEFAULT_FILE_SUFFIX.to_string()),
            database: DatabaseConfig {
                url: required("DATABASE_URL")?,
                max_connections: parse_or(
                    &lookup,
                    "DATABASE_MAX_CONNECTIONS",
                    DEFAULT_DATABASE_MAX_CONNECTIONS,
                )?,
            },
            table: lookup("ADDRESS_TABLE").unwrap_or_else(|| DEFAULT_TABLE.to_string()),
            chunk_size: parse_or(&lookup, "ADDRESS_CHUNK_SIZE", DEFAULT_CHUNK_SIZE)?,
            skip_limit: parse_or(&lookup, "ADDRESS_SKIP_LIMIT", DEFAULT_SKIP_LIMIT)?,
            cursor_path,
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), BatchError> {
        if self.table.trim().is_empty() {
            return Err(BatchError::Configuration(
                "ADDRESS_TABLE cannot be empty".to_string(),
            ));
        }

        if !is_table_name(&self.table) {
            return Err(BatchError::Configuration(format!(
                "ADDRESS_TABLE '{}' is not a valid table name",
                self.table
            )));
        }

        if self.chunk_size == 0 {
            return Err(BatchError::Configuration(
                "ADDRESS_CHUNK_SIZE must be greater than 0".to_string(),
            ));
        }

        if self.database.max_connections == 0 {
            return Err(BatchError::Configuration(
                "DATABASE_MAX_CONNECTIONS must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// `table` or `schema.table`, each part made of ASCII letters, digits and
/// underscores and not starting with a digit.
fn is_table_name(name: &str) -> bool {
    let parts: Vec<&str> = name.split('.').collect();
    parts.len() <= 2
        && parts.iter().all(|part| {
            let mut chars = part.chars();
            chars
                .next()
                .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, BatchError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e| BatchError::Configuration(format!("invalid {} '{}': {}", key, value, e))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, path::PathBuf};

    use super::{BatchConfig, DEFAULT_CURSOR_PATH};
    use crate::BatchError;

    fn load(pairs: &[(&str, &str)]) -> Result<BatchConfig, BatchError> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        BatchConfig::from_lookup(|key| values.get(key).cloned())
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("GEODATA_TEST_DIR", "/data/geodata"),
        ("DATABASE_URL", "mysql://localhost/geodata"),
    ];

    #[test]
    fn defaults_follow_the_address_job() {
        let config = load(&REQUIRED).unwrap();

        assert_eq!(config.source_dir, PathBuf::from("/data/geodata"));
        assert_eq!(config.file_prefix, "match_building");
        assert_eq!(config.file_suffix, "txt");
        assert_eq!(config.table, "test_address");
        assert_eq!(config.chunk_size, 1);
        assert_eq!(config.skip_limit, 0);
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.cursor_path, Some(PathBuf::from(DEFAULT_CURSOR_PATH)));
    }

    #[test]
    fn overrides_are_applied() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("ADDRESS_TABLE", "address"),
            ("ADDRESS_CHUNK_SIZE", "500"),
            ("ADDRESS_SKIP_LIMIT", "3"),
            ("ADDRESS_CURSOR_PATH", "/var/lib/address/cursor.json"),
        ]);

        let config = load(&pairs).unwrap();

        assert_eq!(config.table, "address");
        assert_eq!(config.chunk_size, 500);
        assert_eq!(config.skip_limit, 3);
        assert_eq!(
            config.cursor_path,
            Some(PathBuf::from("/var/lib/address/cursor.json"))
        );
    }

    #[test]
    fn restart_can_be_disabled() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("ADDRESS_RESTARTABLE", "false"));

        assert_eq!(load(&pairs).unwrap().cursor_path, None);
    }

    #[test]
    fn missing_source_dir_is_a_configuration_error() {
        let result = load(&[("DATABASE_URL", "mysql://localhost/geodata")]);

        match result {
            Err(BatchError::Configuration(msg)) => assert!(msg.contains("GEODATA_TEST_DIR")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn table_must_be_a_plain_identifier() {
        for table in ["geodata.test_address", "_address", "address_2024"] {
            let mut pairs = REQUIRED.to_vec();
            pairs.push(("ADDRESS_TABLE", table));
            assert_eq!(load(&pairs).unwrap().table, table);
        }

        for table in [
            "test_address; DROP TABLE test_address",
            "test address",
            "`test_address`",
            "1address",
            "a.b.c",
            "geodata.",
        ] {
            let mut pairs = REQUIRED.to_vec();
            pairs.push(("ADDRESS_TABLE", table));
            assert!(
                matches!(load(&pairs), Err(BatchError::Configuration(_))),
                "{} was accepted",
                table
            );
        }
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("ADDRESS_CHUNK_SIZE", "0"));

        assert!(matches!(load(&pairs), Err(BatchError::Configuration(_))));
    }

    #[test]
    fn unparsable_number_is_rejected() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("ADDRESS_SKIP_LIMIT", "many"));

        assert!(matches!(load(&pairs), Err(BatchError::Configuration(_))));
    }
}
