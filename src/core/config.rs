//! # Configuration Module
//!
//! Loads the service configuration from an optional `.env` file and the process
//! environment. Every field has a default, so an empty environment yields a usable
//! development configuration.
//!
//! ## Key Features
//! - Defaults for every field through `Default`
//! - `.env` loading with `dotenvy` (missing file is not an error)
//! - Environment variable overrides (`PORT`, `LOG_LEVEL`, `DATABASE_HOST`, ...)
//! - Validation with all problems reported at once

use crate::core::error::{ToolkitError, ToolkitResult};
use crate::observability::Level;
use serde::{Deserialize, Serialize};

/// Top-level service configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Deployment environment name (`dev`, `staging`, `prod`, ...)
    pub env: String,

    /// HTTP listen port
    pub port: String,

    /// API version, used as the route prefix by the binary
    pub version: String,

    /// Minimum log level name
    pub log_level: String,

    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub kafka: KafkaConfig,
}

/// Relational database connection parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub kind: String,
    pub host: String,
    pub port: String,
    pub username: String,
    pub password: String,
    pub name: String,
    pub ssl: String,
}

/// Redis connection parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedisConfig {
    pub host: String,
    pub port: String,
    pub password: String,
}

/// Kafka connection parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KafkaConfig {
    pub host: String,
    pub port: String,
    pub topics: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            env: "dev".to_string(),
            port: "8080".to_string(),
            version: "v1".to_string(),
            log_level: "debug".to_string(),
            database: DatabaseConfig::default(),
            redis: RedisConfig::default(),
            kafka: KafkaConfig::default(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            kind: "mysql".to_string(),
            host: "localhost".to_string(),
            port: "3306".to_string(),
            username: "root".to_string(),
            password: "root".to_string(),
            name: "schema".to_string(),
            ssl: "DISABLED".to_string(),
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: "6379".to_string(),
            password: String::new(),
        }
    }
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: "9092".to_string(),
            topics: vec!["test1".to_string(), "test2".to_string()],
        }
    }
}

impl Config {
    /// Load configuration from `.env` (if present) and the process environment
    pub fn load() -> ToolkitResult<Self> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(ToolkitError::invalid_input(format!("Failed to read .env file: {}", e)));
            }
        }

        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup
    ///
    /// Variables follow the flat naming scheme `PORT`, `DATABASE_HOST`, `KAFKA_TOPIC_NAME`, ...
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let set = |target: &mut String, key: &str| {
            if let Some(value) = lookup(key) {
                *target = value;
            }
        };

        set(&mut self.env, "ENV");
        set(&mut self.port, "PORT");
        set(&mut self.version, "VERSION");
        set(&mut self.log_level, "LOG_LEVEL");

        set(&mut self.database.kind, "DATABASE_TYPE");
        set(&mut self.database.host, "DATABASE_HOST");
        set(&mut self.database.port, "DATABASE_PORT");
        set(&mut self.database.username, "DATABASE_USER");
        set(&mut self.database.password, "DATABASE_PASSWORD");
        set(&mut self.database.name, "DATABASE_NAME");
        set(&mut self.database.ssl, "DATABASE_SSL");

        set(&mut self.redis.host, "REDIS_HOST");
        set(&mut self.redis.port, "REDIS_PORT");
        set(&mut self.redis.password, "REDIS_PASSWORD");

        set(&mut self.kafka.host, "KAFKA_HOST");
        set(&mut self.kafka.port, "KAFKA_PORT");
        if let Some(topics) = lookup("KAFKA_TOPIC_NAME") {
            self.kafka.topics = topics
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect();
        }
    }

    /// Validate the configuration, reporting every problem in one error
    pub fn validate(&self) -> ToolkitResult<()> {
        let mut errors = Vec::new();

        if self.port.is_empty() {
            errors.push("PORT cannot be empty".to_string());
        }

        for (name, value) in [
            ("PORT", &self.port),
            ("DATABASE_PORT", &self.database.port),
            ("REDIS_PORT", &self.redis.port),
            ("KAFKA_PORT", &self.kafka.port),
        ] {
            if !value.is_empty() && value.parse::<u16>().is_err() {
                errors.push(format!("{} must be a port number, got '{}'", name, value));
            }
        }

        if let Err(e) = self.log_level.parse::<Level>() {
            errors.push(e.to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ToolkitError::invalid_input(errors.join("; ")))
        }
    }

    /// Parsed minimum log level
    pub fn level(&self) -> ToolkitResult<Level> {
        self.log_level.parse()
    }
}
