// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Server configuration module
//!
//! This module provides configuration structures and loading logic for the
//! accounts API process: listener addresses, the debug listener toggle, the
//! shutdown grace period and logging output.

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    time::Duration,
};

use anyhow::{Result, ensure};
use config::{
    Config, ConfigBuilder, ConfigError, Environment as ConfigEnv, File, builder::DefaultState,
};
use serde::{Deserialize, Deserializer, Serialize, de};

use crate::error::{ServerError, ServerResult};

const ENV_PREFIX: &str = "ACCOUNTS";
const DEFAULT_API_PORT: u16 = 8080;
const DEFAULT_DEBUG_PORT: u16 = 8090;
const MAX_SHUTDOWN_TIMEOUT_SECONDS: u64 = 300;

/// Grace period given to in-flight requests on shutdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShutdownTimeout(Duration);

impl ShutdownTimeout {
    /// Create a new `ShutdownTimeout`, ensuring the value is within valid bounds
    ///
    /// # Errors
    ///
    /// Returns an error if timeout is 0 or greater than 300 seconds
    pub fn new(seconds: u64) -> Result<Self> {
        ensure!(seconds != 0, "shutdown timeout must be greater than 0");
        ensure!(
            seconds <= MAX_SHUTDOWN_TIMEOUT_SECONDS,
            "shutdown timeout cannot exceed {MAX_SHUTDOWN_TIMEOUT_SECONDS}"
        );
        Ok(Self(Duration::from_secs(seconds)))
    }

    /// Default grace period (5 seconds)
    pub const fn default_value() -> Self {
        Self(Duration::from_secs(5))
    }

    /// Short grace period for tests (1 second)
    pub const fn testing() -> Self {
        Self(Duration::from_secs(1))
    }

    /// Get the timeout duration
    pub fn value(&self) -> Duration {
        self.0
    }
}

impl<'de> Deserialize<'de> for ShutdownTimeout {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let seconds = u64::deserialize(deserializer)?;
        Self::new(seconds).map_err(|e| de::Error::custom(e.to_string()))
    }
}

impl Default for ShutdownTimeout {
    fn default() -> Self {
        Self::default_value()
    }
}

/// Environment types for configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Production environment
    Production,
    /// Development environment
    Development,
    /// Testing environment
    Testing,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per event
    #[default]
    Json,
    /// Human-readable lines
    Text,
}

/// Process configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address of the API listener
    pub api_host: SocketAddr,
    /// Address of the debug (metrics) listener
    pub debug_host: SocketAddr,
    /// Whether the debug listener runs
    pub enable_debug: bool,
    /// Grace period for in-flight requests on shutdown (validated range: 1-300)
    pub shutdown_timeout_seconds: ShutdownTimeout,
    /// Environment type
    pub environment: Environment,
    /// Log output format
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_host: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_API_PORT),
            debug_host: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_DEBUG_PORT),
            enable_debug: true,
            shutdown_timeout_seconds: ShutdownTimeout::default(),
            environment: Environment::Development,
            log_format: LogFormat::default(),
        }
    }
}

impl ServerConfig {
    /// Create configuration from environment variables and optional configuration files
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Config` if configuration is invalid or cannot be loaded.
    pub fn from_env() -> ServerResult<Self> {
        Self::load().map_err(|e| ServerError::Config {
            message: format!("failed to load configuration: {e}"),
        })
    }

    /// Load configuration using the config crate with hierarchical sources
    ///
    /// Configuration is loaded in the following order (later sources override earlier ones):
    /// 1. Default values
    /// 2. Configuration file (config.json)
    /// 3. Environment-specific files (config.{env}.json)
    /// 4. Environment variables with `ACCOUNTS_` prefix, e.g. `ACCOUNTS_API_HOST`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let env_var = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let mut config_builder = Self::defaults()?
            .add_source(File::with_name("config.json").required(false))
            .add_source(
                File::with_name(&format!("config.{}.json", env_var.to_lowercase())).required(false),
            )
            .add_source(ConfigEnv::with_prefix(ENV_PREFIX).try_parsing(true));

        if std::env::var("ENVIRONMENT").is_ok() {
            config_builder = config_builder.set_override("environment", env_var.to_lowercase())?;
        }

        Self::from_builder(config_builder)
    }

    /// Builder pre-populated with the default values
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a default cannot be set.
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let defaults = Self::default();
        Config::builder()
            .set_default("api_host", defaults.api_host.to_string())?
            .set_default("debug_host", defaults.debug_host.to_string())?
            .set_default("enable_debug", defaults.enable_debug)?
            .set_default(
                "shutdown_timeout_seconds",
                defaults.shutdown_timeout_seconds.value().as_secs(),
            )?
            .set_default("environment", defaults.environment.to_string())?
            .set_default("log_format", "json")
    }

    /// Build and validate configuration from `builder`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the sources cannot be read, a value has the
    /// wrong type, or the result fails [`ServerConfig::validate`].
    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let server_config: Self = builder.build()?.try_deserialize()?;
        server_config
            .validate()
            .map_err(|e| ConfigError::Message(format!("invalid configuration: {e}")))?;
        Ok(server_config)
    }

    /// Check cross-field constraints
    ///
    /// # Errors
    ///
    /// Returns an error if the debug listener is enabled on the API address.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            !self.enable_debug
                || self.api_host.port() == 0
                || self.api_host != self.debug_host,
            "api_host and debug_host must differ when the debug listener is enabled"
        );
        Ok(())
    }

    /// Create configuration optimized for testing
    pub fn for_testing() -> Self {
        Self {
            api_host: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0),
            debug_host: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0),
            enable_debug: false,
            shutdown_timeout_seconds: ShutdownTimeout::testing(),
            environment: Environment::Testing,
            log_format: LogFormat::Text,
        }
    }

    /// Grace period for in-flight requests on shutdown
    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout_seconds.value()
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Production => write!(f, "production"),
            Environment::Development => write!(f, "development"),
            Environment::Testing => write!(f, "testing"),
        }
    }
}
