//! Configuration management

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use config::{builder::DefaultState, Config as ConfigBuilder, ConfigBuilder as Builder, ConfigError as BuilderError, Environment, File};
use clap::Parser;

/// Signing secret used when none is configured. Development only.
pub const INSECURE_DEFAULT_SECRET: &str = "CHANGE-ME-insecure-development-secret";

/// Lowest bcrypt cost accepted from configuration
pub const MIN_BCRYPT_COST: u32 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid server configuration: {0}")]
    InvalidServer(String),

    #[error("Invalid database configuration: {0}")]
    InvalidDatabase(String),

    #[error("Invalid logging configuration: {0}")]
    InvalidLogging(String),

    #[error("Invalid security configuration: {0}")]
    InvalidSecurity(String),

    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),
}

impl From<BuilderError> for ConfigError {
    fn from(err: BuilderError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
}

impl Config {
    /// Load configuration with precedence: CLI args > Environment variables > Config file > Defaults
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(CliArgs::parse())
    }

    /// Load configuration using already-parsed command-line arguments
    pub fn load_from(cli_args: CliArgs) -> Result<Self, ConfigError> {
        // 1. Defaults (lowest priority)
        let mut builder = with_defaults(ConfigBuilder::builder())?;

        // 2. Config file (medium priority)
        if let Some(config_path) = &cli_args.config {
            if !config_path.exists() {
                return Err(ConfigError::FileNotFound(
                    config_path.display().to_string()
                ));
            }
            builder = builder.add_source(File::from(config_path.as_path()));
        }

        // 3. Environment variables, e.g. SHOPLIST_SERVER__PORT=8080
        builder = builder.add_source(
            Environment::with_prefix("SHOPLIST")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
        );

        // Plain variables older deployments already export
        builder = with_legacy_env(builder, |key| std::env::var(key).ok())?;

        // 4. CLI arguments (highest priority)
        if let Some(host) = &cli_args.host {
            builder = builder.set_override("server.host", host.clone())?;
        }
        if let Some(port) = cli_args.port {
            builder = builder.set_override("server.port", port)?;
        }
        if let Some(db_path) = &cli_args.database {
            builder = builder.set_override("database.path", db_path.display().to_string())?;
        }
        if let Some(log_level) = &cli_args.log_level {
            builder = builder.set_override("logging.level", log_level.clone())?;
        }

        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file path, on top of the defaults
    #[cfg(test)]
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let config: Config = with_defaults(ConfigBuilder::builder())?
            .add_source(File::from(path))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Built-in defaults only
    #[cfg(test)]
    pub fn defaults() -> Result<Self, ConfigError> {
        let config: Config = with_defaults(ConfigBuilder::builder())?
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.database.validate()?;
        self.logging.validate()?;
        self.security.validate()?;
        Ok(())
    }
}

fn with_defaults(builder: Builder<DefaultState>) -> Result<Builder<DefaultState>, ConfigError> {
    Ok(builder
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 5050)?
        .set_default("database.path", "./data/shopping_list.db")?
        .set_default("database.connection_pool_size", 10)?
        .set_default("database.busy_timeout", 5000)?
        .set_default("logging.level", "info")?
        .set_default("logging.format", "json")?
        .set_default("logging.output", "stdout")?
        .set_default("logging.max_file_size", 10485760)? // 10 MB
        .set_default("logging.max_backups", 5)?
        .set_default("security.jwt_secret", "")?
        .set_default("security.bcrypt_cost", MIN_BCRYPT_COST as i64)?
        .set_default("security.allowed_origins", vec!["*"])?
        .set_default("security.enable_hsts", false)?
        .set_default("security.hsts_max_age", 31536000)?)
}

fn with_legacy_env<F>(mut builder: Builder<DefaultState>, lookup: F) -> Result<Builder<DefaultState>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(port) = lookup("PORT").and_then(|p| p.parse::<u16>().ok()) {
        builder = builder.set_override("server.port", port)?;
    }
    if let Some(secret) = lookup("JWT_SECRET") {
        builder = builder.set_override("security.jwt_secret", secret)?;
    }
    if let Some(path) = lookup("DB_PATH") {
        builder = builder.set_override("database.path", path)?;
    }
    Ok(builder)
}

/// Command-line arguments for configuration override
#[derive(Debug, Default, Parser)]
#[command(name = "shoplist-server")]
#[command(about = "Shopping list REST backend", long_about = None)]
pub struct CliArgs {
    /// Path to configuration file (TOML format)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Server host address
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Server port
    #[arg(short, long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Database file path
    #[arg(short, long, value_name = "PATH")]
    pub database: Option<PathBuf>,

    /// Log level (debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::InvalidServer("host cannot be empty".to_string()));
        }

        if self.port == 0 {
            return Err(ConfigError::InvalidServer("port must be greater than 0".to_string()));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub connection_pool_size: usize,
    pub busy_timeout: u64, // milliseconds
}

impl DatabaseConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidDatabase("path cannot be empty".to_string()));
        }

        if self.connection_pool_size == 0 {
            return Err(ConfigError::InvalidDatabase("connection_pool_size must be greater than 0".to_string()));
        }

        if self.busy_timeout == 0 {
            return Err(ConfigError::InvalidDatabase("busy_timeout must be greater than 0".to_string()));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub output: String,
    pub log_file: Option<PathBuf>,
    pub max_file_size: usize, // bytes
    pub max_backups: usize,
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_levels = ["debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.level.as_str()) {
            return Err(ConfigError::InvalidLogging(
                format!("level must be one of: {:?}", valid_levels)
            ));
        }

        let valid_formats = ["json", "text"];
        if !valid_formats.contains(&self.format.as_str()) {
            return Err(ConfigError::InvalidLogging(
                format!("format must be one of: {:?}", valid_formats)
            ));
        }

        let valid_outputs = ["stdout", "file"];
        if !valid_outputs.contains(&self.output.as_str()) {
            return Err(ConfigError::InvalidLogging(
                format!("output must be one of: {:?}", valid_outputs)
            ));
        }

        if self.output == "file" && self.log_file.is_none() {
            return Err(ConfigError::InvalidLogging(
                "log_file must be specified when output is 'file'".to_string()
            ));
        }

        if self.max_file_size == 0 {
            return Err(ConfigError::InvalidLogging("max_file_size must be greater than 0".to_string()));
        }

        if self.max_backups == 0 {
            return Err(ConfigError::InvalidLogging("max_backups must be greater than 0".to_string()));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub bcrypt_cost: u32,
    pub allowed_origins: Vec<String>,
    pub enable_hsts: bool,
    pub hsts_max_age: u64, // seconds
}

impl SecurityConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_BCRYPT_COST..=31).contains(&self.bcrypt_cost) {
            return Err(ConfigError::InvalidSecurity(
                format!("bcrypt_cost must be between {} and 31", MIN_BCRYPT_COST)
            ));
        }

        if self.allowed_origins.is_empty() {
            return Err(ConfigError::InvalidSecurity("allowed_origins cannot be empty".to_string()));
        }

        if self.enable_hsts && self.hsts_max_age == 0 {
            return Err(ConfigError::InvalidSecurity("hsts_max_age must be greater than 0 when enable_hsts is true".to_string()));
        }

        Ok(())
    }

    /// True when no signing secret was configured
    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret.is_empty()
    }

    /// Secret handed to the token service
    pub fn signing_secret(&self) -> &str {
        if self.uses_default_secret() {
            INSECURE_DEFAULT_SECRET
        } else {
            &self.jwt_secret
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::defaults().unwrap();

        assert_eq!(config.server.port, 5050);
        assert_eq!(config.security.bcrypt_cost, 10);
        assert!(config.security.uses_default_secret());
        assert_eq!(config.security.signing_secret(), INSECURE_DEFAULT_SECRET);
    }

    #[test]
    fn test_from_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[server]\nport = 8081\n\n[security]\njwt_secret = \"file-secret\"\nbcrypt_cost = 12"
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();

        assert_eq!(config.server.port, 8081);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.security.signing_secret(), "file-secret");
        assert_eq!(config.security.bcrypt_cost, 12);
    }

    #[test]
    fn test_missing_file() {
        let result = Config::from_file(Path::new("/definitely/not/here.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_legacy_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("PORT", "6060"),
            ("JWT_SECRET", "legacy-secret"),
            ("DB_PATH", "/tmp/legacy.db"),
        ]
        .into_iter()
        .collect();

        let builder = with_defaults(ConfigBuilder::builder()).unwrap();
        let config: Config = with_legacy_env(builder, |key| vars.get(key).map(|v| v.to_string()))
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.server.port, 6060);
        assert_eq!(config.security.jwt_secret, "legacy-secret");
        assert_eq!(config.database.path, PathBuf::from("/tmp/legacy.db"));
    }

    #[test]
    fn test_prefixed_env_overrides() {
        std::env::set_var("SHOPLIST_SERVER__HOST", "0.0.0.0");
        std::env::set_var("SHOPLIST_SERVER__PORT", "8089");
        std::env::set_var("SHOPLIST_SECURITY__BCRYPT_COST", "12");

        let config = Config::load_from(CliArgs::default());

        std::env::remove_var("SHOPLIST_SERVER__HOST");
        std::env::remove_var("SHOPLIST_SERVER__PORT");
        std::env::remove_var("SHOPLIST_SECURITY__BCRYPT_COST");

        let config = config.unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        // A plain PORT variable outranks the prefixed one
        if std::env::var("PORT").is_err() {
            assert_eq!(config.server.port, 8089);
        }
        assert_eq!(config.security.bcrypt_cost, 12);
    }

    #[test]
    fn test_cli_overrides_prefixed_env() {
        std::env::set_var("SHOPLIST_LOGGING__LEVEL", "warn");

        let config = Config::load_from(CliArgs {
            log_level: Some("debug".to_string()),
            ..Default::default()
        });

        std::env::remove_var("SHOPLIST_LOGGING__LEVEL");

        assert_eq!(config.unwrap().logging.level, "debug");
    }

    #[test]
    fn test_low_bcrypt_cost_rejected() {
        let mut config = Config::defaults().unwrap();
        config.security.bcrypt_cost = 4;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidSecurity(_))));
    }

    #[test]
    fn test_file_output_requires_log_file() {
        let mut config = Config::defaults().unwrap();
        config.logging.output = "file".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidLogging(_))));

        config.logging.log_file = Some(PathBuf::from("./logs/shoplist.log"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_server() {
        let mut config = Config::defaults().unwrap();
        config.server.port = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidServer(_))));
    }
}
