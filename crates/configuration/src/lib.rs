use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use settings::{
    AlertConfig, AlertThresholds, Bands, Config, DatabaseConfig, ImfConfig, LoggingConfig,
    RiskConfig, RiskThresholds, ServerConfig, SourcesConfig, StoreBackend, SyncConfig,
    WorldBankConfig,
};

/// Prefix of the environment variables that override file settings,
/// e.g. `ECONWATCH__SYNC__INTER_SOURCE_DELAY_SECS=10`.
pub const ENV_PREFIX: &str = "ECONWATCH";

/// Loads the application configuration.
///
/// Reads the TOML file at `path` (a missing file means "all defaults"), layers the
/// `ECONWATCH__*` environment variables on top, deserializes the result into our
/// strongly-typed `Config` struct and validates it.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from(path.as_ref()).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    finish(builder)
}

/// Parses configuration from an in-memory TOML document, without environment overrides.
pub fn load_config_from_str(toml: &str) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from_str(toml, config::FileFormat::Toml))
        .build()?;

    finish(builder)
}

fn finish(builder: config::Config) -> Result<Config, ConfigError> {
    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    config.validate().map_err(ConfigError::ValidationError)?;
    Ok(config)
}
