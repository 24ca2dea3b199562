use crate::error::ConfigError;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{ApiCredentials, Config, RiskLimits, Trading};

/// Loads the application configuration from the `config.toml` file.
///
/// This function is the primary entry point for this crate. It reads the
/// configuration file, layers `APP_`-prefixed environment variables on top,
/// deserializes the result into our strongly-typed `Config` struct, and
/// validates it.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from("config.toml")
}

/// Same as [`load_config`], but from an explicit path. Used by the
/// diagnostics command so it can report which file it checked.
pub fn load_config_from(path: &str) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::with_name(path))
        // Environment variables override the file, e.g. APP_TRADING__QUOTE_ASSET.
        .add_source(config::Environment::with_prefix("APP").separator("__"))
        .build()?;

    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;

    Ok(config)
}
