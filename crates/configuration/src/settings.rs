use rust_decimal::Decimal;
use serde::Deserialize;
use std::env;

use crate::error::ConfigError;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub trading: Trading,
    pub risk_limits: RiskLimits,
}

/// Venue and instrument defaults for the trading commands.
#[derive(Debug, Clone, Deserialize)]
pub struct Trading {
    /// The exchange the tool trades on (e.g. "binance"). Informational; the
    /// only supported venue today is Binance spot.
    pub venue: String,
    /// The currency all prices and sizing are denominated in (e.g. "USDT").
    pub quote_asset: String,
    /// Symbols the portfolio and diagnostics commands report on.
    pub symbols: Vec<String>,
    /// Valuations at or below this many quote units are treated as dust and
    /// excluded from the portfolio report.
    pub dust_threshold: Decimal,
}

/// Account-level risk limits. These are read and surfaced by the diagnostics
/// but not enforced by the executor.
#[derive(Debug, Clone, Deserialize)]
pub struct RiskLimits {
    /// Largest single order, in quote-currency units.
    pub max_order_size: Decimal,
    /// Maximum tolerated loss, in quote-currency units.
    pub max_loss: Decimal,
    /// Gain at which the operator intends to take profit.
    pub max_gain: Decimal,
    /// Minimum quote balance to keep untouched.
    pub min_balance: Decimal,
}

impl Config {
    /// Sanity-checks values the deserializer cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trading.symbols.is_empty() {
            return Err(ConfigError::ValidationError(
                "trading.symbols must list at least one symbol".to_string(),
            ));
        }
        if self.trading.dust_threshold.is_sign_negative() {
            return Err(ConfigError::ValidationError(
                "trading.dust_threshold must not be negative".to_string(),
            ));
        }
        for (name, value) in [
            ("max_order_size", self.risk_limits.max_order_size),
            ("max_loss", self.risk_limits.max_loss),
            ("max_gain", self.risk_limits.max_gain),
            ("min_balance", self.risk_limits.min_balance),
        ] {
            if value.is_sign_negative() {
                return Err(ConfigError::ValidationError(format!(
                    "risk_limits.{} must not be negative",
                    name
                )));
            }
        }
        Ok(())
    }
}

/// API credentials and endpoint selection, sourced from the environment.
///
/// Loaded explicitly by the caller rather than at module load time, so tests
/// and multi-account setups can construct their own.
#[derive(Debug, Clone)]
pub struct ApiCredentials {
    pub api_key: String,
    pub api_secret: String,
    /// When true, all requests go to the Binance spot testnet.
    pub testnet: bool,
}

impl ApiCredentials {
    /// Reads `BINANCE_API_KEY`, `BINANCE_SECRET_KEY` and `BINANCE_TESTNET`
    /// from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = env::var("BINANCE_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("BINANCE_API_KEY".to_string()))?;
        let api_secret = env::var("BINANCE_SECRET_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("BINANCE_SECRET_KEY".to_string()))?;
        let testnet = env::var("BINANCE_TESTNET")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        Ok(Self {
            api_key,
            api_secret,
            testnet,
        })
    }

    /// Masks a secret for display: first 8 and last 4 characters only.
    pub fn masked(value: &str) -> String {
        if value.len() <= 12 {
            return "*".repeat(value.len());
        }
        format!("{}...{}", &value[..8], &value[value.len() - 4..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_config() -> Config {
        Config {
            trading: Trading {
                venue: "binance".to_string(),
                quote_asset: "USDT".to_string(),
                symbols: vec!["BTCUSDT".to_string(), "ETHUSDT".to_string()],
                dust_threshold: dec!(0.01),
            },
            risk_limits: RiskLimits {
                max_order_size: dec!(1000),
                max_loss: dec!(50),
                max_gain: dec!(200),
                min_balance: dec!(100),
            },
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(sample_config().validate().is_ok());
    }

    #[test]
    fn empty_symbol_list_fails() {
        let mut config = sample_config();
        config.trading.symbols.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn negative_risk_limit_fails() {
        let mut config = sample_config();
        config.risk_limits.max_loss = dec!(-1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn masking_keeps_only_edges() {
        let masked = ApiCredentials::masked("abcdefgh123456789xyz");
        assert_eq!(masked, "abcdefgh...9xyz");
        assert_eq!(ApiCredentials::masked("short"), "*****");
    }
}
