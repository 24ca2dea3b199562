use api_client::error::ApiError;
use core_types::CoreError;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutorError {
    /// A price lookup failed or returned nothing usable; the dependent order
    /// was never submitted.
    #[error("No usable price for {symbol}: {reason}")]
    PriceUnavailable { symbol: String, reason: String },

    /// The computed sell quantity normalized to zero.
    #[error("Insufficient {asset} balance to sell (available: {available})")]
    InsufficientBalance { asset: String, available: Decimal },

    /// The computed buy quantity normalized to zero.
    #[error("Order quantity for {symbol} rounds to zero at the exchange step size")]
    ZeroQuantity { symbol: String },

    #[error("Limit price must be positive, got {0}")]
    InvalidPrice(Decimal),

    #[error("Invalid order amount: {0}")]
    InvalidAmount(String),

    #[error(transparent)]
    Symbol(#[from] CoreError),

    /// Exchange rejection or transport failure, surfaced verbatim. Neither
    /// is retried.
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}
