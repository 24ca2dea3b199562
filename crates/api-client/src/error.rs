use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Network or HTTP-level failure reaching the exchange.
    #[error("Transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// An application-level error reported by the exchange. The message is
    /// preserved verbatim.
    #[error("Exchange rejected the request (code {code}): {msg}")]
    Exchange { code: i64, msg: String },

    #[error("Failed to deserialize the API response: {0}")]
    Deserialization(String),

    #[error("Invalid data format from API: {0}")]
    InvalidData(String),
}
