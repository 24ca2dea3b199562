use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Cannot derive base asset from symbol: {0}")]
    UnknownQuoteSuffix(String),
}
