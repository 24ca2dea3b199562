pub mod enums;
pub mod error;
pub mod structs;
pub mod symbols;

// Re-export the core types to provide a clean public API.
pub use enums::{OrderSide, OrderType};
pub use error::CoreError;
pub use structs::{
    AssetValue, Balance, Fill, Kline, OrderReceipt, OrderRequest, PortfolioSnapshot, TickerStats,
};
