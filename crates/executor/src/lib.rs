//! # Executor Crate
//!
//! This crate provides the core trading operations: order sizing, market and
//! limit order execution, order management, and portfolio valuation.
//!
//! ## Architectural Principles
//!
//! - **Explicit client injection:** Every component takes an
//!   `Arc<dyn ApiClient>` at construction. There is no process-global
//!   connection, which keeps the lifecycle in the caller's hands and lets
//!   tests substitute a fake exchange.
//! - **Stateless operations:** Each call re-fetches the balances, prices and
//!   symbol metadata it needs. There is no shared mutable state and therefore
//!   no locking; concurrent use across symbols is the caller's concern.
//! - **Fail before submission:** All sizing and validation happens before an
//!   order leaves the process. A quantity that rounds to zero, or a price
//!   that cannot be fetched, aborts the operation with a structured error and
//!   the exchange never sees the order.
//!
//! ## Public API
//!
//! - `Trader`: market/limit order execution and order management.
//! - `SellAmount`: percent-of-balance vs. absolute sell sizing.
//! - `PortfolioReporter`: account valuation in the quote currency.
//! - `normalize_quantity`: LOT_SIZE step truncation.
//! - `ExecutorError`: the specific error types returned from this crate.

// Declare the modules that constitute this crate.
pub mod error;
pub mod portfolio;
pub mod sizing;
pub mod trader;

// Re-export the key components to provide a clean, public-facing API.
pub use error::ExecutorError;
pub use portfolio::PortfolioReporter;
pub use sizing::normalize_quantity;
pub use trader::{SellAmount, Trader};
