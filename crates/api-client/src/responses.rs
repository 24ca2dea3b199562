use core_types::{Balance, Fill, OrderSide, OrderType};
use rust_decimal::Decimal;
use serde::Deserialize;

// Using `#[serde(rename_all = "camelCase")]` to automatically map from JSON camelCase to Rust snake_case.
// Binance encodes all decimal values as JSON strings; `rust_decimal`'s serde
// support parses them directly.

/// The response from `GET /api/v3/account`.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountResponse {
    pub balances: Vec<BalanceEntry>,
}

/// A single asset's balance within the account snapshot.
#[derive(Debug, Clone, Deserialize)]
pub struct BalanceEntry {
    pub asset: String,
    pub free: Decimal,
    pub locked: Decimal,
}

impl From<BalanceEntry> for Balance {
    fn from(entry: BalanceEntry) -> Self {
        Balance {
            asset: entry.asset,
            free: entry.free,
            locked: entry.locked,
        }
    }
}

/// The response from `GET /api/v3/ticker/price`.
#[derive(Debug, Clone, Deserialize)]
pub struct PriceTicker {
    pub symbol: String,
    pub price: Decimal,
}

/// The response from `GET /api/v3/ticker/24hr`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticker24h {
    pub last_price: Decimal,
    pub price_change_percent: Decimal,
    pub high_price: Decimal,
    pub low_price: Decimal,
    pub volume: Decimal,
}

/// The response from `GET /api/v3/time`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerTimeResponse {
    pub server_time: i64,
}

/// The response from `GET /api/v3/exchangeInfo`, reduced to what we consume.
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeInfoResponse {
    pub symbols: Vec<SymbolInfo>,
}

/// Per-symbol trading rules from the exchange info endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct SymbolInfo {
    pub symbol: String,
    pub filters: Vec<SymbolFilter>,
}

/// One entry of a symbol's filter list. Binance publishes many filter kinds;
/// only LOT_SIZE carries a field we read, so the rest deserialize with
/// `step_size: None`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolFilter {
    pub filter_type: String,
    #[serde(default)]
    pub step_size: Option<Decimal>,
}

impl SymbolInfo {
    /// Walks the filter list for the LOT_SIZE step size, if present.
    pub fn lot_step_size(&self) -> Option<Decimal> {
        self.filters
            .iter()
            .find(|f| f.filter_type == "LOT_SIZE")
            .and_then(|f| f.step_size)
    }
}

/// The full response from a successful `POST /api/v3/order` request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderAck {
    pub order_id: i64,
    pub client_order_id: String,
    pub symbol: String,
    pub status: String,
    pub side: OrderSide,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub orig_qty: Decimal,
    pub executed_qty: Decimal,
    pub price: Decimal,
    /// Only MARKET orders fill immediately; LIMIT acks omit this field.
    #[serde(default)]
    pub fills: Vec<FillEntry>,
}

/// One execution within an order acknowledgement.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillEntry {
    pub price: Decimal,
    pub qty: Decimal,
    pub commission: Decimal,
    pub commission_asset: String,
}

impl From<FillEntry> for Fill {
    fn from(entry: FillEntry) -> Self {
        Fill {
            price: entry.price,
            quantity: entry.qty,
            commission: entry.commission,
            commission_asset: entry.commission_asset,
        }
    }
}

/// The response from `DELETE /api/v3/order`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelAck {
    pub symbol: String,
    pub order_id: i64,
    pub status: String,
}

/// One order from `GET /api/v3/openOrders` or `GET /api/v3/allOrders`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub symbol: String,
    pub order_id: i64,
    pub side: OrderSide,
    #[serde(rename = "type")]
    pub order_type: String,
    pub price: Decimal,
    pub orig_qty: Decimal,
    pub executed_qty: Decimal,
    pub status: String,
    /// Order creation time in epoch milliseconds.
    pub time: i64,
}

/// Represents an error response from the Binance API.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub code: i64,
    pub msg: String,
}
