use crate::auth::sign_request;
use crate::error::ApiError;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use configuration::ApiCredentials;
use core_types::{Balance, Kline, OrderRequest, OrderType, TickerStats};
use reqwest::header::{HeaderMap, HeaderValue};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

mod auth;
pub mod error;
pub mod responses;

// --- Public API ---
pub use responses::{
    AccountResponse, ApiErrorResponse, CancelAck, OrderAck, OrderSummary, PriceTicker, Ticker24h,
};

/// The generic, abstract interface for the exchange API.
///
/// This trait is the contract the executor and the CLI are written against,
/// allowing the underlying implementation (live or fake) to be swapped out.
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// Connectivity check. Succeeds iff the REST endpoint is reachable.
    async fn ping(&self) -> Result<(), ApiError>;

    /// The exchange's clock, used by the diagnostics to verify connectivity
    /// and clock skew.
    async fn server_time(&self) -> Result<DateTime<Utc>, ApiError>;

    /// All non-zero balances in the account. (Authenticated)
    async fn balances(&self) -> Result<Vec<Balance>, ApiError>;

    /// The free (unlocked) balance of a single asset; zero if the account
    /// holds none. (Authenticated)
    async fn free_balance(&self, asset: &str) -> Result<Decimal, ApiError>;

    /// Latest traded price for a symbol.
    async fn price(&self, symbol: &str) -> Result<Decimal, ApiError>;

    /// 24-hour rolling window statistics for a symbol.
    async fn ticker_24h(&self, symbol: &str) -> Result<TickerStats, ApiError>;

    /// The LOT_SIZE step size for a symbol, if the exchange publishes one.
    async fn lot_step_size(&self, symbol: &str) -> Result<Option<Decimal>, ApiError>;

    /// Places a new order on the exchange. (Authenticated)
    async fn place_order(&self, order: &OrderRequest) -> Result<OrderAck, ApiError>;

    /// Cancels an open order. (Authenticated)
    async fn cancel_order(&self, symbol: &str, order_id: i64) -> Result<CancelAck, ApiError>;

    /// Lists open orders, optionally filtered by symbol. (Authenticated)
    async fn open_orders(&self, symbol: Option<&str>) -> Result<Vec<OrderSummary>, ApiError>;

    /// Lists historical orders for a symbol, bounded by `limit`. The exchange
    /// returns them in ascending time order. (Authenticated)
    async fn all_orders(&self, symbol: &str, limit: u32) -> Result<Vec<OrderSummary>, ApiError>;

    /// Fetches up to `limit` candlesticks, ascending by open time.
    async fn klines(&self, symbol: &str, interval: &str, limit: u32)
        -> Result<Vec<Kline>, ApiError>;
}

/// A concrete implementation of the `ApiClient` for Binance spot.
#[derive(Clone)]
pub struct BinanceClient {
    client: reqwest::Client,
    base_url: String,
    api_secret: String,
}

impl BinanceClient {
    /// Builds a client from explicit credentials. The testnet flag selects
    /// the spot testnet endpoint instead of production.
    pub fn new(credentials: &ApiCredentials) -> Result<Self, ApiError> {
        let base_url = if credentials.testnet {
            "https://testnet.binance.vision".to_string()
        } else {
            "https://api.binance.com".to_string()
        };
        Self::with_base_url(credentials, base_url)
    }

    /// Same as [`BinanceClient::new`] with an explicit base URL.
    pub fn with_base_url(
        credentials: &ApiCredentials,
        base_url: String,
    ) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "X-MBX-APIKEY",
            HeaderValue::from_str(&credentials.api_key)
                .map_err(|e| ApiError::InvalidData(format!("Invalid API key: {}", e)))?,
        );

        Ok(Self {
            client: reqwest::Client::builder().default_headers(headers).build()?,
            base_url,
            api_secret: credentials.api_secret.clone(),
        })
    }

    fn signed_url(&self, path: &str, params: &mut BTreeMap<&str, String>) -> String {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before UNIX epoch")
            .as_millis();
        params.insert("timestamp", timestamp.to_string());

        let query_string = serde_qs::to_string(params).expect("query serialization cannot fail");
        let signature = sign_request(&self.api_secret, &query_string);

        format!(
            "{}{}?{}&signature={}",
            self.base_url, path, query_string, signature
        )
    }

    async fn decode_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            serde_json::from_str::<T>(&text).map_err(|e| ApiError::Deserialization(e.to_string()))
        } else {
            let api_error: ApiErrorResponse = serde_json::from_str(&text).map_err(|e| {
                ApiError::Deserialization(format!(
                    "Failed to deserialize error response: {}. Original text: {}",
                    e, text
                ))
            })?;
            Err(ApiError::Exchange {
                code: api_error.code,
                msg: api_error.msg,
            })
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.client.get(&url).query(query).send().await?;
        Self::decode_response(response).await
    }

    async fn get_signed<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &mut BTreeMap<&str, String>,
    ) -> Result<T, ApiError> {
        let url = self.signed_url(path, params);
        let response = self.client.get(&url).send().await?;
        Self::decode_response(response).await
    }

    async fn post_signed<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &mut BTreeMap<&str, String>,
    ) -> Result<T, ApiError> {
        let url = self.signed_url(path, params);
        let response = self.client.post(&url).send().await?;
        Self::decode_response(response).await
    }

    async fn delete_signed<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &mut BTreeMap<&str, String>,
    ) -> Result<T, ApiError> {
        let url = self.signed_url(path, params);
        let response = self.client.delete(&url).send().await?;
        Self::decode_response(response).await
    }
}

// Intermediate struct for deserializing klines from the Binance API.
#[derive(Deserialize)]
struct RawKline(
    i64,
    String,
    String,
    String,
    String,
    String,
    i64,
    String,
    i64,
    String,
    String,
    String,
);

fn parse_decimal(value: &str) -> Result<Decimal, ApiError> {
    value
        .parse::<Decimal>()
        .map_err(|e| ApiError::Deserialization(e.to_string()))
}

fn millis_to_datetime(millis: i64) -> Result<DateTime<Utc>, ApiError> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| ApiError::InvalidData(format!("Invalid timestamp: {}", millis)))
}

#[async_trait]
impl ApiClient for BinanceClient {
    async fn ping(&self) -> Result<(), ApiError> {
        // The ping endpoint returns an empty JSON object.
        let _: serde_json::Value = self.get("/api/v3/ping", &[]).await?;
        Ok(())
    }

    async fn server_time(&self) -> Result<DateTime<Utc>, ApiError> {
        let response: responses::ServerTimeResponse = self.get("/api/v3/time", &[]).await?;
        millis_to_datetime(response.server_time)
    }

    async fn balances(&self) -> Result<Vec<Balance>, ApiError> {
        let mut params = BTreeMap::new();
        let account: AccountResponse = self.get_signed("/api/v3/account", &mut params).await?;

        Ok(account
            .balances
            .into_iter()
            .map(Balance::from)
            .filter(|b| !b.total().is_zero())
            .collect())
    }

    async fn free_balance(&self, asset: &str) -> Result<Decimal, ApiError> {
        let mut params = BTreeMap::new();
        let account: AccountResponse = self.get_signed("/api/v3/account", &mut params).await?;

        Ok(account
            .balances
            .iter()
            .find(|b| b.asset == asset)
            .map(|b| b.free)
            .unwrap_or(Decimal::ZERO))
    }

    async fn price(&self, symbol: &str) -> Result<Decimal, ApiError> {
        let ticker: PriceTicker = self
            .get("/api/v3/ticker/price", &[("symbol", symbol.to_string())])
            .await?;
        Ok(ticker.price)
    }

    async fn ticker_24h(&self, symbol: &str) -> Result<TickerStats, ApiError> {
        let ticker: Ticker24h = self
            .get("/api/v3/ticker/24hr", &[("symbol", symbol.to_string())])
            .await?;
        Ok(TickerStats {
            price: ticker.last_price,
            change_percent: ticker.price_change_percent,
            high: ticker.high_price,
            low: ticker.low_price,
            volume: ticker.volume,
        })
    }

    async fn lot_step_size(&self, symbol: &str) -> Result<Option<Decimal>, ApiError> {
        let info: responses::ExchangeInfoResponse = self
            .get("/api/v3/exchangeInfo", &[("symbol", symbol.to_string())])
            .await?;

        Ok(info
            .symbols
            .iter()
            .find(|s| s.symbol == symbol)
            .and_then(|s| s.lot_step_size()))
    }

    async fn place_order(&self, order: &OrderRequest) -> Result<OrderAck, ApiError> {
        let mut params = BTreeMap::new();
        params.insert("symbol", order.symbol.clone());
        params.insert("side", order.side.as_str().to_string());
        params.insert("type", order.order_type.as_str().to_string());
        params.insert("quantity", order.quantity.to_string());
        params.insert("newClientOrderId", order.client_order_id.to_string());

        if order.order_type == OrderType::Limit {
            let price = order.price.ok_or_else(|| {
                ApiError::InvalidData("LIMIT order submitted without a price".to_string())
            })?;
            params.insert("price", price.to_string());
            params.insert("timeInForce", "GTC".to_string());
        }

        self.post_signed("/api/v3/order", &mut params).await
    }

    async fn cancel_order(&self, symbol: &str, order_id: i64) -> Result<CancelAck, ApiError> {
        let mut params = BTreeMap::new();
        params.insert("symbol", symbol.to_string());
        params.insert("orderId", order_id.to_string());

        self.delete_signed("/api/v3/order", &mut params).await
    }

    async fn open_orders(&self, symbol: Option<&str>) -> Result<Vec<OrderSummary>, ApiError> {
        let mut params = BTreeMap::new();
        if let Some(symbol) = symbol {
            params.insert("symbol", symbol.to_string());
        }

        self.get_signed("/api/v3/openOrders", &mut params).await
    }

    async fn all_orders(&self, symbol: &str, limit: u32) -> Result<Vec<OrderSummary>, ApiError> {
        let mut params = BTreeMap::new();
        params.insert("symbol", symbol.to_string());
        params.insert("limit", limit.to_string());

        self.get_signed("/api/v3/allOrders", &mut params).await
    }

    async fn klines(
        &self,
        symbol: &str,
        interval: &str,
        limit: u32,
    ) -> Result<Vec<Kline>, ApiError> {
        let raw: Vec<RawKline> = self
            .get(
                "/api/v3/klines",
                &[
                    ("symbol", symbol.to_string()),
                    ("interval", interval.to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;

        raw.into_iter()
            .map(|raw| {
                Ok(Kline {
                    open_time: millis_to_datetime(raw.0)?,
                    open: parse_decimal(&raw.1)?,
                    high: parse_decimal(&raw.2)?,
                    low: parse_decimal(&raw.3)?,
                    close: parse_decimal(&raw.4)?,
                    volume: parse_decimal(&raw.5)?,
                    close_time: millis_to_datetime(raw.6)?,
                    interval: interval.to_string(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    // The klines endpoint returns heterogeneous JSON arrays; make sure the
    // positional mapping survives round-tripping through RawKline.
    #[test]
    fn raw_kline_positions_map_to_ohlcv() {
        let json = r#"[
            [1499040000000, "0.01634790", "0.80000000", "0.01575800", "0.01577100",
             "148976.11427815", 1499644799999, "2434.19055334", 308,
             "1756.87402397", "28.46694368", "0"]
        ]"#;

        let raw: Vec<RawKline> = serde_json::from_str(json).unwrap();
        let k = &raw[0];
        assert_eq!(k.0, 1499040000000);
        assert_eq!(parse_decimal(&k.1).unwrap(), dec!(0.01634790));
        assert_eq!(parse_decimal(&k.2).unwrap(), dec!(0.80000000));
        assert_eq!(parse_decimal(&k.4).unwrap(), dec!(0.01577100));

        let open_time = millis_to_datetime(k.0).unwrap();
        assert_eq!(open_time.timestamp_millis(), 1499040000000);
    }

    #[test]
    fn rejects_out_of_range_timestamps() {
        assert!(millis_to_datetime(i64::MAX).is_err());
    }
}
