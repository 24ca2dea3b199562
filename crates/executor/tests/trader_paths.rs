//! End-to-end tests of the order-execution and portfolio paths against a
//! fake exchange client, verifying sizing, abort-before-submission behavior
//! and valuation rules.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use api_client::error::ApiError;
use api_client::{ApiClient, CancelAck, OrderAck, OrderSummary};
use core_types::{Balance, Kline, OrderRequest, OrderType, TickerStats};
use executor::{ExecutorError, PortfolioReporter, SellAmount, Trader};

/// An in-memory exchange. Records every order that reaches `place_order` so
/// tests can assert that aborted operations submitted nothing.
#[derive(Default)]
struct FakeClient {
    prices: HashMap<String, Decimal>,
    balances: Vec<Balance>,
    step_size: Option<Decimal>,
    history: Vec<OrderSummary>,
    placed: Mutex<Vec<OrderRequest>>,
}

impl FakeClient {
    fn placed_orders(&self) -> Vec<OrderRequest> {
        self.placed.lock().unwrap().clone()
    }
}

#[async_trait]
impl ApiClient for FakeClient {
    async fn ping(&self) -> Result<(), ApiError> {
        Ok(())
    }

    async fn server_time(&self) -> Result<DateTime<Utc>, ApiError> {
        Ok(Utc::now())
    }

    async fn balances(&self) -> Result<Vec<Balance>, ApiError> {
        Ok(self
            .balances
            .iter()
            .filter(|b| !b.total().is_zero())
            .cloned()
            .collect())
    }

    async fn free_balance(&self, asset: &str) -> Result<Decimal, ApiError> {
        Ok(self
            .balances
            .iter()
            .find(|b| b.asset == asset)
            .map(|b| b.free)
            .unwrap_or(Decimal::ZERO))
    }

    async fn price(&self, symbol: &str) -> Result<Decimal, ApiError> {
        self.prices
            .get(symbol)
            .copied()
            .ok_or_else(|| ApiError::Exchange {
                code: -1121,
                msg: "Invalid symbol.".to_string(),
            })
    }

    async fn ticker_24h(&self, symbol: &str) -> Result<TickerStats, ApiError> {
        let price = self.price(symbol).await?;
        Ok(TickerStats {
            price,
            change_percent: dec!(0),
            high: price,
            low: price,
            volume: dec!(0),
        })
    }

    async fn lot_step_size(&self, _symbol: &str) -> Result<Option<Decimal>, ApiError> {
        Ok(self.step_size)
    }

    async fn place_order(&self, order: &OrderRequest) -> Result<OrderAck, ApiError> {
        self.placed.lock().unwrap().push(order.clone());
        Ok(OrderAck {
            order_id: 42,
            client_order_id: order.client_order_id.to_string(),
            symbol: order.symbol.clone(),
            status: "FILLED".to_string(),
            side: order.side,
            order_type: order.order_type,
            orig_qty: order.quantity,
            executed_qty: order.quantity,
            price: order.price.unwrap_or(Decimal::ZERO),
            fills: vec![],
        })
    }

    async fn cancel_order(&self, symbol: &str, order_id: i64) -> Result<CancelAck, ApiError> {
        Ok(CancelAck {
            symbol: symbol.to_string(),
            order_id,
            status: "CANCELED".to_string(),
        })
    }

    async fn open_orders(&self, _symbol: Option<&str>) -> Result<Vec<OrderSummary>, ApiError> {
        Ok(vec![])
    }

    async fn all_orders(&self, _symbol: &str, _limit: u32) -> Result<Vec<OrderSummary>, ApiError> {
        Ok(self.history.clone())
    }

    async fn klines(
        &self,
        _symbol: &str,
        _interval: &str,
        _limit: u32,
    ) -> Result<Vec<Kline>, ApiError> {
        Ok(vec![])
    }
}

fn trader_with(client: FakeClient) -> (Trader, Arc<FakeClient>) {
    let client = Arc::new(client);
    (Trader::new(client.clone()), client)
}

#[tokio::test]
async fn market_buy_sizes_from_price_and_step() {
    let (trader, client) = trader_with(FakeClient {
        prices: HashMap::from([("BTCUSDT".to_string(), dec!(50000))]),
        step_size: Some(dec!(0.0001)),
        ..Default::default()
    });

    let receipt = trader.market_buy("BTCUSDT", dec!(100)).await.unwrap();

    // 100 / 50000 = 0.002, already a step multiple.
    assert_eq!(receipt.quantity, dec!(0.002));
    assert_eq!(receipt.order_id, 42);
    assert_eq!(receipt.status, "FILLED");
    assert_eq!(receipt.price, None);

    let placed = client.placed_orders();
    assert_eq!(placed.len(), 1);
    assert_eq!(placed[0].quantity, dec!(0.002));
    assert_eq!(placed[0].order_type, OrderType::Market);
}

#[tokio::test]
async fn market_buy_truncates_to_step() {
    let (trader, client) = trader_with(FakeClient {
        prices: HashMap::from([("BTCUSDT".to_string(), dec!(48123.45))]),
        step_size: Some(dec!(0.0001)),
        ..Default::default()
    });

    trader.market_buy("BTCUSDT", dec!(100)).await.unwrap();

    let placed = client.placed_orders();
    // 100 / 48123.45 = 0.002078..., truncated down to 0.0020.
    assert_eq!(placed[0].quantity, dec!(0.0020));
}

#[tokio::test]
async fn market_buy_aborts_when_price_lookup_fails() {
    let (trader, client) = trader_with(FakeClient {
        step_size: Some(dec!(0.0001)),
        ..Default::default()
    });

    let err = trader.market_buy("NOSUCHUSDT", dec!(100)).await.unwrap_err();

    assert!(matches!(err, ExecutorError::PriceUnavailable { .. }));
    assert!(client.placed_orders().is_empty());
}

#[tokio::test]
async fn market_buy_treats_zero_price_as_unavailable() {
    let (trader, client) = trader_with(FakeClient {
        prices: HashMap::from([("BTCUSDT".to_string(), dec!(0))]),
        ..Default::default()
    });

    let err = trader.market_buy("BTCUSDT", dec!(100)).await.unwrap_err();

    assert!(matches!(err, ExecutorError::PriceUnavailable { .. }));
    assert!(client.placed_orders().is_empty());
}

#[tokio::test]
async fn market_sell_takes_percentage_of_free_balance() {
    let (trader, client) = trader_with(FakeClient {
        balances: vec![Balance {
            asset: "BTC".to_string(),
            free: dec!(1.0),
            locked: dec!(0),
        }],
        step_size: Some(dec!(0.0001)),
        ..Default::default()
    });

    let receipt = trader
        .market_sell("BTCUSDT", SellAmount::PercentOfBalance(dec!(50)))
        .await
        .unwrap();

    assert_eq!(receipt.quantity, dec!(0.5));
    assert_eq!(client.placed_orders()[0].quantity, dec!(0.5));
}

#[tokio::test]
async fn market_sell_with_empty_balance_submits_nothing() {
    let (trader, client) = trader_with(FakeClient {
        step_size: Some(dec!(0.0001)),
        ..Default::default()
    });

    let err = trader
        .market_sell("BTCUSDT", SellAmount::PercentOfBalance(dec!(100)))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ExecutorError::InsufficientBalance { ref asset, .. } if asset == "BTC"
    ));
    assert!(client.placed_orders().is_empty());
}

#[tokio::test]
async fn limit_buy_sizes_from_limit_price() {
    let (trader, client) = trader_with(FakeClient {
        step_size: Some(dec!(0.0001)),
        ..Default::default()
    });

    let receipt = trader
        .limit_buy("BTCUSDT", dec!(100), dec!(48000))
        .await
        .unwrap();

    // 100 / 48000 = 0.002083..., truncated to 0.0020. No market price
    // lookup happens on the limit path.
    assert_eq!(receipt.quantity, dec!(0.0020));
    assert_eq!(receipt.price, Some(dec!(48000)));
    assert_eq!(client.placed_orders()[0].order_type, OrderType::Limit);
}

#[tokio::test]
async fn limit_sell_normalizes_like_other_paths() {
    let (trader, client) = trader_with(FakeClient {
        step_size: Some(dec!(0.0001)),
        ..Default::default()
    });

    trader
        .limit_sell("BTCUSDT", dec!(0.00123456), dec!(52000))
        .await
        .unwrap();

    assert_eq!(client.placed_orders()[0].quantity, dec!(0.0012));
}

#[tokio::test]
async fn limit_orders_reject_non_positive_price() {
    let (trader, client) = trader_with(FakeClient::default());

    let err = trader.limit_buy("BTCUSDT", dec!(100), dec!(0)).await.unwrap_err();
    assert!(matches!(err, ExecutorError::InvalidPrice(_)));

    let err = trader
        .limit_sell("BTCUSDT", dec!(1), dec!(-5))
        .await
        .unwrap_err();
    assert!(matches!(err, ExecutorError::InvalidPrice(_)));

    assert!(client.placed_orders().is_empty());
}

#[tokio::test]
async fn order_history_is_newest_first() {
    fn summary(order_id: i64, time: i64) -> OrderSummary {
        OrderSummary {
            symbol: "BTCUSDT".to_string(),
            order_id,
            side: core_types::OrderSide::Buy,
            order_type: "MARKET".to_string(),
            price: dec!(0),
            orig_qty: dec!(1),
            executed_qty: dec!(1),
            status: "FILLED".to_string(),
            time,
        }
    }

    let (trader, _client) = trader_with(FakeClient {
        history: vec![summary(1, 100), summary(3, 300), summary(2, 200)],
        ..Default::default()
    });

    let orders = trader.order_history("BTCUSDT", 2).await.unwrap();

    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].order_id, 3);
    assert_eq!(orders[1].order_id, 2);
}

#[tokio::test]
async fn portfolio_excludes_unpriceable_assets_silently() {
    let client = Arc::new(FakeClient {
        balances: vec![
            Balance {
                asset: "USDT".to_string(),
                free: dec!(100),
                locked: dec!(0),
            },
            Balance {
                asset: "XYZ".to_string(),
                free: dec!(5),
                locked: dec!(0),
            },
        ],
        ..Default::default()
    });
    let reporter = PortfolioReporter::new(client, "USDT".to_string(), dec!(0.01));

    let snapshot = reporter.snapshot().await.unwrap();

    assert_eq!(snapshot.total_value, dec!(100));
    assert!(snapshot.breakdown.contains_key("USDT"));
    assert!(!snapshot.breakdown.contains_key("XYZ"));
}

#[tokio::test]
async fn portfolio_filters_dust_at_threshold() {
    let client = Arc::new(FakeClient {
        prices: HashMap::from([
            ("DUSTUSDT".to_string(), dec!(0.005)),
            ("KEPTUSDT".to_string(), dec!(0.02)),
        ]),
        balances: vec![
            Balance {
                asset: "DUST".to_string(),
                free: dec!(1),
                locked: dec!(0),
            },
            Balance {
                asset: "KEPT".to_string(),
                free: dec!(1),
                locked: dec!(0),
            },
        ],
        ..Default::default()
    });
    let reporter = PortfolioReporter::new(client, "USDT".to_string(), dec!(0.01));

    let snapshot = reporter.snapshot().await.unwrap();

    // 0.005 is at/below the 0.01 threshold, 0.02 is above it.
    assert!(!snapshot.breakdown.contains_key("DUST"));
    assert!(snapshot.breakdown.contains_key("KEPT"));
    assert_eq!(snapshot.total_value, dec!(0.02));
}

#[tokio::test]
async fn portfolio_counts_locked_balances() {
    let client = Arc::new(FakeClient {
        balances: vec![Balance {
            asset: "USDT".to_string(),
            free: dec!(60),
            locked: dec!(40),
        }],
        ..Default::default()
    });
    let reporter = PortfolioReporter::new(client, "USDT".to_string(), dec!(0.01));

    let snapshot = reporter.snapshot().await.unwrap();

    assert_eq!(snapshot.total_value, dec!(100));
    assert_eq!(snapshot.breakdown["USDT"].balance, dec!(100));
}

#[tokio::test]
async fn scalar_sell_amounts_follow_percent_convention() {
    assert_eq!(
        SellAmount::from_scalar(dec!(50)),
        SellAmount::PercentOfBalance(dec!(50))
    );
    assert_eq!(
        SellAmount::from_scalar(dec!(100)),
        SellAmount::PercentOfBalance(dec!(100))
    );
    assert_eq!(SellAmount::from_scalar(dec!(250)), SellAmount::Exact(dec!(250)));
}
