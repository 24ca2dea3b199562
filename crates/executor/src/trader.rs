use crate::error::ExecutorError;
use crate::sizing::normalize_quantity;
use api_client::{ApiClient, CancelAck, OrderAck, OrderSummary};
use core_types::symbols::base_asset;
use core_types::{Fill, OrderReceipt, OrderRequest, OrderSide, OrderType};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tracing::{debug, info};

/// How much of the base asset a market sell should liquidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SellAmount {
    /// A percentage of the free balance, in (0, 100].
    PercentOfBalance(Decimal),
    /// An absolute base-asset quantity.
    Exact(Decimal),
}

impl SellAmount {
    /// Scalar convention used by the CLI: a value in (0, 100] means a
    /// percentage of the free balance, anything larger is an absolute
    /// quantity.
    pub fn from_scalar(value: Decimal) -> Self {
        if value > Decimal::ZERO && value <= dec!(100) {
            SellAmount::PercentOfBalance(value)
        } else {
            SellAmount::Exact(value)
        }
    }
}

/// Composes price lookup, quantity computation, step-size normalization and
/// order submission into single operations against an injected [`ApiClient`].
///
/// Every method awaits the exchange's acknowledgement before returning, so an
/// order is always either submitted or failed by the time the call completes.
/// Nothing is retried and no state is held between calls.
pub struct Trader {
    client: Arc<dyn ApiClient>,
}

impl Trader {
    pub fn new(client: Arc<dyn ApiClient>) -> Self {
        Self { client }
    }

    /// Buys `quote_amount` worth of the symbol at market.
    ///
    /// The quantity is derived from the latest traded price and truncated to
    /// the symbol's LOT_SIZE step. A failed or zero price lookup aborts
    /// before anything reaches the exchange.
    pub async fn market_buy(
        &self,
        symbol: &str,
        quote_amount: Decimal,
    ) -> Result<OrderReceipt, ExecutorError> {
        if quote_amount <= Decimal::ZERO {
            return Err(ExecutorError::InvalidAmount(format!(
                "quote amount must be positive, got {}",
                quote_amount
            )));
        }

        let price = match self.client.price(symbol).await {
            Ok(price) if !price.is_zero() => price,
            Ok(_) => {
                return Err(ExecutorError::PriceUnavailable {
                    symbol: symbol.to_string(),
                    reason: "exchange returned a zero price".to_string(),
                });
            }
            Err(e) => {
                return Err(ExecutorError::PriceUnavailable {
                    symbol: symbol.to_string(),
                    reason: e.to_string(),
                });
            }
        };

        let raw_quantity = quote_amount / price;
        let step = self.client.lot_step_size(symbol).await?;
        let quantity = normalize_quantity(raw_quantity, step);
        debug!(%symbol, %price, %raw_quantity, %quantity, "Sized market buy");

        if quantity.is_zero() {
            return Err(ExecutorError::ZeroQuantity {
                symbol: symbol.to_string(),
            });
        }

        let order = OrderRequest::market(symbol, OrderSide::Buy, quantity);
        info!(%symbol, %quantity, "Submitting market BUY");
        let ack = self.client.place_order(&order).await?;
        Ok(receipt_from_ack(ack))
    }

    /// Sells the given amount of the symbol's base asset at market.
    ///
    /// The base asset is derived by stripping the symbol's quote suffix
    /// (e.g. BTC from BTCUSDT). Percentage amounts are taken of the free
    /// balance; a quantity that normalizes to zero means there is nothing
    /// tradeable and nothing is submitted.
    pub async fn market_sell(
        &self,
        symbol: &str,
        amount: SellAmount,
    ) -> Result<OrderReceipt, ExecutorError> {
        let base = base_asset(symbol)?.to_string();

        let raw_quantity = match amount {
            SellAmount::PercentOfBalance(percent) => {
                if percent <= Decimal::ZERO || percent > dec!(100) {
                    return Err(ExecutorError::InvalidAmount(format!(
                        "sell percentage must be in (0, 100], got {}",
                        percent
                    )));
                }
                let balance = self.client.free_balance(&base).await?;
                balance * percent / dec!(100)
            }
            SellAmount::Exact(quantity) => {
                if quantity <= Decimal::ZERO {
                    return Err(ExecutorError::InvalidAmount(format!(
                        "sell quantity must be positive, got {}",
                        quantity
                    )));
                }
                quantity
            }
        };

        let step = self.client.lot_step_size(symbol).await?;
        let quantity = normalize_quantity(raw_quantity, step);
        debug!(%symbol, %base, %raw_quantity, %quantity, "Sized market sell");

        if quantity.is_zero() {
            return Err(ExecutorError::InsufficientBalance {
                asset: base,
                available: raw_quantity,
            });
        }

        let order = OrderRequest::market(symbol, OrderSide::Sell, quantity);
        info!(%symbol, %quantity, "Submitting market SELL");
        let ack = self.client.place_order(&order).await?;
        Ok(receipt_from_ack(ack))
    }

    /// Places a limit buy sized to spend `quote_amount` at `limit_price`.
    pub async fn limit_buy(
        &self,
        symbol: &str,
        quote_amount: Decimal,
        limit_price: Decimal,
    ) -> Result<OrderReceipt, ExecutorError> {
        if limit_price <= Decimal::ZERO {
            return Err(ExecutorError::InvalidPrice(limit_price));
        }
        if quote_amount <= Decimal::ZERO {
            return Err(ExecutorError::InvalidAmount(format!(
                "quote amount must be positive, got {}",
                quote_amount
            )));
        }

        let raw_quantity = quote_amount / limit_price;
        let step = self.client.lot_step_size(symbol).await?;
        let quantity = normalize_quantity(raw_quantity, step);
        debug!(%symbol, %limit_price, %raw_quantity, %quantity, "Sized limit buy");

        if quantity.is_zero() {
            return Err(ExecutorError::ZeroQuantity {
                symbol: symbol.to_string(),
            });
        }

        let order = OrderRequest::limit(symbol, OrderSide::Buy, quantity, limit_price);
        info!(%symbol, %quantity, %limit_price, "Submitting limit BUY");
        let ack = self.client.place_order(&order).await?;
        Ok(receipt_from_ack(ack))
    }

    /// Places a limit sell of `quantity` at `limit_price`.
    ///
    /// The quantity is normalized to the LOT_SIZE step like every other
    /// order path.
    pub async fn limit_sell(
        &self,
        symbol: &str,
        quantity: Decimal,
        limit_price: Decimal,
    ) -> Result<OrderReceipt, ExecutorError> {
        if limit_price <= Decimal::ZERO {
            return Err(ExecutorError::InvalidPrice(limit_price));
        }
        if quantity <= Decimal::ZERO {
            return Err(ExecutorError::InvalidAmount(format!(
                "sell quantity must be positive, got {}",
                quantity
            )));
        }

        let step = self.client.lot_step_size(symbol).await?;
        let quantity = normalize_quantity(quantity, step);

        if quantity.is_zero() {
            return Err(ExecutorError::ZeroQuantity {
                symbol: symbol.to_string(),
            });
        }

        let order = OrderRequest::limit(symbol, OrderSide::Sell, quantity, limit_price);
        info!(%symbol, %quantity, %limit_price, "Submitting limit SELL");
        let ack = self.client.place_order(&order).await?;
        Ok(receipt_from_ack(ack))
    }

    /// Best-effort cancellation. An unknown or already-filled order surfaces
    /// as an `Api` error carrying the exchange's message.
    pub async fn cancel_order(
        &self,
        symbol: &str,
        order_id: i64,
    ) -> Result<CancelAck, ExecutorError> {
        info!(%symbol, order_id, "Cancelling order");
        Ok(self.client.cancel_order(symbol, order_id).await?)
    }

    /// Open orders, optionally filtered by symbol.
    pub async fn open_orders(
        &self,
        symbol: Option<&str>,
    ) -> Result<Vec<OrderSummary>, ExecutorError> {
        Ok(self.client.open_orders(symbol).await?)
    }

    /// The most recent `limit` orders for a symbol, newest first.
    pub async fn order_history(
        &self,
        symbol: &str,
        limit: u32,
    ) -> Result<Vec<OrderSummary>, ExecutorError> {
        let mut orders = self.client.all_orders(symbol, limit).await?;
        orders.sort_by_key(|o| std::cmp::Reverse(o.time));
        orders.truncate(limit as usize);
        Ok(orders)
    }
}

/// Translates the exchange's acknowledgement into our receipt type.
fn receipt_from_ack(ack: OrderAck) -> OrderReceipt {
    let price = match ack.order_type {
        OrderType::Limit => Some(ack.price),
        OrderType::Market => None,
    };
    OrderReceipt {
        order_id: ack.order_id,
        symbol: ack.symbol,
        side: ack.side,
        order_type: ack.order_type,
        quantity: ack.orig_qty,
        price,
        status: ack.status,
        fills: ack.fills.into_iter().map(Fill::from).collect(),
    }
}
