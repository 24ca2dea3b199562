use crate::error::ExecutorError;
use api_client::ApiClient;
use core_types::{AssetValue, PortfolioSnapshot};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Values the whole account in the quote currency.
///
/// Each snapshot is computed fresh from live balances and prices; nothing is
/// cached between calls. Assets without a quote-currency trading pair are
/// excluded from the total rather than failing the valuation, as are "dust"
/// holdings at or below the configured threshold.
pub struct PortfolioReporter {
    client: Arc<dyn ApiClient>,
    quote_asset: String,
    dust_threshold: Decimal,
}

impl PortfolioReporter {
    pub fn new(client: Arc<dyn ApiClient>, quote_asset: String, dust_threshold: Decimal) -> Self {
        Self {
            client,
            quote_asset,
            dust_threshold,
        }
    }

    pub async fn snapshot(&self) -> Result<PortfolioSnapshot, ExecutorError> {
        let balances = self.client.balances().await?;

        let mut total_value = Decimal::ZERO;
        let mut breakdown = BTreeMap::new();

        for balance in balances {
            let total = balance.total();

            let value = if balance.asset == self.quote_asset {
                total
            } else {
                let pair = format!("{}{}", balance.asset, self.quote_asset);
                match self.client.price(&pair).await {
                    Ok(price) => total * price,
                    Err(e) => {
                        // No tradable pair against the quote currency; the
                        // asset is skipped, not an error.
                        debug!(asset = %balance.asset, %pair, error = %e, "Excluding unpriceable asset");
                        continue;
                    }
                }
            };

            if value <= self.dust_threshold {
                debug!(asset = %balance.asset, %value, "Excluding dust balance");
                continue;
            }

            total_value += value;
            breakdown.insert(
                balance.asset.clone(),
                AssetValue {
                    balance: total,
                    value,
                },
            );
        }

        Ok(PortfolioSnapshot {
            quote_asset: self.quote_asset.clone(),
            total_value,
            breakdown,
        })
    }
}
