use crate::error::CoreError;

/// Quote currencies a trading pair may be denominated in. Order matters only
/// for readability; suffixes do not overlap.
pub const QUOTE_SUFFIXES: [&str; 3] = ["USDT", "BUSD", "USDC"];

/// Derives the base asset from a trading pair by stripping a known quote
/// suffix (e.g. "BTCUSDT" -> "BTC").
pub fn base_asset(symbol: &str) -> Result<&str, CoreError> {
    for quote in QUOTE_SUFFIXES {
        if let Some(base) = symbol.strip_suffix(quote) {
            if !base.is_empty() {
                return Ok(base);
            }
        }
    }
    Err(CoreError::UnknownQuoteSuffix(symbol.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_each_known_quote() {
        assert_eq!(base_asset("BTCUSDT").unwrap(), "BTC");
        assert_eq!(base_asset("ETHBUSD").unwrap(), "ETH");
        assert_eq!(base_asset("SOLUSDC").unwrap(), "SOL");
    }

    #[test]
    fn rejects_unknown_suffix_and_bare_quote() {
        assert!(base_asset("BTCEUR").is_err());
        // "USDT" alone has no base component.
        assert!(base_asset("USDT").is_err());
    }
}
