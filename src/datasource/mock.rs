//! Mock market-data source for testing without network calls.

use super::{MarketDataError, MarketDataSource};
use crate::domain::{MarketData, TokenMeta};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Mock market-data source returning predefined quotes per contract.
///
/// Quotes can be swapped between refreshes via [`set_market_data`], and
/// failures injected per contract via [`with_failure`] / [`set_failure`].
///
/// [`set_market_data`]: MockMarketDataSource::set_market_data
/// [`with_failure`]: MockMarketDataSource::with_failure
/// [`set_failure`]: MockMarketDataSource::set_failure
#[derive(Debug, Default)]
pub struct MockMarketDataSource {
    quotes: Mutex<HashMap<String, MarketData>>,
    metas: Mutex<HashMap<String, TokenMeta>>,
    failures: Mutex<HashMap<String, MarketDataError>>,
}

impl MockMarketDataSource {
    /// Create a new mock with no data.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a quote for a contract.
    pub fn with_market_data(self, contract_address: &str, market: MarketData) -> Self {
        self.set_market_data(contract_address, market);
        self
    }

    /// Add token metadata for a contract.
    pub fn with_token_meta(self, contract_address: &str, meta: TokenMeta) -> Self {
        self.metas
            .lock()
            .expect("mock metas lock")
            .insert(contract_address.to_string(), meta);
        self
    }

    /// Make every fetch for a contract fail with the given error.
    pub fn with_failure(self, contract_address: &str, error: MarketDataError) -> Self {
        self.set_failure(contract_address, error);
        self
    }

    /// Replace the quote for a contract, clearing any injected failure.
    pub fn set_market_data(&self, contract_address: &str, market: MarketData) {
        self.failures
            .lock()
            .expect("mock failures lock")
            .remove(contract_address);
        self.quotes
            .lock()
            .expect("mock quotes lock")
            .insert(contract_address.to_string(), market);
    }

    /// Inject a failure for a contract.
    pub fn set_failure(&self, contract_address: &str, error: MarketDataError) {
        self.failures
            .lock()
            .expect("mock failures lock")
            .insert(contract_address.to_string(), error);
    }

    fn check_failure(&self, contract_address: &str) -> Result<(), MarketDataError> {
        if let Some(err) = self
            .failures
            .lock()
            .expect("mock failures lock")
            .get(contract_address)
        {
            return Err(err.clone());
        }
        Ok(())
    }
}

#[async_trait]
impl MarketDataSource for MockMarketDataSource {
    async fn fetch_market_data(
        &self,
        contract_address: &str,
    ) -> Result<MarketData, MarketDataError> {
        self.check_failure(contract_address)?;

        self.quotes
            .lock()
            .expect("mock quotes lock")
            .get(contract_address)
            .copied()
            .ok_or_else(|| MarketDataError::TokenNotFound(contract_address.to_string()))
    }

    async fn fetch_token_meta(
        &self,
        contract_address: &str,
    ) -> Result<TokenMeta, MarketDataError> {
        self.check_failure(contract_address)?;

        if let Some(meta) = self
            .metas
            .lock()
            .expect("mock metas lock")
            .get(contract_address)
        {
            return Ok(meta.clone());
        }

        // A quoted contract without explicit metadata gets a placeholder so
        // intake flows do not need to stub both maps.
        if self
            .quotes
            .lock()
            .expect("mock quotes lock")
            .contains_key(contract_address)
        {
            return Ok(TokenMeta {
                symbol: "MOCK".to_string(),
                name: "Mock Token".to_string(),
                image: None,
            });
        }

        Err(MarketDataError::TokenNotFound(contract_address.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Decimal;
    use std::str::FromStr;

    fn market(price: &str) -> MarketData {
        MarketData {
            price: Decimal::from_str(price).unwrap(),
            market_cap: Decimal::from_str("100000").unwrap(),
            liquidity: Decimal::from_str("10000").unwrap(),
            volume_24h: Decimal::from_str("5000").unwrap(),
        }
    }

    #[tokio::test]
    async fn test_mock_returns_quote() {
        let mock = MockMarketDataSource::new().with_market_data("mint1", market("0.5"));
        let data = mock.fetch_market_data("mint1").await.unwrap();
        assert_eq!(data.price, Decimal::from_str("0.5").unwrap());
    }

    #[tokio::test]
    async fn test_mock_unknown_contract_not_found() {
        let mock = MockMarketDataSource::new();
        assert!(matches!(
            mock.fetch_market_data("mint1").await,
            Err(MarketDataError::TokenNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_mock_injected_failure() {
        let mock = MockMarketDataSource::new()
            .with_market_data("mint1", market("0.5"))
            .with_failure("mint1", MarketDataError::RateLimited);
        assert!(matches!(
            mock.fetch_market_data("mint1").await,
            Err(MarketDataError::RateLimited)
        ));
    }

    #[tokio::test]
    async fn test_mock_quote_swap_clears_failure() {
        let mock = MockMarketDataSource::new()
            .with_failure("mint1", MarketDataError::RateLimited);
        mock.set_market_data("mint1", market("2"));
        let data = mock.fetch_market_data("mint1").await.unwrap();
        assert_eq!(data.price, Decimal::from_str("2").unwrap());
    }

    #[tokio::test]
    async fn test_mock_meta_placeholder_for_quoted_contract() {
        let mock = MockMarketDataSource::new().with_market_data("mint1", market("0.5"));
        let meta = mock.fetch_token_meta("mint1").await.unwrap();
        assert_eq!(meta.symbol, "MOCK");
    }
}
