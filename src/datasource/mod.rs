//! Market-data source abstraction for fetching token price, market cap,
//! liquidity, and volume from an external feed.

use crate::domain::{MarketData, TokenMeta};
use async_trait::async_trait;
use std::fmt;

pub mod dexscreener;
pub mod mock;

pub use dexscreener::DexScreenerDataSource;
pub use mock::MockMarketDataSource;

/// Market-data source trait.
///
/// Implementations must handle retry/backoff and rate limiting. Failures are
/// transient from the engine's viewpoint: callers keep last-known values and
/// retry on the next refresh.
#[async_trait]
pub trait MarketDataSource: Send + Sync + fmt::Debug {
    /// Fetch the current market observation for a token.
    ///
    /// # Arguments
    /// * `contract_address` - Token contract (mint) address
    ///
    /// # Returns
    /// The current price/market-cap/liquidity/volume sample.
    async fn fetch_market_data(
        &self,
        contract_address: &str,
    ) -> Result<MarketData, MarketDataError>;

    /// Fetch token metadata (symbol, name, image) for a contract.
    ///
    /// Used once at call creation; refreshes never touch metadata.
    async fn fetch_token_meta(&self, contract_address: &str)
        -> Result<TokenMeta, MarketDataError>;
}

/// Error type for market-data operations.
#[derive(Debug, Clone)]
pub enum MarketDataError {
    /// Network error (e.g., connection timeout, DNS failure)
    NetworkError(String),
    /// HTTP error (e.g., 5xx server error)
    HttpError { status: u16, message: String },
    /// Parsing error (invalid JSON or malformed response)
    ParseError(String),
    /// Rate limit exceeded (caller should implement backoff)
    RateLimited,
    /// The feed has no tradable pair for this token
    TokenNotFound(String),
}

impl fmt::Display for MarketDataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketDataError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            MarketDataError::HttpError { status, message } => {
                write!(f, "HTTP error {}: {}", status, message)
            }
            MarketDataError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            MarketDataError::RateLimited => write!(f, "Rate limited"),
            MarketDataError::TokenNotFound(contract) => {
                write!(f, "No tradable pair for token {}", contract)
            }
        }
    }
}

impl std::error::Error for MarketDataError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_data_error_display() {
        let err = MarketDataError::NetworkError("connection timeout".to_string());
        assert_eq!(err.to_string(), "Network error: connection timeout");

        let err = MarketDataError::HttpError {
            status: 429,
            message: "Too many requests".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP error 429: Too many requests");

        let err = MarketDataError::ParseError("invalid JSON".to_string());
        assert_eq!(err.to_string(), "Parse error: invalid JSON");

        let err = MarketDataError::RateLimited;
        assert_eq!(err.to_string(), "Rate limited");

        let err = MarketDataError::TokenNotFound("mint1".to_string());
        assert_eq!(err.to_string(), "No tradable pair for token mint1");
    }
}
