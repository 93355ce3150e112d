//! DexScreener API client implementation.

use super::{MarketDataError, MarketDataSource};
use crate::domain::{Decimal, MarketData, TokenMeta};
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Market-data source using the public DexScreener token-pairs API.
#[derive(Debug, Clone)]
pub struct DexScreenerDataSource {
    client: Client,
    base_url: String,
}

impl DexScreenerDataSource {
    /// Create a new DexScreener data source.
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    /// Create with the default DexScreener API URL.
    pub fn default_url() -> Self {
        Self::new("https://api.dexscreener.com".to_string())
    }

    async fn get_token_pairs(
        &self,
        contract_address: &str,
    ) -> Result<serde_json::Value, MarketDataError> {
        let url = format!("{}/latest/dex/tokens/{}", self.base_url, contract_address);
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(30)),
            ..Default::default()
        };

        retry(backoff, || async {
            let response = self.client.get(&url).send().await.map_err(|e| {
                backoff::Error::transient(MarketDataError::NetworkError(e.to_string()))
            })?;

            let status = response.status();
            if status == 429 {
                return Err(backoff::Error::transient(MarketDataError::RateLimited));
            }
            if status.is_server_error() {
                return Err(backoff::Error::transient(MarketDataError::HttpError {
                    status: status.as_u16(),
                    message: "Server error".to_string(),
                }));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(MarketDataError::HttpError {
                    status: status.as_u16(),
                    message: "Client error".to_string(),
                }));
            }

            response
                .json::<serde_json::Value>()
                .await
                .map_err(|e| backoff::Error::permanent(MarketDataError::ParseError(e.to_string())))
        })
        .await
    }

    /// Pick the pair with the deepest USD liquidity from the response.
    fn best_pair(
        response: &serde_json::Value,
        contract_address: &str,
    ) -> Result<serde_json::Value, MarketDataError> {
        let pairs = response
            .get("pairs")
            .and_then(|v| v.as_array())
            .filter(|pairs| !pairs.is_empty())
            .ok_or_else(|| MarketDataError::TokenNotFound(contract_address.to_string()))?;

        let best = pairs
            .iter()
            .max_by(|a, b| {
                let liq_a = pair_liquidity(a);
                let liq_b = pair_liquidity(b);
                liq_a
                    .partial_cmp(&liq_b)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .ok_or_else(|| MarketDataError::TokenNotFound(contract_address.to_string()))?;

        Ok(best.clone())
    }
}

fn pair_liquidity(pair: &serde_json::Value) -> f64 {
    pair.get("liquidity")
        .and_then(|l| l.get("usd"))
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0)
}

#[async_trait]
impl MarketDataSource for DexScreenerDataSource {
    async fn fetch_market_data(
        &self,
        contract_address: &str,
    ) -> Result<MarketData, MarketDataError> {
        debug!("Fetching market data for contract={}", contract_address);

        let response = self.get_token_pairs(contract_address).await?;
        let pair = Self::best_pair(&response, contract_address)?;
        parse_market_data(&pair)
    }

    async fn fetch_token_meta(
        &self,
        contract_address: &str,
    ) -> Result<TokenMeta, MarketDataError> {
        debug!("Fetching token metadata for contract={}", contract_address);

        let response = self.get_token_pairs(contract_address).await?;
        let pair = Self::best_pair(&response, contract_address)?;
        parse_token_meta(&pair)
    }
}

fn parse_market_data(pair: &serde_json::Value) -> Result<MarketData, MarketDataError> {
    // DexScreener returns priceUsd as a string and the rest as numbers.
    let price_str = pair
        .get("priceUsd")
        .and_then(|v| v.as_str())
        .ok_or_else(|| MarketDataError::ParseError("Missing priceUsd field".to_string()))?;
    let price = Decimal::from_str_canonical(price_str)
        .map_err(|e| MarketDataError::ParseError(format!("Invalid priceUsd: {}", e)))?;

    // marketCap is preferred; fdv stands in for tokens without a cap figure.
    let market_cap = pair
        .get("marketCap")
        .or_else(|| pair.get("fdv"))
        .and_then(|v| v.as_f64())
        .map(json_number_to_decimal)
        .transpose()?
        .unwrap_or_else(Decimal::zero);

    let liquidity = pair
        .get("liquidity")
        .and_then(|l| l.get("usd"))
        .and_then(|v| v.as_f64())
        .map(json_number_to_decimal)
        .transpose()?
        .unwrap_or_else(Decimal::zero);

    let volume_24h = pair
        .get("volume")
        .and_then(|vol| vol.get("h24"))
        .and_then(|v| v.as_f64())
        .map(json_number_to_decimal)
        .transpose()?
        .unwrap_or_else(Decimal::zero);

    Ok(MarketData {
        price,
        market_cap,
        liquidity,
        volume_24h,
    })
}

fn parse_token_meta(pair: &serde_json::Value) -> Result<TokenMeta, MarketDataError> {
    let base_token = pair
        .get("baseToken")
        .ok_or_else(|| MarketDataError::ParseError("Missing baseToken field".to_string()))?;

    let symbol = base_token
        .get("symbol")
        .and_then(|v| v.as_str())
        .ok_or_else(|| MarketDataError::ParseError("Missing baseToken.symbol".to_string()))?
        .to_string();

    let name = base_token
        .get("name")
        .and_then(|v| v.as_str())
        .unwrap_or(symbol.as_str())
        .to_string();

    let image = pair
        .get("info")
        .and_then(|info| info.get("imageUrl"))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());

    Ok(TokenMeta {
        symbol,
        name,
        image,
    })
}

fn json_number_to_decimal(value: f64) -> Result<Decimal, MarketDataError> {
    Decimal::from_str_canonical(&format!("{}", value))
        .map_err(|e| MarketDataError::ParseError(format!("Invalid number {}: {}", value, e)))
}
