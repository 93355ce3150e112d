//! Call, caller, and market sample types.

use crate::domain::{ContractAddress, Decimal, TelegramId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One market observation for a token, as returned by the feed adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketData {
    /// Price in USD.
    pub price: Decimal,
    /// Market capitalization in USD.
    pub market_cap: Decimal,
    /// Pooled liquidity in USD.
    pub liquidity: Decimal,
    /// Trailing 24h volume in USD.
    pub volume_24h: Decimal,
}

/// Token metadata captured when a call is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMeta {
    pub symbol: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// A caller identity mirrored from the Telegram bot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub telegram_id: TelegramId,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub display_name: Option<String>,
    pub twitter_username: Option<String>,
    pub twitter_profile_pic: Option<String>,
    pub is_linked: bool,
}

impl Caller {
    /// Create a minimal anonymous caller.
    pub fn anonymous(telegram_id: TelegramId) -> Self {
        Caller {
            telegram_id,
            username: None,
            first_name: None,
            display_name: None,
            twitter_username: None,
            twitter_profile_pic: None,
            is_linked: false,
        }
    }
}

/// A user's tracked claim about a token, anchored at entry price/market cap.
///
/// `entry_price` and `entry_market_cap` are immutable after creation.
/// `ath_price` is monotonically non-decreasing; entry itself counts as the
/// first observation. `locked_multiplier` engages at 2x and never decreases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    pub id: Uuid,
    pub telegram_id: TelegramId,
    pub contract_address: ContractAddress,
    pub token: TokenMeta,
    pub entry_price: Decimal,
    pub entry_market_cap: Decimal,
    pub ath_price: Decimal,
    pub locked_multiplier: Option<Decimal>,
    pub current_price: Decimal,
    pub current_market_cap: Decimal,
    pub pnl_percent: Decimal,
    pub score: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Call {
    /// Create a new Call from the first market observation of a token.
    pub fn new(
        telegram_id: TelegramId,
        contract_address: ContractAddress,
        token: TokenMeta,
        entry: &MarketData,
        created_at: DateTime<Utc>,
    ) -> Self {
        Call {
            id: Uuid::new_v4(),
            telegram_id,
            contract_address,
            token,
            entry_price: entry.price,
            entry_market_cap: entry.market_cap,
            ath_price: entry.price,
            locked_multiplier: None,
            current_price: entry.price,
            current_market_cap: entry.market_cap,
            pnl_percent: Decimal::zero(),
            score: Decimal::zero(),
            created_at,
            updated_at: created_at,
        }
    }

    /// Age of the call relative to `now`.
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.created_at
    }
}

/// A point-in-time price/market-cap/liquidity/volume sample for a token.
///
/// Append-only, one per (contract, timestamp); used for charting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub contract_address: ContractAddress,
    pub timestamp: DateTime<Utc>,
    pub price: Decimal,
    pub market_cap: Decimal,
    pub liquidity: Decimal,
    pub volume_24h: Decimal,
    /// Stable unique key for idempotent append.
    pub event_key: String,
}

impl Snapshot {
    /// Create a Snapshot from a market observation.
    pub fn new(
        contract_address: ContractAddress,
        timestamp: DateTime<Utc>,
        market: &MarketData,
    ) -> Self {
        let event_key = Self::compute_event_key(&contract_address, timestamp);
        Snapshot {
            contract_address,
            timestamp,
            price: market.price,
            market_cap: market.market_cap,
            liquidity: market.liquidity,
            volume_24h: market.volume_24h,
            event_key,
        }
    }

    /// Generate a stable unique key for a (contract, timestamp) pair.
    pub fn compute_event_key(contract_address: &ContractAddress, timestamp: DateTime<Utc>) -> String {
        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();
        hasher.update(contract_address.as_str());
        hasher.update(timestamp.timestamp_millis().to_le_bytes());
        let hash = hasher.finalize();
        format!("snap:{}", hex::encode(&hash[..16]))
    }
}
