//! Domain types for the token-call tracker.
//!
//! This module provides:
//! - Lossless numeric handling via Decimal wrapper
//! - Domain primitives: ContractAddress, TelegramId
//! - Call, Caller, MarketData, and Snapshot types with canonical JSON
//!   serialization

pub mod call;
pub mod decimal;
pub mod primitives;

pub use call::{Call, Caller, MarketData, Snapshot, TokenMeta};
pub use decimal::Decimal;
pub use primitives::{ContractAddress, TelegramId};
