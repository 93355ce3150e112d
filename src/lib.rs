pub mod api;
pub mod config;
pub mod datasource;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod refresh;

pub use config::Config;
pub use datasource::{
    DexScreenerDataSource, MarketDataError, MarketDataSource, MockMarketDataSource,
};
pub use db::{init_db, Repository};
pub use domain::{
    Call, Caller, ContractAddress, Decimal, MarketData, Snapshot, TelegramId, TokenMeta,
};
pub use error::AppError;
pub use refresh::{RefreshError, Refresher};
