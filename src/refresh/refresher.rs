//! Per-call refresh pipeline and the bounded bulk sweep.
//!
//! A refresh pulls one market sample, runs the PnL and scoring engines, and
//! persists the outcome. Refreshes of the same call serialize through a keyed
//! async lock so the monotonic `ath_price`/`locked_multiplier` fields cannot
//! lose updates; refreshes of distinct calls run in parallel.

use crate::config::Config;
use crate::datasource::{MarketDataError, MarketDataSource};
use crate::db::repo::CallRefreshUpdate;
use crate::db::Repository;
use crate::domain::{Call, ContractAddress, Decimal, MarketData, Snapshot};
use crate::engine::{self, PnlError, TimeDecay};
use chrono::Utc;
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum RefreshError {
    /// Entry price is zero or negative; fatal for the call, skipped on bulk
    /// sweeps and never retried automatically.
    #[error("entry price must be positive, got {0}")]
    InvalidEntryPrice(Decimal),
    /// The feed failed; last-known values stay untouched.
    #[error(transparent)]
    Feed(#[from] MarketDataError),
    /// The feed did not answer within the configured deadline.
    #[error("feed request timed out")]
    FeedTimeout,
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// One refreshed call plus whether the sample tripped corruption detection.
#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    pub call: Call,
    pub corrupted: bool,
}

/// Per-item counts from a bulk sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    pub refreshed: usize,
    pub skipped: usize,
    pub errors: usize,
    pub corrupted: usize,
}

pub struct Refresher {
    datasource: Arc<dyn MarketDataSource>,
    repo: Arc<Repository>,
    config: Config,
    decay: Arc<dyn TimeDecay>,
    locks: Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>,
}

impl Refresher {
    pub fn new(
        datasource: Arc<dyn MarketDataSource>,
        repo: Arc<Repository>,
        config: Config,
        decay: Arc<dyn TimeDecay>,
    ) -> Self {
        Self {
            datasource,
            repo,
            config,
            decay,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Refresh one call from a fresh market sample.
    ///
    /// On any error the stored record is left exactly as it was.
    pub async fn refresh_call(&self, call: &Call) -> Result<RefreshOutcome, RefreshError> {
        if !call.entry_price.is_positive() {
            return Err(RefreshError::InvalidEntryPrice(call.entry_price));
        }

        let market = self.fetch_with_deadline(&call.contract_address).await?;
        self.apply_market(call, &market).await
    }

    /// Refresh every call on a contract from a single feed fetch.
    pub async fn refresh_contract(
        &self,
        contract_address: &ContractAddress,
    ) -> Result<Vec<RefreshOutcome>, RefreshError> {
        let calls = self.repo.list_calls_for_contract(contract_address).await?;
        if calls.is_empty() {
            return Ok(Vec::new());
        }

        let market = self.fetch_with_deadline(contract_address).await?;

        let mut outcomes = Vec::with_capacity(calls.len());
        for call in &calls {
            if !call.entry_price.is_positive() {
                warn!(contract = %contract_address, call_id = %call.id,
                      "Skipping call with non-positive entry price");
                continue;
            }
            outcomes.push(self.apply_market(call, &market).await?);
        }
        Ok(outcomes)
    }

    /// Sweep every tracked call with bounded concurrency.
    ///
    /// One item's failure never aborts the sweep; failed calls keep their
    /// prior values and are counted in the summary.
    pub async fn refresh_all(&self) -> Result<RefreshSummary, sqlx::Error> {
        let calls = self.repo.list_calls().await?;
        let total = calls.len();
        info!(total, "Starting bulk refresh sweep");

        let results: Vec<ItemResult> = futures::stream::iter(calls.into_iter().map(|call| {
            async move {
                if !call.entry_price.is_positive() {
                    return ItemResult::Skipped;
                }
                match self.refresh_call(&call).await {
                    Ok(outcome) if outcome.corrupted => ItemResult::RefreshedCorrupted,
                    Ok(_) => ItemResult::Refreshed,
                    Err(RefreshError::InvalidEntryPrice(_)) => ItemResult::Skipped,
                    Err(e) => {
                        warn!(contract = %call.contract_address, call_id = %call.id,
                              error = %e, "Refresh failed, keeping last-known values");
                        ItemResult::Errored
                    }
                }
            }
        }))
        .buffer_unordered(self.config.refresh_concurrency)
        .collect()
        .await;

        let mut summary = RefreshSummary::default();
        for result in results {
            match result {
                ItemResult::Refreshed => summary.refreshed += 1,
                ItemResult::RefreshedCorrupted => {
                    summary.refreshed += 1;
                    summary.corrupted += 1;
                }
                ItemResult::Skipped => summary.skipped += 1,
                ItemResult::Errored => summary.errors += 1,
            }
        }

        info!(
            refreshed = summary.refreshed,
            skipped = summary.skipped,
            errors = summary.errors,
            corrupted = summary.corrupted,
            "Bulk refresh sweep finished"
        );
        Ok(summary)
    }

    /// Run the engines against one sample and persist, serialized per call.
    async fn apply_market(
        &self,
        call: &Call,
        market: &MarketData,
    ) -> Result<RefreshOutcome, RefreshError> {
        let lock = self.lock_for(call.id);
        let _guard = lock.lock().await;

        // Re-read under the lock: a concurrent refresh may have advanced the
        // monotonic fields since the caller loaded this row.
        let fresh = self
            .repo
            .get_call(call.id)
            .await?
            .unwrap_or_else(|| call.clone());

        let outcome = engine::apply_sample(&fresh, market, self.config.corruption_threshold)
            .map_err(|e| match e {
                PnlError::InvalidEntryPrice(p) => RefreshError::InvalidEntryPrice(p),
            })?;

        if outcome.corrupted {
            warn!(contract = %fresh.contract_address, call_id = %fresh.id,
                  price = %market.price, market_cap = %market.market_cap,
                  "Corrupt sample detected, lock state reset");
        }

        let now = Utc::now();
        let score = engine::score_call(
            outcome.raw_multiplier,
            fresh.entry_market_cap,
            fresh.age(now),
            self.decay.as_ref(),
        );

        let update = CallRefreshUpdate {
            ath_price: outcome.ath_price,
            locked_multiplier: outcome.locked_multiplier,
            current_price: market.price,
            current_market_cap: market.market_cap,
            pnl_percent: outcome.pnl_percent,
            score,
            updated_at: now,
        };
        self.repo.apply_refresh(fresh.id, &update).await?;

        let snapshot = Snapshot::new(fresh.contract_address.clone(), now, market);
        self.repo.insert_snapshot(&snapshot).await?;

        debug!(contract = %fresh.contract_address, call_id = %fresh.id,
               pnl = %engine::format_pnl_display(outcome.pnl_percent),
               score = %score, "Call refreshed");

        let updated = Call {
            ath_price: outcome.ath_price,
            locked_multiplier: outcome.locked_multiplier,
            current_price: market.price,
            current_market_cap: market.market_cap,
            pnl_percent: outcome.pnl_percent,
            score,
            updated_at: now,
            ..fresh
        };

        Ok(RefreshOutcome {
            call: updated,
            corrupted: outcome.corrupted,
        })
    }

    async fn fetch_with_deadline(
        &self,
        contract_address: &ContractAddress,
    ) -> Result<MarketData, RefreshError> {
        let deadline = Duration::from_millis(self.config.feed_timeout_ms);
        match tokio::time::timeout(
            deadline,
            self.datasource.fetch_market_data(contract_address.as_str()),
        )
        .await
        {
            Ok(result) => Ok(result?),
            Err(_) => Err(RefreshError::FeedTimeout),
        }
    }

    fn lock_for(&self, id: Uuid) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().expect("call lock registry");
        locks
            .entry(id)
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}

enum ItemResult {
    Refreshed,
    RefreshedCorrupted,
    Skipped,
    Errored,
}
