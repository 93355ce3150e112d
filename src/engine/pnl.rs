//! PnL computation under the ATH-lock / 2x-lock / 10x-cap rules.
//!
//! The engine is a pure function from (call state, market sample) to a new
//! set of derived fields. Lock state is monotonic: `ath_price` never
//! decreases, and `locked_multiplier`, once engaged at 2x, only rises.
//! A corruption cross-check against market-cap movement keeps bad upstream
//! price samples from inflating the locks.

use crate::domain::{Call, Decimal, MarketData};
use thiserror::Error;

/// Displayed multiplier is capped at 10x (+900%) regardless of the raw value.
const DISPLAY_CAP: &str = "10";

/// Multiplier at which the lock engages.
const LOCK_THRESHOLD: &str = "2";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PnlError {
    /// Entry price is zero or negative. Fatal for the call; the caller must
    /// leave the record unmodified and never retry automatically.
    #[error("entry price must be positive, got {0}")]
    InvalidEntryPrice(Decimal),
}

/// Result of applying one market sample to a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleOutcome {
    /// New all-time-high price (>= entry; monotonic absent corruption).
    pub ath_price: Decimal,
    /// New lock state (non-decreasing).
    pub locked_multiplier: Option<Decimal>,
    /// Lock-or-live multiplier before the display cap; scoring tiers above
    /// 10x key off this value.
    pub raw_multiplier: Decimal,
    /// Effective multiplier after lock and cap rules.
    pub effective_multiplier: Decimal,
    /// Display PnL percent derived from the effective multiplier.
    pub pnl_percent: Decimal,
    /// True when the sample tripped the corruption cross-check and derived
    /// lock state was discarded.
    pub corrupted: bool,
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str_canonical(s).expect("literal decimal")
}

/// Apply one market sample to a call's lock state and derive display PnL.
///
/// Rules, in order:
/// 1. `entry_price > 0`, else [`PnlError::InvalidEntryPrice`].
/// 2. Corruption cross-check: a sample whose price-implied multiplier exceeds
///    `corruption_threshold` times the market-cap ratio over the same
///    interval is not trusted. Its price neither raises the ATH nor engages
///    a lock, and accumulated `ath_price`/`locked_multiplier` are discarded
///    back to the entry baseline (they were built from the same bad feed).
/// 3. ATH update: `ath = max(ath, price)`.
/// 4. 2x lock: once `ath / entry >= 2`, the lock is set to that multiplier
///    and never lowered by later samples.
/// 5. Pre-lock display tracks the live price; locked display reports the lock.
/// 6. 10x display cap, then `pnl_percent = (effective - 1) * 100`.
pub fn apply_sample(
    call: &Call,
    sample: &MarketData,
    corruption_threshold: Decimal,
) -> Result<SampleOutcome, PnlError> {
    if !call.entry_price.is_positive() {
        return Err(PnlError::InvalidEntryPrice(call.entry_price));
    }

    let live_multiplier = sample.price / call.entry_price;

    let corrupted = is_corrupted(
        live_multiplier,
        call.entry_market_cap,
        sample.market_cap,
        corruption_threshold,
    );

    let (ath_price, locked_multiplier) = if corrupted {
        // Quarantine: the sample's price is untrusted, so it cannot seed new
        // lock state, and the accumulated highs are re-derived from entry.
        (call.entry_price, None)
    } else {
        let ath_price = call.ath_price.max(sample.price);
        let ath_multiplier = ath_price / call.entry_price;

        let locked_multiplier = if ath_multiplier >= dec(LOCK_THRESHOLD) {
            Some(
                call.locked_multiplier
                    .unwrap_or_else(Decimal::zero)
                    .max(ath_multiplier),
            )
        } else {
            call.locked_multiplier
        };
        (ath_price, locked_multiplier)
    };

    let raw_multiplier = locked_multiplier.unwrap_or(live_multiplier);
    let effective = raw_multiplier.min(dec(DISPLAY_CAP));
    let pnl_percent = (effective - Decimal::one()) * Decimal::hundred();

    Ok(SampleOutcome {
        ath_price,
        locked_multiplier,
        raw_multiplier,
        effective_multiplier: effective,
        pnl_percent,
        corrupted,
    })
}

/// Cross-check a price-implied multiplier against market-cap movement.
///
/// Supply is effectively constant for tracked tokens, so price multiplier and
/// market-cap ratio move together; a price multiplier several times the cap
/// ratio at the same instant means the feed returned a bad price. The check
/// only fires when both caps are positive; a feed that omits market cap
/// cannot veto the price-derived value.
fn is_corrupted(
    live_multiplier: Decimal,
    entry_market_cap: Decimal,
    current_market_cap: Decimal,
    threshold: Decimal,
) -> bool {
    if !entry_market_cap.is_positive() || !current_market_cap.is_positive() {
        return false;
    }
    let ratio = current_market_cap / entry_market_cap;
    live_multiplier > threshold * ratio
}
