//! Scoring: multiplier tiers, market-cap weighting, and time decay.
//!
//! A call's score is `base(multiplier) * mcap_weight(entry_market_cap) *
//! decay(age)`. The market-cap weight applies only to positive base points,
//! and decay shrinks magnitude without ever flipping sign.

use crate::domain::Decimal;
use chrono::Duration;
use std::fmt;

/// Multiplier at or above which a call counts as successful for win rate.
const SUCCESS_THRESHOLD: &str = "1.8";

/// Hours of grace before any decay applies.
const DECAY_GRACE_HOURS: i64 = 24;

fn dec(s: &str) -> Decimal {
    Decimal::from_str_canonical(s).expect("literal decimal")
}

/// Base points from the multiplier tier. Boundaries are half-open with the
/// lower bound inclusive.
pub fn base_points(multiplier: Decimal) -> Decimal {
    let tiers: [(&str, i64); 9] = [
        ("200", 15),
        ("100", 10),
        ("50", 7),
        ("20", 4),
        ("10", 3),
        ("5", 2),
        ("1.8", 1),
        ("1.3", 0),
        ("1", -1),
    ];

    for (bound, points) in tiers {
        if multiplier >= dec(bound) {
            return Decimal::from_i64(points);
        }
    }
    Decimal::from_i64(-2)
}

/// Weight from the entry market cap. Rewards low-cap conviction without
/// doubly punishing losses: applied only to positive base points.
pub fn market_cap_multiplier(entry_market_cap: Decimal) -> Decimal {
    if entry_market_cap >= dec("1000000") {
        dec("1.5")
    } else if entry_market_cap >= dec("50000") {
        Decimal::one()
    } else if entry_market_cap >= dec("25000") {
        dec("0.75")
    } else {
        dec("0.5")
    }
}

/// Time-decay strategy: `factor(age)` is in (0, 1], equals 1 inside the
/// first 24 hours, and is monotonically non-increasing afterwards.
pub trait TimeDecay: Send + Sync + fmt::Debug {
    fn factor(&self, age: Duration) -> Decimal;
}

/// No decay: every call keeps its full score indefinitely.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDecay;

impl TimeDecay for NoDecay {
    fn factor(&self, _age: Duration) -> Decimal {
        Decimal::one()
    }
}

/// Linear decay: full score for 24 hours, then a straight slide down to a
/// floor of 0.1 over the following seven days.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearDecay;

impl LinearDecay {
    const WINDOW_DAYS: i64 = 7;
    const FLOOR: &'static str = "0.1";
}

impl TimeDecay for LinearDecay {
    fn factor(&self, age: Duration) -> Decimal {
        let grace = Duration::hours(DECAY_GRACE_HOURS);
        if age <= grace {
            return Decimal::one();
        }

        let elapsed = (age - grace).num_seconds();
        let window = Duration::days(Self::WINDOW_DAYS).num_seconds();
        let floor = dec(Self::FLOOR);
        if elapsed >= window {
            return floor;
        }

        let progress = Decimal::from_i64(elapsed) / Decimal::from_i64(window);
        let slide = (Decimal::one() - floor) * progress;
        (Decimal::one() - slide).max(floor)
    }
}

/// Score a call from its effective multiplier, entry market cap, and age.
pub fn score_call(
    multiplier: Decimal,
    entry_market_cap: Decimal,
    age: Duration,
    decay: &dyn TimeDecay,
) -> Decimal {
    let base = base_points(multiplier);
    let weighted = if base.is_positive() {
        base * market_cap_multiplier(entry_market_cap)
    } else {
        base
    };
    weighted * decay.factor(age)
}

/// A call counts as successful once its multiplier reaches 1.8x.
pub fn is_successful(multiplier: Decimal) -> bool {
    multiplier >= dec(SUCCESS_THRESHOLD)
}

/// Win rate as a percentage, with the zero-calls case pinned to 0.
pub fn win_rate(successful_calls: i64, total_calls: i64) -> Decimal {
    if total_calls == 0 {
        return Decimal::zero();
    }
    Decimal::from_i64(successful_calls) / Decimal::from_i64(total_calls) * Decimal::hundred()
}
