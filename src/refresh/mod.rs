//! Refresh orchestration: single-call refresh, bulk sweeps, and the
//! background poller.

pub mod poller;
pub mod refresher;

use crate::config::DecayMode;
use crate::engine::{LinearDecay, NoDecay, TimeDecay};
use std::sync::Arc;

pub use poller::spawn_poller;
pub use refresher::{RefreshError, RefreshOutcome, RefreshSummary, Refresher};

/// Build the configured time-decay strategy.
pub fn decay_for_mode(mode: DecayMode) -> Arc<dyn TimeDecay> {
    match mode {
        DecayMode::None => Arc::new(NoDecay),
        DecayMode::Linear => Arc::new(LinearDecay),
    }
}
