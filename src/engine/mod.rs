//! Pure computation engines for PnL, scoring, and display formatting.
//!
//! Nothing in this module touches the database or the network; the refresher
//! feeds samples in and persists the outcomes.

pub mod display;
pub mod pnl;
pub mod scoring;

pub use display::format_pnl_display;
pub use pnl::{apply_sample, PnlError, SampleOutcome};
pub use scoring::{
    base_points, is_successful, market_cap_multiplier, score_call, win_rate, LinearDecay, NoDecay,
    TimeDecay,
};
