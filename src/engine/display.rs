//! Display formatting for PnL values.
//!
//! Pure presentation rule, kept next to the engine because the rendered form
//! is part of the user-facing contract: losses and small gains render as a
//! signed percentage, 2x and above renders as a multiplier string.

use crate::domain::Decimal;

/// Format a PnL percent for display.
///
/// Derives `multiplier = pnl_percent / 100 + 1`:
/// - below 1x: negative percentage, e.g. `-30.0%`
/// - 1x to 2x: signed percentage, e.g. `+50.0%`
/// - 2x and above: multiplier string, e.g. `2.5x`
pub fn format_pnl_display(pnl_percent: Decimal) -> String {
    let multiplier = pnl_percent / Decimal::hundred() + Decimal::one();

    if multiplier < Decimal::from_i64(2) {
        format!("{:+.1}%", pnl_percent.to_f64())
    } else {
        format!("{:.1}x", multiplier.to_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn fmt(s: &str) -> String {
        format_pnl_display(Decimal::from_str(s).unwrap())
    }

    #[test]
    fn test_negative_renders_as_percentage() {
        assert_eq!(fmt("-30"), "-30.0%");
        assert_eq!(fmt("-99.94"), "-99.9%");
    }

    #[test]
    fn test_sub_two_x_renders_as_signed_percentage() {
        assert_eq!(fmt("50"), "+50.0%");
        assert_eq!(fmt("0"), "+0.0%");
        assert_eq!(fmt("99.9"), "+99.9%");
    }

    #[test]
    fn test_two_x_and_above_renders_as_multiplier() {
        assert_eq!(fmt("150"), "2.5x");
        assert_eq!(fmt("100"), "2.0x");
        assert_eq!(fmt("900"), "10.0x");
    }
}
