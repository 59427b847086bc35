//! Decimal money helpers
//!
//! All monetary arithmetic in the pricers uses rust_decimal. Values are
//! quantized to cents only at the documented rounding points (per-line and
//! claim-level summation); everything upstream stays at full precision.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds an amount to cents using banker's rounding (round half to even).
///
/// Medicare cent-level outputs are reproduced with half-even rounding, so
/// every quantization point in the pricers goes through this helper.
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}

/// Parses a currency cell from a published fee schedule.
///
/// CMS addenda mix plain numbers with `$`-prefixed, comma-grouped, and
/// quote-wrapped values. Unparsable cells resolve to zero rather than
/// failing the whole table load.
pub fn parse_currency(value: &str) -> Decimal {
    let cleaned: String = value
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | '"') && !c.is_whitespace())
        .collect();
    cleaned.parse().unwrap_or(Decimal::ZERO)
}

/// Parses a percentage cell, tolerating a trailing `%`.
///
/// `"0.41"` parses as-is; `"41%"` parses as `0.41`. Returns `None` for
/// unparsable values so callers can skip the entry.
pub fn parse_percent(value: &str) -> Option<Decimal> {
    let trimmed = value.trim();
    if let Some(stripped) = trimmed.strip_suffix('%') {
        let pct: Decimal = stripped.trim().parse().ok()?;
        Some(pct / Decimal::ONE_HUNDRED)
    } else {
        trimmed.parse().ok()
    }
}
