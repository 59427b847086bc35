//! Final payment aggregation
//!
//! Applies the multiple procedure reduction (CMS §40.5) and the
//! lower-of-charges rule (CMS §40), then sums to claim totals. Ranking uses
//! the lower of the billed charge (per unit) or the adjusted rate. Each
//! line's allowed amount is rounded to the cent as it is computed, and the
//! claim totals are the exact sums of the per-line rounded amounts, so
//! `sum(line_payment) == total_payment` holds exactly.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use pricing_kernel::{round_cents, ClaimLine};

use crate::output::AscLineOutput;

const MEDICARE_SHARE: Decimal = dec!(0.80);
const BENEFICIARY_SHARE: Decimal = dec!(0.20);
const HALF: Decimal = dec!(0.5);

/// Claim-level totals produced by aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClaimTotals {
    /// Medicare 80% total
    pub payment: Decimal,
    /// Beneficiary 20% total
    pub copayment: Decimal,
    /// Total allowed amount
    pub total: Decimal,
}

/// Ranks, discounts, and sums the adjusted lines.
///
/// Returns the lines re-sorted by claim line number alongside the claim
/// totals. Non-payable lines pass through untouched (their money fields
/// were zeroed upstream).
pub fn aggregate(
    claim_lines: &[ClaimLine],
    outputs: Vec<AscLineOutput>,
) -> (Vec<AscLineOutput>, ClaimTotals) {
    // Effective units: post-MUE cap when set, else billed units (min 1).
    let effective_units = |out: &AscLineOutput| -> u32 {
        if out.units > 0 {
            out.units
        } else {
            claim_lines
                .get(out.line_number as usize - 1)
                .map(ClaimLine::billed_units)
                .unwrap_or(1)
        }
    };

    // Lower of the adjusted rate and the billed charge per unit.
    let effective_rate = |out: &AscLineOutput| -> Decimal {
        let rate = out.adjusted_rate;
        let charges = claim_lines
            .get(out.line_number as usize - 1)
            .map(|line| line.charges)
            .unwrap_or(Decimal::ZERO);
        if charges > Decimal::ZERO {
            let per_unit = charges / Decimal::from(effective_units(out));
            rate.min(per_unit)
        } else {
            rate
        }
    };

    let (mut discount_lines, mut other_lines): (Vec<_>, Vec<_>) = outputs
        .into_iter()
        .partition(|out| out.subject_to_discount && out.adjusted_rate > Decimal::ZERO);

    // Rank by effective rate descending; the sort is stable, so equal rates
    // keep claim-line order.
    discount_lines.sort_by(|a, b| effective_rate(b).cmp(&effective_rate(a)));

    let mut totals = ClaimTotals::default();
    let mut tally = |out: &mut AscLineOutput, allowed: Decimal| {
        let allowed = round_cents(allowed);
        out.line_payment = round_cents(allowed * MEDICARE_SHARE);
        out.line_copayment = round_cents(allowed * BENEFICIARY_SHARE);
        out.line_total = allowed;
        totals.payment += out.line_payment;
        totals.copayment += out.line_copayment;
        totals.total += allowed;
    };

    // First-ranked procedure: first unit at 100%, additional units at 50%.
    // Every other ranked procedure: all units at 50%.
    for (rank, out) in discount_lines.iter_mut().enumerate() {
        let units = effective_units(out);
        let rate = effective_rate(out);
        let allowed = if rank == 0 {
            out.discount_applied = false;
            rate + rate * HALF * Decimal::from(units - 1)
        } else {
            out.discount_applied = true;
            rate * HALF * Decimal::from(units)
        };
        out.units = units;
        tally(out, allowed);
    }

    // Non-discounted payable lines pay the effective rate for every unit.
    for out in other_lines.iter_mut() {
        if !out.is_payable() {
            continue;
        }
        let units = effective_units(out);
        let rate = effective_rate(out);
        out.units = units;
        tally(out, rate * Decimal::from(units));
    }

    let mut lines = discount_lines;
    lines.append(&mut other_lines);
    lines.sort_by_key(|out| out.line_number);

    (lines, totals)
}
