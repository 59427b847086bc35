//! Per-line rate adjustment
//!
//! Resolves a claim line's fee schedule entry and applies, in order: payment
//! indicator denials (CMS §60.3), geographic wage adjustment (CMS §40.2),
//! device offsets against the wage-adjusted rate (CMS §40.8, §40.10),
//! pass-through code pair offsets (CMS §40.7), modifier percentage cuts, and
//! the lower-of-charges cap. All arithmetic is decimal; quantization to
//! cents happens later, at summation.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use pricing_kernel::ClaimLine;
use refdata_asc::ReferenceBundle;

use crate::indicators::{
    modifier, DENY_INDICATORS, DENY_PACKAGED_INDICATORS, DEVICE_CODE_PREFIX,
    UNPROCESSABLE_INDICATORS, WAGE_EXEMPT_INDICATORS,
};
use crate::output::{AscLineOutput, LineStatus};

/// Remaining pass-through device units available for code pair offsets.
///
/// Per CMS §40.7, the number of code pairs receiving an offset may not
/// exceed the billed units of the pass-through device. The budget is built
/// once per claim and consumed while lines are adjusted in claim order; it
/// is claim-scoped state and never shared across claims.
#[derive(Debug, Default)]
pub struct DeviceUnitBudget {
    /// (device HCPCS, remaining units), in first-seen claim order
    entries: Vec<(String, u32)>,
}

impl DeviceUnitBudget {
    /// Collects the device-prefixed lines that appear in the code pair
    /// table, summing billed units across lines for the same device.
    pub fn from_claim(lines: &[ClaimLine], bundle: &ReferenceBundle) -> Self {
        let mut budget = Self::default();
        for line in lines {
            let hcpcs = normalized_hcpcs(line);
            if !is_device_code(&hcpcs) || !bundle.code_pairs.has_device(&hcpcs) {
                continue;
            }
            let units = line.billed_units();
            match budget.entries.iter_mut().find(|(code, _)| *code == hcpcs) {
                Some((_, remaining)) => *remaining += units,
                None => budget.entries.push((hcpcs, units)),
            }
        }
        budget
    }

    /// Remaining units for a device code (0 when absent)
    pub fn remaining(&self, device: &str) -> u32 {
        self.entries
            .iter()
            .find(|(code, _)| code == device)
            .map(|(_, remaining)| *remaining)
            .unwrap_or(0)
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn iter_mut(&mut self) -> impl Iterator<Item = &mut (String, u32)> {
        self.entries.iter_mut()
    }
}

fn normalized_hcpcs(line: &ClaimLine) -> String {
    line.hcpcs.trim().to_uppercase()
}

fn is_device_code(hcpcs: &str) -> bool {
    hcpcs.starts_with(DEVICE_CODE_PREFIX)
}

/// Prices a single claim line against the quarter's reference bundle.
///
/// `budget` is the claim-scoped device unit budget; lines must be adjusted
/// in ascending line order so that pass-through offsets consume device
/// units in claim order.
pub fn adjust_line(
    line: &ClaimLine,
    line_number: u32,
    bundle: &ReferenceBundle,
    wage_index: Decimal,
    budget: &mut DeviceUnitBudget,
    claim_date: NaiveDate,
) -> AscLineOutput {
    let mut out = AscLineOutput::new(line_number, line.hcpcs.clone(), line.units);

    let Some(info) = bundle.rate(&line.hcpcs) else {
        out.details = "Code not found in ASC Fee Schedule".to_string();
        return out;
    };

    let base_rate = info.rate;
    let indicator = info.indicator.clone();
    out.payment_indicator = indicator.clone();
    out.payment_rate = base_rate;
    out.wage_index = wage_index;
    out.subject_to_discount = info.subject_to_discount;

    // Payment indicator denials (CMS §60.3).
    if DENY_INDICATORS.contains(&indicator.as_str()) {
        out.status = Some(LineStatus::Denied);
        out.status_reason = format!("Indicator {indicator}: denied per CMS §60.3");
        out.details = format!("Denied (Indicator {indicator})");
        out.adjusted_rate = Decimal::ZERO;
        return out;
    }
    if DENY_PACKAGED_INDICATORS.contains(&indicator.as_str()) {
        out.status = Some(LineStatus::Packaged);
        out.status_reason =
            format!("Indicator {indicator}: packaged, no separate payment per CMS §60.3");
        out.details = format!("Packaged/No Separate Payment (Indicator {indicator})");
        out.adjusted_rate = Decimal::ZERO;
        return out;
    }
    if UNPROCESSABLE_INDICATORS.contains(&indicator.as_str()) {
        out.status = Some(LineStatus::Unprocessable);
        out.status_reason = format!("Indicator {indicator}: unprocessable per CMS §60.3");
        out.details = format!("Unprocessable (Indicator {indicator})");
        out.adjusted_rate = Decimal::ZERO;
        return out;
    }

    if base_rate == Decimal::ZERO {
        out.status = Some(LineStatus::Packaged);
        out.details = "Packaged or No Payment".to_string();
        return out;
    }

    out.status = Some(LineStatus::Payable);

    let is_terminated_pre = line.has_modifier(modifier::TERMINATED_PRE_ANESTHESIA);
    let is_terminated_post = line.has_modifier(modifier::TERMINATED_POST_ANESTHESIA);
    let is_reduced = line.has_modifier(modifier::REDUCED_PROCEDURE);
    let has_fb = line.has_modifier(modifier::DEVICE_NO_COST);
    let has_fc = line.has_modifier(modifier::DEVICE_PARTIAL_CREDIT);

    // Geographic adjustment (CMS §40.2). Exempt indicators pay the flat
    // rate; everything else splits 50/50 into labor and non-labor portions
    // with the wage index on the labor half.
    let mut adjusted_rate = if WAGE_EXEMPT_INDICATORS.contains(&indicator.as_str()) {
        out.details
            .push_str(&format!(" (No Wage Adj: Indicator {indicator})"));
        base_rate
    } else {
        let half = dec!(0.5);
        let labor = base_rate * half;
        let non_labor = base_rate * half;
        labor * wage_index + non_labor
    };

    // Device offset comes off the wage-adjusted rate (CMS §40.8, §40.10).
    let mut device_credit = false;
    let mut device_offset_amount = Decimal::ZERO;

    if is_terminated_pre {
        // §40.10: terminated pre-anesthesia removes the full device offset
        // before the 50% cut. FB/FC credits do not stack on top of it.
        let device_offset = bundle.device_offset(&line.hcpcs);
        if device_offset > Decimal::ZERO {
            adjusted_rate = (adjusted_rate - device_offset).max(Decimal::ZERO);
            out.details.push_str(&format!(
                " (Mod 73: Device Offset {device_offset:.2} Removed)"
            ));
        }
        if has_fb || has_fc {
            out.details.push_str(" (Mod 73 present, FB/FC Ignored)");
        }
    } else if has_fb || has_fc {
        // §40.8: FB = full credit (100% offset), FC = partial credit (50%).
        let device_offset = bundle.device_offset(&line.hcpcs);
        if device_offset > Decimal::ZERO {
            device_credit = true;
            device_offset_amount = if has_fb {
                device_offset
            } else {
                device_offset * dec!(0.50)
            };
            let label = if has_fb { "FB: Full" } else { "FC: Partial" };
            out.details.push_str(&format!(
                " (Mod {label} Device Offset -{device_offset_amount:.2})"
            ));
            adjusted_rate = (adjusted_rate - device_offset_amount).max(Decimal::ZERO);
        }
    }

    // Pass-through code pair offset (CMS §40.7): non-device lines only, one
    // device unit consumed per line, first matching device wins.
    let line_hcpcs = normalized_hcpcs(line);
    if !is_device_code(&line_hcpcs) && !budget.is_empty() && !bundle.code_pairs.is_empty() {
        for (device_code, remaining) in budget.iter_mut() {
            if *remaining == 0 {
                continue;
            }
            let Some(multiplier) =
                bundle
                    .code_pairs
                    .multiplier_for(device_code, &line.hcpcs, claim_date)
            else {
                continue;
            };
            if multiplier > Decimal::ZERO {
                let offset = adjusted_rate * multiplier;
                adjusted_rate = (adjusted_rate - offset).max(Decimal::ZERO);
                out.code_pair_offset = offset;
                out.code_pair_device = device_code.clone();
                out.details
                    .push_str(&format!(" (CodePair:{device_code} -{offset:.2})"));
                *remaining -= 1;
                break;
            }
        }
    }

    // Modifier percentage cuts. The device offset already came off the
    // adjusted rate above; only the percentage reductions remain.
    if is_terminated_pre {
        adjusted_rate *= dec!(0.5);
        out.subject_to_discount = false;
        out.details.push_str(" (Mod 73: 50% Reduct)");
        if line.charges > Decimal::ZERO && line.charges < adjusted_rate {
            adjusted_rate = line.charges;
            out.details
                .push_str(&format!(" (Lower-of: Charges {:.2})", line.charges));
        }
        out.adjusted_rate = adjusted_rate;
        out.device_credit = false;
        out.device_offset_amount = Decimal::ZERO;
        return out;
    }

    if is_reduced {
        adjusted_rate *= dec!(0.5);
        out.subject_to_discount = false;
        out.details.push_str(" (Mod 52: 50% Reduct)");
    } else if is_terminated_post {
        out.details.push_str(" (Mod 74: Full Pay)");
    }

    // Lower-of: submitted charges vs adjusted rate (CMS §40). The per-unit
    // comparison is applied again during aggregation.
    if line.charges > Decimal::ZERO && line.charges < adjusted_rate {
        adjusted_rate = line.charges;
        out.details
            .push_str(&format!(" (Lower-of: Charges {:.2})", line.charges));
    }

    out.adjusted_rate = adjusted_rate;
    out.device_credit = device_credit;
    out.device_offset_amount = device_offset_amount;
    out
}
