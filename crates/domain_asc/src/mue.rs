//! Medically Unlikely Edit (MUE) enforcement
//!
//! MUEs cap the units billable for a HCPCS code on a single date of
//! service. Two enforcement modes exist:
//!
//! - `up_to_limit = false` (line edit): if total billed units for a code
//!   exceed the limit, ALL lines for that code are denied outright.
//! - `up_to_limit = true` (date-of-service edit): units up to the limit are
//!   payable; lines are filled greedily in claim order until the budget is
//!   exhausted, the first overflowing line is capped, and the rest denied.
//!
//! Only currently-payable lines participate; lines already denied,
//! packaged, or unprocessable are excluded from unit sums and mutation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use pricing_kernel::ClaimLine;

use crate::output::{AscLineOutput, LineStatus};

/// MUE rule for one HCPCS code
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AscMueLimit {
    pub code: String,
    /// Maximum payable units per date of service
    pub mue_limit: u32,
    /// false = line edit (deny everything), true = date-of-service edit
    pub up_to_limit: bool,
}

/// Applies MUE limits to the candidate line outputs in place.
///
/// No-op when `mues` is empty. Lines for the same HCPCS on different
/// service dates are evaluated independently; lines with no service date
/// share one bucket.
pub fn enforce_mue(
    claim_lines: &[ClaimLine],
    outputs: &mut [AscLineOutput],
    mues: &HashMap<String, AscMueLimit>,
) {
    if mues.is_empty() {
        return;
    }

    // Group payable output lines by (HCPCS, service date), keeping
    // first-seen order so mutation order is deterministic.
    type GroupKey = (String, Option<NaiveDate>);
    let mut group_order: Vec<GroupKey> = Vec::new();
    let mut groups: HashMap<GroupKey, Vec<usize>> = HashMap::new();

    for (idx, out) in outputs.iter().enumerate() {
        if !out.is_payable() || !mues.contains_key(&out.hcpcs) {
            continue;
        }
        let service_date = claim_lines
            .get(out.line_number as usize - 1)
            .and_then(|line| line.service_date);
        let key = (out.hcpcs.clone(), service_date);
        if !groups.contains_key(&key) {
            group_order.push(key.clone());
        }
        groups.entry(key).or_default().push(idx);
    }

    for key in group_order {
        let members = &groups[&key];
        let rule = &mues[&key.0];

        let billed = |out: &AscLineOutput| -> u32 {
            claim_lines
                .get(out.line_number as usize - 1)
                .map(ClaimLine::billed_units)
                .unwrap_or(1)
        };
        let total_units: u32 = members.iter().map(|&i| billed(&outputs[i])).sum();

        if total_units <= rule.mue_limit {
            continue;
        }

        if !rule.up_to_limit {
            // Line edit: the claim cannot be split; deny every line.
            for &i in members {
                let out = &mut outputs[i];
                out.status = Some(LineStatus::Denied);
                out.status_reason = format!(
                    "MUE exceeded: {total_units} units billed, limit is {} (all units denied)",
                    rule.mue_limit
                );
                out.zero_payment();
            }
        } else {
            // Date-of-service edit: greedy fill in claim order.
            let mut remaining = rule.mue_limit;
            for &i in members {
                let line_units = billed(&outputs[i]);
                let out = &mut outputs[i];
                if remaining == 0 {
                    out.status = Some(LineStatus::Denied);
                    out.status_reason = format!(
                        "MUE exceeded: {total_units} units billed, limit is {} (excess denied)",
                        rule.mue_limit
                    );
                    out.zero_payment();
                } else if line_units > remaining {
                    // Partial: cap this line's units at the remaining budget.
                    // The money fields are recomputed during aggregation from
                    // the capped unit count.
                    out.units = remaining;
                    out.status_reason = format!(
                        "MUE partial: {line_units} units billed, {remaining} allowed (limit {})",
                        rule.mue_limit
                    );
                    remaining = 0;
                } else {
                    remaining -= line_units;
                }
            }
        }
    }
}
