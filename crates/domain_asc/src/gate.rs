//! Ancillary service gate
//!
//! Per CMS §60.2, covered ancillary services (Addendum BB) are payable only
//! when a related surgical procedure (Addendum AA) is payable on the same
//! claim. Without one, every payable BB line is returned as unprocessable.

use rust_decimal::Decimal;
use std::collections::HashMap;

use refdata_asc::{Addendum, RateInfo};

use crate::output::{AscLineOutput, LineStatus};

/// Downgrades payable ancillary lines when no payable surgical line exists.
///
/// A HCPCS missing from the rate table counts as surgical (default AA), so
/// only lines positively known to be ancillary are downgraded. The money
/// fields of downgraded lines are zeroed by aggregation, which only sums
/// payable lines.
pub fn gate_ancillary(outputs: &mut [AscLineOutput], rates: &HashMap<String, RateInfo>) {
    let addendum_of = |hcpcs: &str| rates.get(hcpcs).map(|info| info.addendum);

    let has_payable_surgical = outputs.iter().any(|out| {
        out.is_payable() && addendum_of(&out.hcpcs).unwrap_or(Addendum::Surgical) == Addendum::Surgical
    });
    if has_payable_surgical {
        return;
    }

    for out in outputs.iter_mut() {
        if out.is_payable() && addendum_of(&out.hcpcs) == Some(Addendum::Ancillary) {
            out.status = Some(LineStatus::Unprocessable);
            out.status_reason = "No related surgical procedure on claim (CMS §60.2)".to_string();
            out.adjusted_rate = Decimal::ZERO;
        }
    }
}
