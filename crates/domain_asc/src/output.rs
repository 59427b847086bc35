//! Pricer output model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use pricing_kernel::ReturnCode;

/// Final disposition of a claim line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStatus {
    /// Separately payable
    Payable,
    /// Denied, no payment
    Denied,
    /// Returned as unprocessable
    Unprocessable,
    /// Packaged into another service, no separate payment
    Packaged,
}

/// Pricing result for one claim line
///
/// Created by the line adjuster, then mutated by the MUE enforcer, the
/// ancillary gate, and finally the payment aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AscLineOutput {
    /// 1-based claim line number
    pub line_number: u32,
    pub hcpcs: String,
    pub payment_indicator: String,
    /// National payment rate from the fee schedule, kept for reference even
    /// when the line is denied
    pub payment_rate: Decimal,
    pub wage_index: Decimal,
    /// Wage-adjusted per-unit rate (before multiple procedure reduction)
    pub adjusted_rate: Decimal,
    /// Effective units billed (may be capped by an MUE)
    pub units: u32,
    pub device_offset_amount: Decimal,
    /// True when an FB/FC device credit reduced the base rate
    pub device_credit: bool,
    /// Offset taken under a pass-through code pair
    pub code_pair_offset: Decimal,
    /// Device HCPCS that triggered the code pair offset
    pub code_pair_device: String,
    /// Accumulated human-readable adjustment notes
    pub details: String,
    /// `None` when the HCPCS was not found in the fee schedule
    pub status: Option<LineStatus>,
    /// Reason for denial/rejection
    pub status_reason: String,
    pub subject_to_discount: bool,
    /// True if the 50% multiple procedure reduction was applied
    pub discount_applied: bool,
    /// Medicare 80% payment for this line
    pub line_payment: Decimal,
    /// Beneficiary 20% copayment for this line
    pub line_copayment: Decimal,
    /// Total allowed amount (100% = payment + copayment)
    pub line_total: Decimal,
}

impl AscLineOutput {
    /// Creates an empty output for a claim line
    pub fn new(line_number: u32, hcpcs: impl Into<String>, units: u32) -> Self {
        Self {
            line_number,
            hcpcs: hcpcs.into(),
            payment_indicator: String::new(),
            payment_rate: Decimal::ZERO,
            wage_index: Decimal::ZERO,
            adjusted_rate: Decimal::ZERO,
            units,
            device_offset_amount: Decimal::ZERO,
            device_credit: false,
            code_pair_offset: Decimal::ZERO,
            code_pair_device: String::new(),
            details: String::new(),
            status: None,
            status_reason: String::new(),
            subject_to_discount: false,
            discount_applied: false,
            line_payment: Decimal::ZERO,
            line_copayment: Decimal::ZERO,
            line_total: Decimal::ZERO,
        }
    }

    /// True when the line is still separately payable
    pub fn is_payable(&self) -> bool {
        self.status == Some(LineStatus::Payable)
    }

    /// Zeroes the rate, units, and all money fields (full denial)
    pub(crate) fn zero_payment(&mut self) {
        self.adjusted_rate = Decimal::ZERO;
        self.units = 0;
        self.line_payment = Decimal::ZERO;
        self.line_copayment = Decimal::ZERO;
        self.line_total = Decimal::ZERO;
    }
}

/// Claim-level ASC pricing result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AscOutput {
    /// CBSA used for the wage index lookup
    pub cbsa: String,
    pub wage_index: Decimal,
    /// Line results, ordered by claim line number
    pub lines: Vec<AscLineOutput>,
    /// Medicare 80% total
    pub total_payment: Decimal,
    /// Beneficiary 20% total
    pub total_copayment: Decimal,
    /// Total allowed amount (100%)
    pub total: Decimal,
    /// Set when a claim-level precondition failed; lines will be empty
    pub error: Option<ReturnCode>,
    /// Informational message (e.g. wage index defaulted to 1.0)
    pub message: Option<String>,
}

impl AscOutput {
    /// The Medicare payment for the claim
    pub fn payment(&self) -> Decimal {
        self.total_payment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_zero_payment_clears_money_fields() {
        let mut line = AscLineOutput::new(1, "10060", 3);
        line.adjusted_rate = dec!(100);
        line.line_payment = dec!(80);
        line.line_copayment = dec!(20);
        line.line_total = dec!(100);

        line.zero_payment();
        assert_eq!(line.adjusted_rate, Decimal::ZERO);
        assert_eq!(line.units, 0);
        assert_eq!(line.line_total, Decimal::ZERO);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&LineStatus::Unprocessable).unwrap();
        assert_eq!(json, "\"unprocessable\"");
    }
}
