//! Claim input model
//!
//! The claim shape consumed by the pricers. Claims arrive already parsed
//! and validated upstream; the pricers treat them as immutable input.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single billed service line on a claim
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimLine {
    /// HCPCS code identifying the billed service
    pub hcpcs: String,
    /// Billed units; 0 is treated as 1 during pricing
    pub units: u32,
    /// Two-character modifier codes, in billed order
    pub modifiers: Vec<String>,
    /// Billed charges for the line
    pub charges: Decimal,
    /// Revenue code
    pub revenue_code: String,
    /// Line-level date of service; falls back to the claim thru date
    pub service_date: Option<NaiveDate>,
}

impl ClaimLine {
    /// Creates a line with a single unit and no modifiers
    pub fn new(hcpcs: impl Into<String>) -> Self {
        Self {
            hcpcs: hcpcs.into(),
            units: 1,
            modifiers: Vec::new(),
            charges: Decimal::ZERO,
            revenue_code: String::new(),
            service_date: None,
        }
    }

    /// Billed units with the minimum-of-one rule applied
    pub fn billed_units(&self) -> u32 {
        self.units.max(1)
    }

    /// Returns true if the line carries the given modifier
    pub fn has_modifier(&self, modifier: &str) -> bool {
        self.modifiers.iter().any(|m| m == modifier)
    }
}

/// An institutional claim as presented to a pricer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Claim {
    /// Statement-covers-from date
    pub from_date: Option<NaiveDate>,
    /// Statement-covers-thru date; drives reference data selection
    pub thru_date: Option<NaiveDate>,
    /// Free-form key/value data; may carry an explicit "cbsa" override
    pub additional_data: HashMap<String, String>,
    /// Service lines in billed order
    pub lines: Vec<ClaimLine>,
}

impl Claim {
    /// Returns the explicit CBSA override, if one was supplied
    pub fn cbsa_override(&self) -> Option<&str> {
        self.additional_data.get("cbsa").map(String::as_str)
    }
}

/// Provider-master lookup result used for wage-index geography
///
/// This mirrors the consumption contract of the outpatient provider file:
/// the pricer only reads the CBSA location fields and the provider type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderRecord {
    /// Provider type code
    pub provider_type: Option<String>,
    /// CBSA used for wage-index lookup
    pub cbsa_wage_index_location: Option<String>,
    /// Actual geographic CBSA, used when no wage-index location is on file
    pub cbsa_actual_geographic_location: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_billed_units_minimum_one() {
        let mut line = ClaimLine::new("10060");
        line.units = 0;
        assert_eq!(line.billed_units(), 1);
        line.units = 3;
        assert_eq!(line.billed_units(), 3);
    }

    #[test]
    fn test_has_modifier() {
        let mut line = ClaimLine::new("10060");
        line.modifiers = vec!["73".to_string(), "FB".to_string()];
        assert!(line.has_modifier("73"));
        assert!(!line.has_modifier("52"));
    }

    #[test]
    fn test_cbsa_override() {
        let mut claim = Claim::default();
        assert_eq!(claim.cbsa_override(), None);
        claim
            .additional_data
            .insert("cbsa".to_string(), "16974".to_string());
        assert_eq!(claim.cbsa_override(), Some("16974"));
    }
}
