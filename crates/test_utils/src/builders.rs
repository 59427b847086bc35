//! Test Data Builders
//!
//! Builder patterns for constructing claims with sensible defaults, so
//! tests specify only the fields they care about.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use pricing_kernel::{Claim, ClaimLine, ProviderRecord};

/// Builder for claim lines
pub struct LineBuilder {
    line: ClaimLine,
}

impl LineBuilder {
    /// Creates a line for a HCPCS code with 1 unit and no modifiers
    pub fn new(hcpcs: impl Into<String>) -> Self {
        Self {
            line: ClaimLine::new(hcpcs),
        }
    }

    /// Sets the billed units
    pub fn units(mut self, units: u32) -> Self {
        self.line.units = units;
        self
    }

    /// Appends a modifier
    pub fn modifier(mut self, modifier: impl Into<String>) -> Self {
        self.line.modifiers.push(modifier.into());
        self
    }

    /// Sets the billed charges
    pub fn charges(mut self, charges: Decimal) -> Self {
        self.line.charges = charges;
        self
    }

    /// Sets the revenue code
    pub fn revenue_code(mut self, code: impl Into<String>) -> Self {
        self.line.revenue_code = code.into();
        self
    }

    /// Sets the line-level date of service
    pub fn service_date(mut self, year: i32, month: u32, day: u32) -> Self {
        self.line.service_date = NaiveDate::from_ymd_opt(year, month, day);
        self
    }

    /// Finishes the line
    pub fn build(self) -> ClaimLine {
        self.line
    }
}

/// Builder for claims
pub struct ClaimBuilder {
    claim: Claim,
}

impl Default for ClaimBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClaimBuilder {
    /// Creates an empty claim
    pub fn new() -> Self {
        Self {
            claim: Claim::default(),
        }
    }

    /// Sets the thru date
    pub fn thru_date(mut self, year: i32, month: u32, day: u32) -> Self {
        self.claim.thru_date = NaiveDate::from_ymd_opt(year, month, day);
        self
    }

    /// Sets the from date
    pub fn from_date(mut self, year: i32, month: u32, day: u32) -> Self {
        self.claim.from_date = NaiveDate::from_ymd_opt(year, month, day);
        self
    }

    /// Sets an explicit CBSA override in additional data
    pub fn cbsa(mut self, cbsa: impl Into<String>) -> Self {
        self.claim
            .additional_data
            .insert("cbsa".to_string(), cbsa.into());
        self
    }

    /// Appends a claim line
    pub fn line(mut self, line: ClaimLine) -> Self {
        self.claim.lines.push(line);
        self
    }

    /// Finishes the claim
    pub fn build(self) -> Claim {
        self.claim
    }
}

/// A provider record with both CBSA locations populated
pub fn provider_with_cbsa(cbsa: impl Into<String>) -> ProviderRecord {
    let cbsa = cbsa.into();
    ProviderRecord {
        provider_type: Some("83".to_string()),
        cbsa_wage_index_location: Some(cbsa.clone()),
        cbsa_actual_geographic_location: Some(cbsa),
    }
}
