//! Reference bundle types
//!
//! One `ReferenceBundle` holds everything needed to price a claim against a
//! single regulatory quarter. Bundles are immutable once built and shared
//! behind `Arc` by the store.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Rate-table classification of a HCPCS code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Addendum {
    /// Addendum AA: surgical procedure
    #[serde(rename = "AA")]
    Surgical,
    /// Addendum BB: covered ancillary service
    #[serde(rename = "BB")]
    Ancillary,
}

/// Per-HCPCS fee schedule entry from Addendum AA/BB
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateInfo {
    /// National payment rate before geographic adjustment
    pub rate: Decimal,
    /// Two-character payment indicator
    pub indicator: String,
    /// Whether the multiple procedure reduction applies
    pub subject_to_discount: bool,
    /// Source addendum; BB entries overwrite AA on key collision
    pub addendum: Addendum,
}

/// One code pair entry linking a pass-through device to a procedure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodePairEntry {
    pub device_modifier: Option<String>,
    pub procedure_modifier: Option<String>,
    /// Offset multiplier applied to the procedure payment (typically 0-1)
    pub percent_multiplier: Decimal,
    /// Start of the validity window; open-ended when absent
    pub effective_date: Option<NaiveDate>,
    /// End of the validity window; open-ended when absent
    pub end_date: Option<NaiveDate>,
}

impl CodePairEntry {
    /// Returns true if the entry's validity window contains `date`
    pub fn covers(&self, date: NaiveDate) -> bool {
        match (self.effective_date, self.end_date) {
            (Some(eff), Some(end)) => eff <= date && date <= end,
            (Some(eff), None) => eff <= date,
            (None, Some(end)) => date <= end,
            (None, None) => true,
        }
    }
}

/// Code pair lookup keyed by device HCPCS, then procedure HCPCS
///
/// Multiple entries per (device, procedure) key carry different validity
/// windows across regulatory releases.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodePairTable {
    by_device: HashMap<String, HashMap<String, Vec<CodePairEntry>>>,
}

impl CodePairTable {
    /// Adds an entry for a (device, procedure) pair
    pub fn insert(&mut self, device: &str, procedure: &str, entry: CodePairEntry) {
        self.by_device
            .entry(device.to_string())
            .or_default()
            .entry(procedure.to_string())
            .or_default()
            .push(entry);
    }

    /// Returns true if no pairs are loaded
    pub fn is_empty(&self) -> bool {
        self.by_device.is_empty()
    }

    /// Returns true if the device HCPCS appears in any pair
    pub fn has_device(&self, device: &str) -> bool {
        self.by_device.contains_key(device)
    }

    /// Resolves the offset multiplier for a (device, procedure) pair valid
    /// on `date`. The first entry whose window covers the date wins.
    pub fn multiplier_for(
        &self,
        device: &str,
        procedure: &str,
        date: NaiveDate,
    ) -> Option<Decimal> {
        self.by_device
            .get(device)?
            .get(procedure)?
            .iter()
            .find(|entry| entry.covers(date))
            .map(|entry| entry.percent_multiplier)
    }
}

/// All reference tables for one regulatory quarter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceBundle {
    /// Fee schedule entries keyed by HCPCS (AA overlaid by BB)
    pub rates: HashMap<String, RateInfo>,
    /// Device-intensive offset amounts keyed by HCPCS
    pub device_offsets: HashMap<String, Decimal>,
    /// Wage index values keyed by CBSA
    pub wage_indices: HashMap<String, Decimal>,
    /// Pass-through device code pairs
    pub code_pairs: CodePairTable,
    /// Cache-format version this bundle was built under
    pub cache_version: u32,
}

impl ReferenceBundle {
    /// Fee schedule entry for a HCPCS code
    pub fn rate(&self, hcpcs: &str) -> Option<&RateInfo> {
        self.rates.get(hcpcs)
    }

    /// Device offset amount for a HCPCS code; zero when none is on file
    pub fn device_offset(&self, hcpcs: &str) -> Decimal {
        self.device_offsets
            .get(hcpcs)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Wage index for a CBSA, if the CBSA is on file
    pub fn wage_index(&self, cbsa: &str) -> Option<Decimal> {
        self.wage_indices.get(cbsa).copied()
    }
}
