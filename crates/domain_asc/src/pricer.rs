//! ASC pricer entry point
//!
//! Runs the full ASC pipeline for one claim. Expected missing-data
//! conditions (no provider/CBSA, no thru date, no reference data for the
//! date) come back as structured return codes on the output, never as
//! errors; only the output object is ever returned.

use rust_decimal::Decimal;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, error};

use pricing_kernel::{Claim, ProviderRecord, ReturnCode};
use refdata_asc::{AscReferenceStore, RefDataError};

use crate::aggregate::aggregate;
use crate::gate::gate_ancillary;
use crate::line::{adjust_line, DeviceUnitBudget};
use crate::mue::{enforce_mue, AscMueLimit};
use crate::output::AscOutput;

/// Prices institutional claims under the ASC payment system
pub struct AscPricer {
    store: AscReferenceStore,
}

impl AscPricer {
    /// Creates a pricer with a lazily loaded reference store
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            store: AscReferenceStore::new(data_dir),
        }
    }

    /// Creates a pricer and eagerly loads every available quarter, so
    /// pricing calls perform no filesystem I/O.
    pub fn with_preload(data_dir: impl Into<PathBuf>) -> Result<Self, RefDataError> {
        let pricer = Self::new(data_dir);
        pricer.store.preload()?;
        Ok(pricer)
    }

    /// Shared access to the underlying reference store
    pub fn store(&self) -> &AscReferenceStore {
        &self.store
    }

    /// Prices one claim.
    ///
    /// `provider` supplies wage-index geography when the claim carries no
    /// explicit `"cbsa"` override; `mues` supplies the Medically Unlikely
    /// Edit limits, keyed by HCPCS.
    pub fn price(
        &self,
        claim: &Claim,
        provider: Option<&ProviderRecord>,
        mues: Option<&HashMap<String, AscMueLimit>>,
    ) -> AscOutput {
        let mut output = AscOutput::default();

        // Wage index geography must come from somewhere: an explicit CBSA
        // override or the provider master record.
        if provider.is_none() && claim.cbsa_override().is_none() {
            output.error = Some(ReturnCode::new(
                "ASC01",
                "Missing Provider or CBSA",
                "ASC pricing requires provider data for wage index lookup.",
            ));
            return output;
        }

        let Some(thru_date) = claim.thru_date else {
            output.error = Some(ReturnCode::new(
                "ASC03",
                "Missing Thru Date",
                "ASC pricing requires thru date for reference data lookup.",
            ));
            return output;
        };

        let bundle = match self.store.bundle_for(thru_date) {
            Ok(bundle) => bundle,
            Err(RefDataError::DataNotFound(date)) => {
                output.error = Some(ReturnCode::new(
                    "ASC02",
                    "Data Not Found",
                    format!("No ASC reference data found for date {date}"),
                ));
                return output;
            }
            Err(e) => {
                error!(error = %e, "ASC reference data load failed");
                output.error = Some(ReturnCode::new("ASC99", "System Error", e.to_string()));
                return output;
            }
        };

        // CBSA precedence: explicit override, then the provider's wage
        // index location, then its actual geographic location.
        let cbsa = claim
            .cbsa_override()
            .map(str::to_string)
            .or_else(|| provider.and_then(|p| p.cbsa_wage_index_location.clone()))
            .or_else(|| provider.and_then(|p| p.cbsa_actual_geographic_location.clone()))
            .unwrap_or_else(|| "0".to_string());

        let wage_index = match bundle.wage_index(&cbsa) {
            Some(wi) => wi,
            None => {
                output.message = Some(format!(
                    "Wage Index not found for CBSA {cbsa}, it will default to 1.0. \
                     Please pass a valid CBSA in additional_data and reprocess if desired."
                ));
                Decimal::ONE
            }
        };
        output.cbsa = cbsa;
        output.wage_index = wage_index;

        // Device unit budget for pass-through code pairs, consumed while
        // lines are adjusted in claim order.
        let mut budget = DeviceUnitBudget::from_claim(&claim.lines, &bundle);

        let mut lines: Vec<_> = claim
            .lines
            .iter()
            .enumerate()
            .map(|(idx, line)| {
                adjust_line(line, idx as u32 + 1, &bundle, wage_index, &mut budget, thru_date)
            })
            .collect();

        // MUE runs before the ancillary gate so a surgical procedure denied
        // by an MUE also takes its ancillary services down.
        if let Some(mues) = mues {
            enforce_mue(&claim.lines, &mut lines, mues);
        }
        gate_ancillary(&mut lines, &bundle.rates);

        let (lines, totals) = aggregate(&claim.lines, lines);
        debug!(
            lines = lines.len(),
            total = %totals.total,
            "ASC claim priced"
        );

        output.lines = lines;
        output.total_payment = totals.payment;
        output.total_copayment = totals.copayment;
        output.total = totals.total;
        output
    }
}
