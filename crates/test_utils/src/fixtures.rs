//! Pre-built Test Fixtures
//!
//! In-memory reference bundles for domain unit tests, plus an on-disk
//! data-tree fixture for store and end-to-end pricer tests.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tempfile::TempDir;

use refdata_asc::{
    Addendum, CodePairEntry, CodePairTable, RateInfo, ReferenceBundle, CACHE_VERSION,
};

/// An empty reference bundle at the current cache version
pub fn empty_bundle() -> ReferenceBundle {
    ReferenceBundle {
        rates: HashMap::new(),
        device_offsets: HashMap::new(),
        wage_indices: HashMap::new(),
        code_pairs: CodePairTable::default(),
        cache_version: CACHE_VERSION,
    }
}

/// A surgical (Addendum AA) rate entry
pub fn surgical_rate(rate: Decimal, indicator: &str, subject_to_discount: bool) -> RateInfo {
    RateInfo {
        rate,
        indicator: indicator.to_string(),
        subject_to_discount,
        addendum: Addendum::Surgical,
    }
}

/// An ancillary (Addendum BB) rate entry
pub fn ancillary_rate(rate: Decimal, indicator: &str, subject_to_discount: bool) -> RateInfo {
    RateInfo {
        rate,
        indicator: indicator.to_string(),
        subject_to_discount,
        addendum: Addendum::Ancillary,
    }
}

/// An open-ended code pair entry with the given multiplier
pub fn open_code_pair(multiplier: Decimal) -> CodePairEntry {
    CodePairEntry {
        device_modifier: None,
        procedure_modifier: None,
        percent_multiplier: multiplier,
        effective_date: None,
        end_date: None,
    }
}

/// A code pair entry valid within a closed `YYYYMMDD` window
pub fn dated_code_pair(multiplier: Decimal, effective: &str, end: &str) -> CodePairEntry {
    let parse = |s: &str| NaiveDate::parse_from_str(s, "%Y%m%d").expect("fixture date");
    CodePairEntry {
        device_modifier: None,
        procedure_modifier: None,
        percent_multiplier: multiplier,
        effective_date: Some(parse(effective)),
        end_date: Some(parse(end)),
    }
}

/// On-disk reference data tree rooted in a temporary directory
///
/// Layout mirrors production: `<root>/<year>/<YYYYMMDD>/` quarter
/// directories plus a `<root>/normalized/` code-pair directory.
pub struct RefDataDir {
    root: TempDir,
}

impl Default for RefDataDir {
    fn default() -> Self {
        Self::new()
    }
}

impl RefDataDir {
    /// Creates an empty data tree
    pub fn new() -> Self {
        Self {
            root: TempDir::new().expect("create temp data dir"),
        }
    }

    /// The data directory to hand to the store/pricer
    pub fn path(&self) -> &Path {
        self.root.path()
    }

    /// Writes a file under the data directory, creating parent directories
    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.root.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create fixture dirs");
        }
        fs::write(&path, content).expect("write fixture file");
        path
    }

    /// Path of a quarter directory (`<year>/<quarter>`)
    pub fn quarter_dir(&self, quarter: &str) -> PathBuf {
        self.root.path().join(&quarter[..4]).join(quarter)
    }

    /// Writes a standard quarter: AA/BB/FF tables and a quarter-level wage
    /// index with CBSA 16974 at 1.5 and CBSA 35620 at 1.0234.
    ///
    /// Rates on file:
    /// - `10060` G2 $100.00, discountable (device offset $20 in FF)
    /// - `33249` G2 $800.00, discountable
    /// - `66982` G2 $1,000.00, discountable
    /// - `0101T` C5 $50.00 (deny indicator)
    /// - `78012` L1 $25.00 (packaged indicator)
    /// - `J0131` K2 $12.50, ancillary, wage-exempt
    pub fn write_standard_quarter(&self, quarter: &str) {
        let year = &quarter[..4];
        self.write(
            &format!("{year}/{quarter}/AA.csv"),
            "ASC Addendum AA\n\
             HCPCS Code,Subject to Multiple Procedure Discounting,Payment Indicator,Payment Rate\n\
             10060,Y,G2,$100.00\n\
             33249,Y,G2,$800.00\n\
             66982,Y,G2,\"$1,000.00\"\n\
             0101T,N,C5,$50.00\n\
             78012,N,L1,$25.00\n",
        );
        self.write(
            &format!("{year}/{quarter}/BB.csv"),
            "ASC Addendum BB\n\
             HCPCS Code,Subject to Multiple Procedure Discounting,Payment Indicator,Payment Rate\n\
             J0131,N,K2,$12.50\n",
        );
        self.write(
            &format!("{year}/{quarter}/FF.csv"),
            "HCPCS Code,Device Offset Amount\n10060,$20.00\n",
        );
        self.write(
            &format!("{year}/{quarter}/wage_index.csv"),
            &format!(
                "CBSA,Area Name,WI{}\n16974,Chicago IL,1.5000\n35620,New York NY,1.0234\n",
                &year[2..]
            ),
        );
    }

    /// Writes a normalized code-pair file for a year
    pub fn write_code_pairs(&self, year: &str, rows: &str) {
        self.write(
            &format!("normalized/code_pairs_{year}.csv"),
            &format!(
                "device_hcpcs,procedure_hcpcs,device_modifier,procedure_modifier,\
                 percent_multiplier,effective_date,end_date\n{rows}"
            ),
        );
    }
}

/// The wage index the standard quarter assigns to CBSA 16974
pub fn standard_wage_index() -> Decimal {
    dec!(1.5000)
}
