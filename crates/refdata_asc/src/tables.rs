//! Flat-file table parsing
//!
//! Published reference files are heterogeneous: comma or tab delimited,
//! preamble rows above the header, locale-formatted currency, and column
//! names that drift between releases. Parsing is header-driven: the header
//! row is located by keyword, the delimiter is sniffed from it, and columns
//! are resolved by case-insensitive substring match.

use csv::{ReaderBuilder, StringRecord};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use pricing_kernel::{parse_currency, parse_percent};

use crate::bundle::{Addendum, CodePairEntry, CodePairTable, RateInfo};

/// A delimited table with its header row resolved
pub(crate) struct FlatTable {
    headers: Vec<String>,
    rows: Vec<StringRecord>,
}

impl FlatTable {
    /// Opens a table, scanning for the first line containing any of the
    /// given keywords and treating it as the header. Returns `Ok(None)`
    /// when the file is missing or no header line is found.
    pub(crate) fn open(path: &Path, keywords: &[&str]) -> io::Result<Option<Self>> {
        let raw = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        let text = String::from_utf8_lossy(&raw);

        let mut header_line = None;
        let mut body_start = 0;
        let mut pos = 0;
        while pos < text.len() {
            let line_end = text[pos..]
                .find('\n')
                .map(|i| pos + i)
                .unwrap_or(text.len());
            let line = text[pos..line_end].trim_end_matches('\r');
            if keywords.iter().any(|kw| line.contains(kw)) {
                header_line = Some(line.to_string());
                body_start = (line_end + 1).min(text.len());
                break;
            }
            pos = line_end + 1;
        }

        let header_line = match header_line {
            Some(h) => h,
            None => return Ok(None),
        };
        let delimiter = if header_line.contains('\t') { b'\t' } else { b',' };

        let mut header_reader = ReaderBuilder::new()
            .has_headers(false)
            .delimiter(delimiter)
            .from_reader(header_line.as_bytes());
        let headers: Vec<String> = match header_reader.records().next() {
            Some(Ok(record)) => record.iter().map(str::to_string).collect(),
            _ => return Ok(None),
        };

        let body = &text[body_start..];
        let rows = ReaderBuilder::new()
            .has_headers(false)
            .delimiter(delimiter)
            .flexible(true)
            .from_reader(body.as_bytes())
            .records()
            // Malformed rows are skipped, not fatal to the table.
            .filter_map(Result::ok)
            .collect();

        Ok(Some(Self { headers, rows }))
    }

    pub(crate) fn rows(&self) -> &[StringRecord] {
        &self.rows
    }

    /// Index of the first column whose header exactly matches one of `names`
    pub(crate) fn column_exact(&self, names: &[&str]) -> Option<usize> {
        names
            .iter()
            .find_map(|name| self.headers.iter().position(|h| h == name))
    }

    /// Index of the first column whose header contains `fragment`,
    /// case-insensitively
    pub(crate) fn column_containing(&self, fragment: &str) -> Option<usize> {
        let fragment = fragment.to_lowercase();
        self.headers
            .iter()
            .position(|h| h.to_lowercase().contains(&fragment))
    }

    /// Index of the first column whose header satisfies `predicate`
    pub(crate) fn column_matching(&self, predicate: impl Fn(&str) -> bool) -> Option<usize> {
        self.headers.iter().position(|h| predicate(h))
    }

    fn value<'a>(&self, row: &'a StringRecord, index: Option<usize>) -> &'a str {
        index.and_then(|i| row.get(i)).unwrap_or("")
    }
}

/// Finds `<basename>.csv` or `<basename>.txt` in a directory
pub(crate) fn find_table_file(dir: &Path, basename: &str) -> Option<PathBuf> {
    for ext in ["csv", "txt"] {
        let candidate = dir.join(format!("{basename}.{ext}"));
        if candidate.exists() {
            return Some(candidate);
        }
    }
    None
}

/// Loads an Addendum AA/BB fee schedule into `rates`.
///
/// Same-key entries overwrite, so loading BB after AA gives BB precedence.
pub(crate) fn load_rates(
    path: &Path,
    rates: &mut HashMap<String, RateInfo>,
    addendum: Addendum,
) -> io::Result<()> {
    let table = match FlatTable::open(path, &["HCPCS Code"])? {
        Some(t) => t,
        None => return Ok(()),
    };

    let hcpcs_col = table.column_exact(&["HCPCS Code", "HCPCS"]);
    let rate_col = table.column_containing("payment rate");
    let indicator_col = table
        .column_containing("payment indicator")
        .or_else(|| table.column_containing("comment indicator"));
    let discount_col = table.column_containing("discounting");

    for row in table.rows() {
        let hcpcs = table.value(row, hcpcs_col).trim();
        if hcpcs.is_empty() {
            continue;
        }
        let rate = parse_currency(table.value(row, rate_col));
        let indicator = table.value(row, indicator_col).trim().to_string();
        let subject_to_discount = table
            .value(row, discount_col)
            .trim()
            .eq_ignore_ascii_case("Y");

        rates.insert(
            hcpcs.to_string(),
            RateInfo {
                rate,
                indicator,
                subject_to_discount,
                addendum,
            },
        );
    }
    Ok(())
}

/// Loads the Addendum FF device offset table into `offsets`.
///
/// Zero or unparsable offsets are omitted: absent means "not device-intensive".
pub(crate) fn load_device_offsets(
    path: &Path,
    offsets: &mut HashMap<String, Decimal>,
) -> io::Result<()> {
    let table = match FlatTable::open(path, &["HCPCS Code"])? {
        Some(t) => t,
        None => return Ok(()),
    };

    let hcpcs_col = table.column_exact(&["HCPCS Code", "HCPCS"]);
    let offset_col = table.column_containing("device offset amount");

    for row in table.rows() {
        let hcpcs = table.value(row, hcpcs_col).trim();
        if hcpcs.is_empty() {
            continue;
        }
        let offset = parse_currency(table.value(row, offset_col));
        if offset > Decimal::ZERO {
            offsets.insert(hcpcs.to_string(), offset);
        }
    }
    Ok(())
}

/// Returns true for wage column headers of the form `WI` + two digits
fn is_wage_year_column(header: &str) -> bool {
    let upper = header.to_uppercase();
    upper.len() == 4
        && upper.starts_with("WI")
        && upper[2..].chars().all(|c| c.is_ascii_digit())
}

/// Loads a CBSA wage index table into `wage_indices`.
///
/// The value column is the `WI<yy>` column for the release year, with
/// `Wage Index` / `geographicWageIndex` as fallback aliases. Unparsable
/// values are skipped.
pub(crate) fn load_wage_index(
    path: &Path,
    wage_indices: &mut HashMap<String, Decimal>,
) -> io::Result<()> {
    let table = match FlatTable::open(path, &["CBSA"])? {
        Some(t) => t,
        None => return Ok(()),
    };

    let cbsa_col = table
        .column_exact(&["CBSA", "cbsa"])
        .or_else(|| table.column_matching(|h| h.to_uppercase().contains("CBSA")));
    let wi_col = table
        .column_matching(is_wage_year_column)
        .or_else(|| table.column_exact(&["Wage Index", "geographicWageIndex"]));

    for row in table.rows() {
        let cbsa = table.value(row, cbsa_col).trim();
        let wi = table.value(row, wi_col).trim();
        if cbsa.is_empty() || wi.is_empty() {
            continue;
        }
        if let Ok(value) = wi.parse::<Decimal>() {
            wage_indices.insert(cbsa.to_string(), value);
        }
    }
    Ok(())
}

/// Locates the wage index file for a quarter: quarter-level first, then the
/// year directory; within each level `wage_index.*`, any `*wage*.csv`, then
/// `WI.csv`.
pub(crate) fn find_wage_index_file(quarter_dir: &Path) -> Option<PathBuf> {
    let year_dir = quarter_dir.parent()?;
    for dir in [quarter_dir, year_dir] {
        if let Some(path) = find_table_file(dir, "wage_index") {
            return Some(path);
        }
        if let Some(path) = find_wage_glob(dir) {
            return Some(path);
        }
        let wi = dir.join("WI.csv");
        if wi.exists() {
            return Some(wi);
        }
    }
    None
}

fn find_wage_glob(dir: &Path) -> Option<PathBuf> {
    let mut matches: Vec<PathBuf> = fs::read_dir(dir)
        .ok()?
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .map(|n| {
                    let lower = n.to_lowercase();
                    lower.contains("wage") && lower.ends_with(".csv")
                })
                .unwrap_or(false)
        })
        .collect();
    matches.sort();
    matches.into_iter().next()
}

/// Normalized code-pair files relevant to a quarter directory, in load
/// precedence order (year-specific first, then combined)
pub(crate) fn code_pair_sources(data_root: &Path, quarter_dir: &Path) -> Vec<PathBuf> {
    let normalized = data_root.join("normalized");
    let mut sources = Vec::new();

    if let Some(name) = quarter_dir.file_name().and_then(|n| n.to_str()) {
        if name.len() == 8 && name.chars().all(|c| c.is_ascii_digit()) {
            let year_file = normalized.join(format!("code_pairs_{}.csv", &name[..4]));
            if year_file.exists() {
                sources.push(year_file);
            }
        }
    }
    let combined = normalized.join("code_pairs_combined.csv");
    if combined.exists() {
        sources.push(combined);
    }
    sources
}

/// Loads a normalized code-pair CSV into `table`.
///
/// Entries with unparsable non-empty dates are dropped; empty dates mean an
/// open-ended window.
pub(crate) fn load_code_pairs(path: &Path, table: &mut CodePairTable) -> io::Result<()> {
    let flat = match FlatTable::open(path, &["device_hcpcs"])? {
        Some(t) => t,
        None => return Ok(()),
    };

    let device_col = flat.column_exact(&["device_hcpcs"]);
    let procedure_col = flat.column_exact(&["procedure_hcpcs"]);
    let device_mod_col = flat.column_exact(&["device_modifier"]);
    let procedure_mod_col = flat.column_exact(&["procedure_modifier"]);
    let multiplier_col = flat.column_exact(&["percent_multiplier"]);
    let effective_col = flat.column_exact(&["effective_date"]);
    let end_col = flat.column_exact(&["end_date"]);

    for row in flat.rows() {
        let device = flat.value(row, device_col).trim();
        let procedure = flat.value(row, procedure_col).trim();
        if device.is_empty() || procedure.is_empty() {
            continue;
        }

        let effective_date = match parse_compact_date(flat.value(row, effective_col)) {
            Ok(d) => d,
            Err(()) => continue,
        };
        let end_date = match parse_compact_date(flat.value(row, end_col)) {
            Ok(d) => d,
            Err(()) => continue,
        };
        let percent_multiplier =
            parse_percent(flat.value(row, multiplier_col)).unwrap_or(Decimal::ZERO);

        let entry = CodePairEntry {
            device_modifier: non_empty(flat.value(row, device_mod_col)),
            procedure_modifier: non_empty(flat.value(row, procedure_mod_col)),
            percent_multiplier,
            effective_date,
            end_date,
        };
        table.insert(device, procedure, entry);
    }
    Ok(())
}

/// Parses a `YYYYMMDD` date cell. Empty means open-ended (`Ok(None)`);
/// non-empty but unparsable is a per-entry error (`Err`).
fn parse_compact_date(value: &str) -> Result<Option<NaiveDate>, ()> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(trimmed, "%Y%m%d")
        .map(Some)
        .map_err(|_| ())
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_rates_with_preamble_and_currency() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_file(
            tmp.path(),
            "AA.csv",
            "ASC Addendum AA -- January 2026\n\n\
             HCPCS Code,Short Descriptor,Subject to Multiple Procedure Discounting,Payment Indicator,Payment Rate\n\
             10060,Drainage of skin abscess,Y,G2,\"$1,234.56\"\n\
             0101T,Extracorporeal shockwave,N,C5,$0.00\n",
        );

        let mut rates = HashMap::new();
        load_rates(&path, &mut rates, Addendum::Surgical).unwrap();

        let info = &rates["10060"];
        assert_eq!(info.rate, dec!(1234.56));
        assert_eq!(info.indicator, "G2");
        assert!(info.subject_to_discount);
        assert_eq!(info.addendum, Addendum::Surgical);
        assert!(!rates["0101T"].subject_to_discount);
    }

    #[test]
    fn test_rates_tab_delimited() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_file(
            tmp.path(),
            "BB.txt",
            "HCPCS Code\tPayment Indicator\tSubject to Multiple Procedure Discounting\tPayment Rate\n\
             J0131\tK2\tN\t$12.50\n",
        );

        let mut rates = HashMap::new();
        load_rates(&path, &mut rates, Addendum::Ancillary).unwrap();
        assert_eq!(rates["J0131"].rate, dec!(12.50));
        assert_eq!(rates["J0131"].indicator, "K2");
    }

    #[test]
    fn test_missing_file_is_noop() {
        let tmp = tempfile::tempdir().unwrap();
        let mut rates = HashMap::new();
        load_rates(&tmp.path().join("AA.csv"), &mut rates, Addendum::Surgical).unwrap();
        assert!(rates.is_empty());
    }

    #[test]
    fn test_device_offsets_skip_zero() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_file(
            tmp.path(),
            "FF.csv",
            "HCPCS Code,Device Offset Amount\n66982,$250.00\n10060,$0.00\n",
        );

        let mut offsets = HashMap::new();
        load_device_offsets(&path, &mut offsets).unwrap();
        assert_eq!(offsets.get("66982"), Some(&dec!(250.00)));
        assert!(!offsets.contains_key("10060"));
    }

    #[test]
    fn test_wage_index_wi_year_column() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_file(
            tmp.path(),
            "wage_index.csv",
            "CBSA,Area Name,WI26\n16974,Chicago IL,1.0234\n99999,Nowhere,bad\n",
        );

        let mut wi = HashMap::new();
        load_wage_index(&path, &mut wi).unwrap();
        assert_eq!(wi.get("16974"), Some(&dec!(1.0234)));
        assert!(!wi.contains_key("99999"));
    }

    #[test]
    fn test_wage_index_fallback_alias_column() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_file(
            tmp.path(),
            "wage_index.csv",
            "CBSA No.,Wage Index\n35620,1.3102\n",
        );

        let mut wi = HashMap::new();
        load_wage_index(&path, &mut wi).unwrap();
        assert_eq!(wi.get("35620"), Some(&dec!(1.3102)));
    }

    #[test]
    fn test_code_pairs_bad_dates_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_file(
            tmp.path(),
            "code_pairs_2026.csv",
            "device_hcpcs,procedure_hcpcs,device_modifier,procedure_modifier,percent_multiplier,effective_date,end_date\n\
             C1721,33249,,,0.30,20260101,20261231\n\
             C1722,33270,,,0.25,notadate,20261231\n\
             C1723,33271,,,0.40,,\n",
        );

        let mut table = CodePairTable::default();
        load_code_pairs(&path, &mut table).unwrap();

        let date = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        assert_eq!(table.multiplier_for("C1721", "33249", date), Some(dec!(0.30)));
        assert!(!table.has_device("C1722"));
        assert_eq!(table.multiplier_for("C1723", "33271", date), Some(dec!(0.40)));
    }
}
