//! Reference data errors

use chrono::NaiveDate;
use thiserror::Error;

/// Errors surfaced by the reference data store
#[derive(Debug, Error)]
pub enum RefDataError {
    /// No quarter directory exists at or before the requested date
    #[error("no ASC reference data found for {0} or any prior quarter")]
    DataNotFound(NaiveDate),

    /// Filesystem failure while reading source tables
    #[error("i/o error loading ASC reference data: {0}")]
    Io(#[from] std::io::Error),
}
