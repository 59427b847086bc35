//! ASC Reference Data Store
//!
//! Loads and caches the quarter-scoped reference tables the ASC pricer
//! prices against: Addendum AA/BB fee schedules, Addendum FF device
//! offsets, CBSA wage indices, and normalized pass-through code pairs.
//!
//! # Layout on disk
//!
//! ```text
//! <data_dir>/
//!   2026/
//!     wage_index.csv          (year-level wage index fallback)
//!     20260101/
//!       AA.csv  BB.csv  FF.csv
//!       asc_ref_cache.json    (managed cache artifact)
//!   normalized/
//!     code_pairs_2026.csv
//!     code_pairs_combined.csv
//! ```
//!
//! Quarter directories are named `YYYYMMDD` for the first day of the
//! quarter. Each bundle is cached in memory and persisted to a versioned
//! cache artifact that is invalidated by source-file modification times.

pub mod bundle;
pub mod cache;
pub mod error;
pub mod store;
mod tables;

pub use bundle::{Addendum, CodePairEntry, CodePairTable, RateInfo, ReferenceBundle};
pub use cache::{CacheError, CACHE_FILE_NAME, CACHE_VERSION};
pub use error::RefDataError;
pub use store::{quarter_start, AscReferenceStore};
