//! Test Utilities Crate
//!
//! Shared test infrastructure for the facility pricer test suites.
//!
//! # Modules
//!
//! - `builders`: Builder patterns for claim and line construction
//! - `fixtures`: In-memory reference bundles and an on-disk data-tree fixture
//! - `logging`: Test logging initializer

pub mod builders;
pub mod fixtures;
pub mod logging;

pub use builders::*;
pub use fixtures::*;
pub use logging::*;
