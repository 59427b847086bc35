//! Ambulatory Surgical Center (ASC) Pricing Domain
//!
//! Computes Medicare ASC facility payment for a claim: per-line rate and
//! indicator resolution, device and pass-through offsets, geographic wage
//! adjustment, Medically Unlikely Edit unit caps, the ancillary-service
//! gate, and multiple-procedure-reduction discounting with decimal-exact
//! summation.
//!
//! # Pipeline
//!
//! ```text
//! ReferenceBundle -> adjust_line (per line) -> enforce_mue -> gate_ancillary -> aggregate
//! ```

pub mod aggregate;
pub mod gate;
pub mod indicators;
pub mod line;
pub mod mue;
pub mod output;
pub mod pricer;

pub use line::DeviceUnitBudget;
pub use mue::AscMueLimit;
pub use output::{AscLineOutput, AscOutput, LineStatus};
pub use pricer::AscPricer;
