//! Pricing Kernel - Foundational types shared by the facility pricers
//!
//! This crate provides the building blocks every pricer module consumes:
//! - Decimal money helpers with explicit cent-rounding semantics
//! - The structured `ReturnCode` carried on pricer outputs
//! - The claim input model and provider-master lookup contract

pub mod claim;
pub mod codes;
pub mod money;

pub use claim::{Claim, ClaimLine, ProviderRecord};
pub use codes::ReturnCode;
pub use money::{parse_currency, parse_percent, round_cents};
