//! Payment indicator and modifier constants
//!
//! Payment indicator denial/rejection rules per CMS §60.3 and the wage
//! adjustment exemptions per CMS §40.2. Membership checks are exact-match
//! and case-sensitive, as loaded from the addenda.

/// Indicators that result in denial (no payment)
pub const DENY_INDICATORS: [&str; 7] = ["C5", "M6", "U5", "X5", "E5", "Y5", "K5"];

/// Indicators that result in denial as packaged (no separate payment)
pub const DENY_PACKAGED_INDICATORS: [&str; 4] = ["L1", "NI", "S1", "D1"];

/// Indicators returned as unprocessable
pub const UNPROCESSABLE_INDICATORS: [&str; 2] = ["D5", "B5"];

/// Indicators exempt from geographic wage adjustment per CMS §40.2:
///   H2 - Brachytherapy sources
///   J7 - OPPS pass-through devices (contractor-priced)
///   K2 - Separately payable drugs and biologicals (OPPS rate)
///   K7 - Unclassified drugs and biologicals (contractor-priced)
///   F4 - Corneal tissue acquisition / hepatitis B vaccine (reasonable cost)
///   L6 - NTIOL / qualifying non-opioid devices
pub const WAGE_EXEMPT_INDICATORS: [&str; 6] = ["H2", "J7", "K2", "K7", "F4", "L6"];

/// Pass-through device HCPCS codes start with this prefix
pub const DEVICE_CODE_PREFIX: char = 'C';

/// Claim line modifiers the ASC methodology reacts to
pub mod modifier {
    /// Terminated before anesthesia (50% pay)
    pub const TERMINATED_PRE_ANESTHESIA: &str = "73";
    /// Terminated after anesthesia (100% pay)
    pub const TERMINATED_POST_ANESTHESIA: &str = "74";
    /// Reduced/discontinued procedure (50% pay)
    pub const REDUCED_PROCEDURE: &str = "52";
    /// Device furnished without cost / full credit
    pub const DEVICE_NO_COST: &str = "FB";
    /// Device with partial credit (>= 50%)
    pub const DEVICE_PARTIAL_CREDIT: &str = "FC";
}
