//! Tests for per-line rate adjustment

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use domain_asc::line::{adjust_line, DeviceUnitBudget};
use domain_asc::{AscLineOutput, LineStatus};
use pricing_kernel::ClaimLine;
use refdata_asc::ReferenceBundle;
use test_utils::{
    dated_code_pair, empty_bundle, open_code_pair, surgical_rate, LineBuilder,
};

fn claim_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
}

/// Bundle with HCPCS 10060 at $100 (G2, discountable) and a $20 device offset
fn device_bundle() -> ReferenceBundle {
    let mut bundle = empty_bundle();
    bundle
        .rates
        .insert("10060".to_string(), surgical_rate(dec!(100.00), "G2", true));
    bundle
        .device_offsets
        .insert("10060".to_string(), dec!(20.00));
    bundle
}

fn adjust(line: &ClaimLine, bundle: &ReferenceBundle, wage_index: Decimal) -> AscLineOutput {
    let mut budget = DeviceUnitBudget::default();
    adjust_line(line, 1, bundle, wage_index, &mut budget, claim_date())
}

// ============================================================================
// Wage adjustment
// ============================================================================

mod wage_adjustment_tests {
    use super::*;

    #[test]
    fn test_labor_half_is_wage_indexed() {
        let line = LineBuilder::new("10060").build();
        let out = adjust(&line, &device_bundle(), dec!(1.5));

        // (100 * 0.5 * 1.5) + (100 * 0.5) = 125
        assert_eq!(out.status, Some(LineStatus::Payable));
        assert_eq!(out.adjusted_rate, dec!(125.00));
        assert_eq!(out.payment_rate, dec!(100.00));
        assert_eq!(out.wage_index, dec!(1.5));
        assert!(out.subject_to_discount);
    }

    #[test]
    fn test_wage_exempt_indicator_pays_flat_rate() {
        let mut bundle = empty_bundle();
        bundle
            .rates
            .insert("J0131".to_string(), surgical_rate(dec!(12.50), "K2", false));

        let line = LineBuilder::new("J0131").build();
        let out = adjust(&line, &bundle, dec!(1.5));

        assert_eq!(out.adjusted_rate, dec!(12.50));
        assert!(out.details.contains("No Wage Adj: Indicator K2"));
    }
}

// ============================================================================
// Payment indicator dispositions
// ============================================================================

mod indicator_tests {
    use super::*;

    fn bundle_with_indicator(indicator: &str) -> ReferenceBundle {
        let mut bundle = empty_bundle();
        bundle.rates.insert(
            "0101T".to_string(),
            surgical_rate(dec!(50.00), indicator, false),
        );
        bundle
    }

    #[test]
    fn test_deny_indicator() {
        let line = LineBuilder::new("0101T").build();
        let out = adjust(&line, &bundle_with_indicator("C5"), dec!(1.0));

        assert_eq!(out.status, Some(LineStatus::Denied));
        assert!(out.status_reason.contains("Indicator C5"));
        assert_eq!(out.adjusted_rate, Decimal::ZERO);
        // The national rate stays on the output for reference.
        assert_eq!(out.payment_rate, dec!(50.00));
    }

    #[test]
    fn test_packaged_indicator() {
        let line = LineBuilder::new("0101T").build();
        let out = adjust(&line, &bundle_with_indicator("L1"), dec!(1.0));

        assert_eq!(out.status, Some(LineStatus::Packaged));
        assert!(out.status_reason.contains("packaged"));
        assert_eq!(out.adjusted_rate, Decimal::ZERO);
    }

    #[test]
    fn test_unprocessable_indicator() {
        let line = LineBuilder::new("0101T").build();
        let out = adjust(&line, &bundle_with_indicator("D5"), dec!(1.0));

        assert_eq!(out.status, Some(LineStatus::Unprocessable));
        assert!(out.status_reason.contains("Indicator D5"));
    }

    #[test]
    fn test_zero_rate_is_packaged() {
        let mut bundle = empty_bundle();
        bundle
            .rates
            .insert("78012".to_string(), surgical_rate(Decimal::ZERO, "G2", false));

        let line = LineBuilder::new("78012").build();
        let out = adjust(&line, &bundle, dec!(1.0));

        assert_eq!(out.status, Some(LineStatus::Packaged));
        assert_eq!(out.details, "Packaged or No Payment");
    }

    #[test]
    fn test_unknown_code_has_no_status() {
        let line = LineBuilder::new("99999").build();
        let out = adjust(&line, &empty_bundle(), dec!(1.0));

        assert_eq!(out.status, None);
        assert_eq!(out.details, "Code not found in ASC Fee Schedule");
        assert!(!out.is_payable());
    }
}

// ============================================================================
// Device offsets (FB / FC / 73)
// ============================================================================

mod device_offset_tests {
    use super::*;

    #[test]
    fn test_fb_removes_full_offset_from_adjusted_rate() {
        let line = LineBuilder::new("10060").modifier("FB").build();
        let out = adjust(&line, &device_bundle(), dec!(1.5));

        // 125.00 - 20.00
        assert_eq!(out.adjusted_rate, dec!(105.00));
        assert!(out.device_credit);
        assert_eq!(out.device_offset_amount, dec!(20.00));
        assert!(out.details.contains("Mod FB"));
    }

    #[test]
    fn test_fc_removes_half_offset() {
        let line = LineBuilder::new("10060").modifier("FC").build();
        let out = adjust(&line, &device_bundle(), dec!(1.5));

        // 125.00 - 10.00
        assert_eq!(out.adjusted_rate, dec!(115.00));
        assert!(out.device_credit);
        assert_eq!(out.device_offset_amount, dec!(10.00));
        assert!(out.details.contains("Mod FC"));
    }

    #[test]
    fn test_no_modifier_no_device_credit() {
        let line = LineBuilder::new("10060").build();
        let out = adjust(&line, &device_bundle(), dec!(1.5));

        assert_eq!(out.adjusted_rate, dec!(125.00));
        assert!(!out.device_credit);
        assert_eq!(out.device_offset_amount, Decimal::ZERO);
    }

    #[test]
    fn test_fb_without_offset_on_file_is_a_noop() {
        let mut bundle = device_bundle();
        bundle.device_offsets.clear();

        let line = LineBuilder::new("10060").modifier("FB").build();
        let out = adjust(&line, &bundle, dec!(1.5));

        assert_eq!(out.adjusted_rate, dec!(125.00));
        assert!(!out.device_credit);
    }

    #[test]
    fn test_offset_floors_at_zero() {
        let mut bundle = device_bundle();
        bundle
            .device_offsets
            .insert("10060".to_string(), dec!(500.00));

        let line = LineBuilder::new("10060").modifier("FB").build();
        let out = adjust(&line, &bundle, dec!(1.5));
        assert_eq!(out.adjusted_rate, Decimal::ZERO);
    }
}

// ============================================================================
// Modifier percentage cuts
// ============================================================================

mod modifier_tests {
    use super::*;

    #[test]
    fn test_mod_73_halves_after_removing_full_offset() {
        let line = LineBuilder::new("10060").modifier("73").build();
        let out = adjust(&line, &device_bundle(), dec!(1.5));

        // (125 - 20) * 0.5
        assert_eq!(out.adjusted_rate, dec!(52.500));
        assert!(!out.subject_to_discount);
        assert!(out.details.contains("Mod 73: 50% Reduct"));
        // The 73 path reports no device credit even though the offset
        // reduced the payment.
        assert!(!out.device_credit);
        assert_eq!(out.device_offset_amount, Decimal::ZERO);
    }

    #[test]
    fn test_mod_73_takes_precedence_over_fb() {
        let line = LineBuilder::new("10060")
            .modifier("73")
            .modifier("FB")
            .build();
        let out = adjust(&line, &device_bundle(), dec!(1.5));

        assert_eq!(out.adjusted_rate, dec!(52.500));
        assert!(!out.device_credit);
        assert!(out.details.contains("Mod 73 present, FB/FC Ignored"));
    }

    #[test]
    fn test_mod_73_caps_at_charges() {
        let line = LineBuilder::new("10060")
            .modifier("73")
            .charges(dec!(30.00))
            .build();
        let out = adjust(&line, &device_bundle(), dec!(1.5));

        assert_eq!(out.adjusted_rate, dec!(30.00));
        assert!(out.details.contains("Lower-of: Charges 30.00"));
    }

    #[test]
    fn test_mod_52_halves_and_exempts_from_discounting() {
        let line = LineBuilder::new("10060").modifier("52").build();
        let out = adjust(&line, &device_bundle(), dec!(1.5));

        assert_eq!(out.adjusted_rate, dec!(62.500));
        assert!(!out.subject_to_discount);
        assert!(out.details.contains("Mod 52: 50% Reduct"));
    }

    #[test]
    fn test_mod_74_pays_in_full() {
        let line = LineBuilder::new("10060").modifier("74").build();
        let out = adjust(&line, &device_bundle(), dec!(1.5));

        assert_eq!(out.adjusted_rate, dec!(125.00));
        assert!(out.subject_to_discount);
        assert!(out.details.contains("Mod 74: Full Pay"));
    }

    #[test]
    fn test_lower_of_charges_cap() {
        let line = LineBuilder::new("10060").charges(dec!(90.00)).build();
        let out = adjust(&line, &device_bundle(), dec!(1.5));

        assert_eq!(out.adjusted_rate, dec!(90.00));
        assert!(out.details.contains("Lower-of: Charges 90.00"));
    }
}

// ============================================================================
// Pass-through code pair offsets
// ============================================================================

mod code_pair_tests {
    use super::*;

    /// 10060 at $100/G2 plus an open-ended C1713 -> 10060 pair at 25%
    fn code_pair_bundle() -> ReferenceBundle {
        let mut bundle = device_bundle();
        bundle
            .code_pairs
            .insert("C1713", "10060", open_code_pair(dec!(0.25)));
        bundle
    }

    fn claim_with_device(device_units: u32) -> Vec<ClaimLine> {
        vec![
            LineBuilder::new("C1713").units(device_units).build(),
            LineBuilder::new("10060").build(),
            LineBuilder::new("10060").build(),
        ]
    }

    #[test]
    fn test_budget_collects_device_units_in_claim_order() {
        let bundle = code_pair_bundle();
        let budget = DeviceUnitBudget::from_claim(&claim_with_device(2), &bundle);
        assert_eq!(budget.remaining("C1713"), 2);
        assert_eq!(budget.remaining("C9999"), 0);
    }

    #[test]
    fn test_budget_ignores_devices_without_pairs() {
        let bundle = code_pair_bundle();
        let lines = vec![LineBuilder::new("C9999").units(5).build()];
        let budget = DeviceUnitBudget::from_claim(&lines, &bundle);
        assert_eq!(budget.remaining("C9999"), 0);
    }

    #[test]
    fn test_offset_reduces_adjusted_rate_and_consumes_a_unit() {
        let bundle = code_pair_bundle();
        let lines = claim_with_device(1);
        let mut budget = DeviceUnitBudget::from_claim(&lines, &bundle);

        let out = adjust_line(&lines[1], 2, &bundle, dec!(1.5), &mut budget, claim_date());

        // 125 - (125 * 0.25) = 93.75
        assert_eq!(out.adjusted_rate, dec!(93.7500));
        assert_eq!(out.code_pair_offset, dec!(31.2500));
        assert_eq!(out.code_pair_device, "C1713");
        assert!(out.details.contains("CodePair:C1713"));
        assert_eq!(budget.remaining("C1713"), 0);
    }

    #[test]
    fn test_exhausted_budget_stops_offsetting() {
        let bundle = code_pair_bundle();
        let lines = claim_with_device(1);
        let mut budget = DeviceUnitBudget::from_claim(&lines, &bundle);

        let first = adjust_line(&lines[1], 2, &bundle, dec!(1.5), &mut budget, claim_date());
        let second = adjust_line(&lines[2], 3, &bundle, dec!(1.5), &mut budget, claim_date());

        assert_eq!(first.adjusted_rate, dec!(93.7500));
        assert_eq!(second.adjusted_rate, dec!(125.00));
        assert_eq!(second.code_pair_offset, Decimal::ZERO);
    }

    #[test]
    fn test_two_device_units_offset_two_procedures() {
        let bundle = code_pair_bundle();
        let lines = claim_with_device(2);
        let mut budget = DeviceUnitBudget::from_claim(&lines, &bundle);

        let first = adjust_line(&lines[1], 2, &bundle, dec!(1.5), &mut budget, claim_date());
        let second = adjust_line(&lines[2], 3, &bundle, dec!(1.5), &mut budget, claim_date());

        assert_eq!(first.adjusted_rate, dec!(93.7500));
        assert_eq!(second.adjusted_rate, dec!(93.7500));
    }

    #[test]
    fn test_device_line_itself_is_never_offset() {
        let mut bundle = code_pair_bundle();
        bundle
            .rates
            .insert("C1713".to_string(), surgical_rate(dec!(40.00), "G2", false));

        let lines = claim_with_device(1);
        let mut budget = DeviceUnitBudget::from_claim(&lines, &bundle);
        let out = adjust_line(&lines[0], 1, &bundle, dec!(1.0), &mut budget, claim_date());

        assert_eq!(out.code_pair_offset, Decimal::ZERO);
        assert_eq!(budget.remaining("C1713"), 1);
    }

    #[test]
    fn test_pair_outside_validity_window_is_skipped() {
        let mut bundle = device_bundle();
        bundle.code_pairs.insert(
            "C1713",
            "10060",
            dated_code_pair(dec!(0.25), "20240101", "20241231"),
        );

        let lines = claim_with_device(1);
        let mut budget = DeviceUnitBudget::from_claim(&lines, &bundle);
        let out = adjust_line(&lines[1], 2, &bundle, dec!(1.5), &mut budget, claim_date());

        // The claim date (2025-01-15) falls outside the 2024 window.
        assert_eq!(out.adjusted_rate, dec!(125.00));
        assert_eq!(budget.remaining("C1713"), 1);
    }
}
