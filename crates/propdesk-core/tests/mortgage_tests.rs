use pretty_assertions::assert_eq;
use propdesk_core::mortgage::amortization::{
    self, compute_amortization, AmortizationResult, MortgageTerms,
};
use propdesk_core::mortgage::binder::{InputField, MortgageForm, MortgageRecordBinder};
use propdesk_core::mortgage::record::summarize_mortgage;
use propdesk_core::mortgage::schedule::{build_amortization_schedule, ScheduleInput};
use propdesk_core::PropdeskError;
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;

const CENT: Decimal = dec!(0.01);

fn principals() -> Vec<Decimal> {
    vec![dec!(1000), dec!(85000), dec!(285000), dec!(1_250_000), dec!(99_000_000)]
}

fn rates() -> Vec<Decimal> {
    vec![dec!(0.125), dec!(1), dec!(3.5), dec!(4.25), dec!(7.875), dec!(15), dec!(30)]
}

fn terms() -> Vec<u32> {
    vec![1, 5, 10, 15, 30, 50]
}

/// Unrounded principal portion of the first payment.
fn exact_first_principal(p: Decimal, r: Decimal, t: u32) -> Decimal {
    let m = r / dec!(1200);
    if m.is_zero() {
        return p / Decimal::from(t * 12);
    }
    let growth = (Decimal::ONE + m).checked_powu(u64::from(t * 12)).unwrap();
    p * m * growth / (growth - Decimal::ONE) - p * m
}

// ===========================================================================
// Reference scenarios
// ===========================================================================

#[test]
fn test_scenario_thirty_year_425() {
    let r = compute_amortization(dec!(285000), dec!(4.25), 30).unwrap();
    // Exact formula value is 1402.0287; see DESIGN.md on the 1402.00 figure
    assert_eq!(r.monthly_payment, dec!(1402.03));
    assert_eq!(r.first_period_interest, dec!(1009.38));
    assert_eq!(r.first_period_principal, dec!(392.65));
}

#[test]
fn test_scenario_zero_rate_ten_year() {
    let r = compute_amortization(dec!(100000), dec!(0), 10).unwrap();
    assert_eq!(
        r,
        AmortizationResult {
            monthly_payment: dec!(833.33),
            first_period_interest: dec!(0),
            first_period_principal: dec!(833.33),
        }
    );
}

#[test]
fn test_scenario_thirty_year_350() {
    let r = compute_amortization(dec!(500000), dec!(3.5), 30).unwrap();
    assert_eq!(r.monthly_payment, dec!(2245.22));
    assert_eq!(r.first_period_interest, dec!(1458.33));
    assert_eq!(r.first_period_principal, dec!(786.89));
}

#[test]
fn test_zero_term_is_invalid_input() {
    let err = compute_amortization(dec!(100000), dec!(5), 0).unwrap_err();
    assert!(matches!(err, PropdeskError::InvalidInput { .. }));
}

// ===========================================================================
// Properties
// ===========================================================================

#[test]
fn test_split_sums_to_payment() {
    for p in principals() {
        for r in rates() {
            for t in terms() {
                let a = compute_amortization(p, r, t).unwrap();
                let diff = a.first_period_principal + a.first_period_interest - a.monthly_payment;
                assert!(diff.abs() <= CENT, "P={p} r={r} t={t}: off by {diff}");
            }
        }
    }
}

#[test]
fn test_outputs_non_negative_and_amortizing() {
    for p in principals() {
        for r in rates() {
            for t in terms() {
                let a = compute_amortization(p, r, t).unwrap();
                assert!(a.monthly_payment > Decimal::ZERO);
                assert!(a.first_period_interest >= Decimal::ZERO);
                assert!(a.first_period_principal >= Decimal::ZERO);
                // Below half a cent the principal portion rounds away entirely
                if exact_first_principal(p, r, t) >= dec!(0.005) {
                    assert!(
                        a.monthly_payment > a.first_period_interest,
                        "P={p} r={r} t={t} does not amortize"
                    );
                }
            }
        }
    }
}

#[test]
fn test_high_rate_large_loan_still_amortizes() {
    let a = compute_amortization(dec!(99_000_000), dec!(30), 50).unwrap();
    assert_eq!(a.first_period_interest, dec!(2475000.00));
    assert!(a.first_period_principal > Decimal::ZERO);
}

#[test]
fn test_zero_rate_is_straight_line() {
    for p in principals() {
        for t in terms() {
            let a = compute_amortization(p, Decimal::ZERO, t).unwrap();
            let expected = (p / Decimal::from(t * 12))
                .round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero);
            assert_eq!(a.monthly_payment, expected);
            assert_eq!(a.first_period_interest, Decimal::ZERO);
        }
    }
}

#[test]
fn test_payment_increases_with_rate() {
    for p in principals() {
        for t in terms() {
            let mut prev: Option<AmortizationResult> = None;
            for r in rates() {
                let a = compute_amortization(p, r, t).unwrap();
                if let Some(before) = prev {
                    assert!(a.monthly_payment > before.monthly_payment, "P={p} t={t} r={r}");
                    assert!(a.first_period_interest > before.first_period_interest);
                }
                prev = Some(a);
            }
        }
    }
}

#[test]
fn test_payment_decreases_with_term() {
    // At 30% a 30- and 50-year payment on 1000 agree to the cent
    for p in principals() {
        for r in rates().into_iter().filter(|r| *r <= dec!(15)) {
            let mut prev: Option<Decimal> = None;
            for t in terms() {
                let payment = compute_amortization(p, r, t).unwrap().monthly_payment;
                if let Some(before) = prev {
                    assert!(payment < before, "P={p} r={r} t={t}");
                }
                prev = Some(payment);
            }
        }
    }
}

// ===========================================================================
// Schedule and period split agree with the calculator
// ===========================================================================

#[test]
fn test_schedule_first_row_and_total() {
    let input = ScheduleInput {
        terms: MortgageTerms::new(dec!(285000), dec!(4.25), 30),
        extra_monthly_principal: None,
    };
    let out = build_amortization_schedule(&input).unwrap();
    let s = &out.result;
    let first = amortization::period_split(&input.terms, 1).unwrap();
    assert_eq!(s.rows[0].interest, first.interest);
    assert_eq!(s.rows[0].principal, first.principal);
    assert_eq!(s.total_principal, dec!(285000));
    assert_eq!(s.total_interest, dec!(219729.92));
}

#[test]
fn test_period_split_close_to_schedule() {
    let terms = MortgageTerms::new(dec!(200000), dec!(6), 30);
    let sched = build_amortization_schedule(&ScheduleInput {
        terms: terms.clone(),
        extra_monthly_principal: None,
    })
    .unwrap();
    for period in [12u32, 60, 180, 300] {
        let split = amortization::period_split(&terms, period).unwrap();
        let row = &sched.result.rows[(period - 1) as usize];
        // Walked balances drift from the closed form only by accumulated rounding
        assert!((split.closing_balance - row.closing_balance).abs() < dec!(5));
    }
}

// ===========================================================================
// Binder through to record
// ===========================================================================

#[test]
fn test_binder_commit_and_summary() {
    let form = MortgageForm {
        lender: "Harbor Savings".into(),
        escrow_amount: "412.50".into(),
        start_date: "2023-06-01".into(),
        ..Default::default()
    };
    let mut binder = MortgageRecordBinder::new(form);
    binder.set_input(InputField::LoanAmount, "500000");
    binder.set_input(InputField::InterestRate, "3.5");
    assert!(binder
        .set_input(InputField::TermYears, "30")
        .is_applied());

    let mortgage = binder.commit().unwrap();
    assert_eq!(mortgage.monthly_payment, dec!(2245.22));
    assert_eq!(mortgage.total_monthly_outlay(), dec!(2657.72));

    let summary = summarize_mortgage(&mortgage, chrono::NaiveDate::from_ymd_opt(2023, 7, 1)).unwrap();
    assert!(summary.warnings.is_empty());
    assert_eq!(summary.result.payments_elapsed, Some(1));
    assert_eq!(summary.result.projected_balance, Some(dec!(499213.11)));
}
