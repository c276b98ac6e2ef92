//! Month-by-month amortisation schedule with optional extra principal.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::PropdeskError;
use crate::mortgage::amortization::MortgageTerms;
use crate::types::{round_cents, with_metadata, ComputationOutput, Money};
use crate::PropdeskResult;

/// Input for a full amortisation schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleInput {
    #[serde(flatten)]
    pub terms: MortgageTerms,
    /// Constant prepayment added to every scheduled payment.
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "extraMonthlyPrincipal")]
    pub extra_monthly_principal: Option<Money>,
}

/// A single month in the schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmortizationRow {
    pub period: u32,
    pub opening_balance: Money,
    /// Scheduled payment (interest + principal), excluding extra principal.
    pub payment: Money,
    pub interest: Money,
    pub principal: Money,
    pub extra_principal: Money,
    pub closing_balance: Money,
}

/// Full schedule output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub monthly_payment: Money,
    pub rows: Vec<AmortizationRow>,
    pub number_of_payments: u32,
    pub total_paid: Money,
    pub total_interest: Money,
    pub total_principal: Money,
    /// Period in which the balance reached zero.
    pub payoff_period: u32,
    /// Interest avoided by the extra principal, versus the plain schedule.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interest_saved: Option<Money>,
}

struct Walk {
    monthly_payment: Money,
    rows: Vec<AmortizationRow>,
    total_interest: Money,
}

/// Build the month-by-month schedule.
///
/// Interest is rounded to cents each month and the final payment absorbs
/// whatever residual the rounding leaves, so the closing balance of the last
/// row is exactly zero.
pub fn build_amortization_schedule(
    input: &ScheduleInput,
) -> PropdeskResult<ComputationOutput<AmortizationSchedule>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    input.terms.validate()?;
    let extra = input.extra_monthly_principal.unwrap_or(Decimal::ZERO);
    if extra < Decimal::ZERO {
        return Err(PropdeskError::invalid(
            "extra_monthly_principal",
            "Extra principal cannot be negative",
        ));
    }

    let walk = walk_schedule(&input.terms, round_cents(extra))?;
    let scheduled_n = input.terms.number_of_payments()?;

    let interest_saved = if extra > Decimal::ZERO {
        let plain = walk_schedule(&input.terms, Decimal::ZERO)?;
        Some(plain.total_interest - walk.total_interest)
    } else {
        None
    };

    let payoff_period = walk.rows.last().map(|r| r.period).unwrap_or(0);
    if payoff_period < scheduled_n {
        tracing::debug!(payoff_period, scheduled_n, "schedule paid off early");
        warnings.push(format!(
            "Extra principal pays the loan off in {payoff_period} of {scheduled_n} months"
        ));
    }

    let total_principal: Money = walk
        .rows
        .iter()
        .map(|r| r.principal + r.extra_principal)
        .sum();

    let output = AmortizationSchedule {
        monthly_payment: walk.monthly_payment,
        number_of_payments: walk.rows.len() as u32,
        total_paid: total_principal + walk.total_interest,
        total_interest: walk.total_interest,
        total_principal,
        payoff_period,
        interest_saved,
        rows: walk.rows,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Monthly amortisation schedule (cent-rounded interest, final payment clears residual)",
        &serde_json::json!({
            "principal": input.terms.principal.to_string(),
            "annual_rate_percent": input.terms.annual_interest_rate_percent.to_string(),
            "term_years": input.terms.term_years,
            "extra_monthly_principal": extra.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

fn walk_schedule(terms: &MortgageTerms, extra: Money) -> PropdeskResult<Walk> {
    terms.validate()?;
    let n = terms.number_of_payments()?;
    let monthly_payment = terms.rounded_payment()?;

    let mut rows = Vec::with_capacity(n as usize);
    let mut balance = terms.principal;
    let mut total_interest = Decimal::ZERO;

    for period in 1..=n {
        let opening = balance;
        let interest = round_cents(terms.monthly_interest_on(opening));

        let mut principal = monthly_payment - interest;
        let mut extra_principal = extra;
        if period == n || principal >= opening {
            principal = opening;
            extra_principal = Decimal::ZERO;
        } else if principal + extra_principal > opening {
            extra_principal = opening - principal;
        }

        balance = opening - principal - extra_principal;
        total_interest += interest;

        rows.push(AmortizationRow {
            period,
            opening_balance: opening,
            payment: interest + principal,
            interest,
            principal,
            extra_principal,
            closing_balance: balance,
        });

        if balance.is_zero() {
            break;
        }
    }

    Ok(Walk {
        monthly_payment,
        rows,
        total_interest,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn input(principal: Money, rate: Decimal, years: u32) -> ScheduleInput {
        ScheduleInput {
            terms: MortgageTerms::new(principal, rate, years),
            extra_monthly_principal: None,
        }
    }

    #[test]
    fn test_schedule_length_and_closing() {
        let out = build_amortization_schedule(&input(dec!(285000), dec!(4.25), 30)).unwrap();
        let s = &out.result;
        assert_eq!(s.rows.len(), 360);
        assert_eq!(s.payoff_period, 360);
        assert_eq!(s.rows.last().unwrap().closing_balance, Decimal::ZERO);
        assert_eq!(s.total_principal, dec!(285000));
        assert!(s.interest_saved.is_none());
    }

    #[test]
    fn test_first_row_matches_calculator() {
        let out = build_amortization_schedule(&input(dec!(500000), dec!(3.5), 30)).unwrap();
        let first = &out.result.rows[0];
        assert_eq!(first.payment, dec!(2245.22));
        assert_eq!(first.interest, dec!(1458.33));
        assert_eq!(first.principal, dec!(786.89));
        assert_eq!(first.closing_balance, dec!(499213.11));
    }

    #[test]
    fn test_rows_chain_balances() {
        let out = build_amortization_schedule(&input(dec!(50000), dec!(6), 5)).unwrap();
        for pair in out.result.rows.windows(2) {
            assert_eq!(pair[0].closing_balance, pair[1].opening_balance);
        }
    }

    #[test]
    fn test_zero_rate_schedule_has_no_interest() {
        let out = build_amortization_schedule(&input(dec!(100000), dec!(0), 10)).unwrap();
        let s = &out.result;
        assert_eq!(s.total_interest, Decimal::ZERO);
        assert_eq!(s.rows.len(), 120);
        // 119 * 833.33 = 99166.27, the last payment absorbs the remainder
        assert_eq!(s.rows.last().unwrap().principal, dec!(833.73));
    }

    #[test]
    fn test_extra_principal_pays_off_early() {
        let mut inp = input(dec!(200000), dec!(5), 30);
        inp.extra_monthly_principal = Some(dec!(500));
        let out = build_amortization_schedule(&inp).unwrap();
        let s = &out.result;
        assert!(s.payoff_period < 360);
        assert!(s.interest_saved.unwrap() > Decimal::ZERO);
        assert_eq!(s.total_principal, dec!(200000));
        assert!(!out.warnings.is_empty());
    }

    #[test]
    fn test_negative_extra_rejected() {
        let mut inp = input(dec!(200000), dec!(5), 30);
        inp.extra_monthly_principal = Some(dec!(-1));
        assert!(build_amortization_schedule(&inp).is_err());
    }

    #[test]
    fn test_huge_term_rejected_before_walking() {
        let err = build_amortization_schedule(&input(dec!(100000), dec!(0), 300_000_000)).unwrap_err();
        match err {
            PropdeskError::InvalidInput { field, .. } => assert_eq!(field, "term_years"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_cent_payment_rejected() {
        assert!(build_amortization_schedule(&input(dec!(1), dec!(0.001), 50)).is_err());
    }
}
