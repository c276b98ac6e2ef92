//! The persisted mortgage record and the figures derived from it.

use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::PropdeskError;
use crate::mortgage::amortization::{self, non_negative_cents, MortgageTerms};
use crate::types::{with_metadata, ComputationOutput, Money, Percent};
use crate::PropdeskResult;

/// Mortgage as submitted to `/api/mortgages`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mortgage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_id: Option<String>,
    pub lender: String,
    pub loan_amount: Money,
    /// Annual rate in percent.
    pub interest_rate: Percent,
    pub term_years: u32,
    pub monthly_payment: Money,
    pub principal_amount: Money,
    pub interest_amount: Money,
    /// Taxes/insurance set aside each month. Entered, never calculated.
    #[serde(default)]
    pub escrow_amount: Money,
    pub current_balance: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
}

/// Derived view of a mortgage record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MortgageSummary {
    pub lender: String,
    pub monthly_payment: Money,
    pub escrow_amount: Money,
    pub total_monthly_outlay: Money,
    /// Payment the terms imply, for comparison with the stored one.
    pub calculated_monthly_payment: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maturity_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payments_elapsed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projected_balance: Option<Money>,
}

impl Mortgage {
    pub fn terms(&self) -> MortgageTerms {
        MortgageTerms::new(self.loan_amount, self.interest_rate, self.term_years)
    }

    /// Payment plus escrow.
    pub fn total_monthly_outlay(&self) -> Money {
        self.monthly_payment + self.escrow_amount
    }

    pub fn maturity_date(&self) -> Option<NaiveDate> {
        let months = self.term_years.checked_mul(12)?;
        self.start_date?.checked_add_months(Months::new(months))
    }

    /// Whole monthly payments due between the start date and `as_of`,
    /// first payment one month after the start. `None` without a start date.
    pub fn payments_elapsed(&self, as_of: NaiveDate) -> Option<u32> {
        let start = self.start_date?;
        if as_of <= start {
            return Some(0);
        }
        let mut months = (as_of.year() - start.year()) * 12 + as_of.month() as i32
            - start.month() as i32;
        if as_of.day() < start.day() {
            months -= 1;
        }
        let cap = self.term_years.saturating_mul(12);
        Some((months.max(0) as u32).min(cap))
    }

    /// Scheduled balance on `as_of`, from the loan terms rather than the
    /// stored (possibly hand-edited) payment.
    pub fn projected_balance(&self, as_of: NaiveDate) -> PropdeskResult<Option<Money>> {
        let Some(elapsed) = self.payments_elapsed(as_of) else {
            return Ok(None);
        };
        let terms = self.terms();
        terms.validate()?;
        if elapsed == 0 {
            return Ok(Some(terms.principal));
        }
        let exact = terms.exact_payment()?;
        Ok(Some(non_negative_cents(terms.exact_balance_after(exact, elapsed)?)))
    }
}

/// Summarise a mortgage record, optionally projecting its balance to `as_of`.
pub fn summarize_mortgage(
    mortgage: &Mortgage,
    as_of: Option<NaiveDate>,
) -> PropdeskResult<ComputationOutput<MortgageSummary>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if mortgage.escrow_amount < Decimal::ZERO {
        return Err(PropdeskError::invalid(
            "escrow_amount",
            "Escrow amount cannot be negative",
        ));
    }

    let calculated = amortization::amortize(&mortgage.terms())?;
    if calculated.monthly_payment != mortgage.monthly_payment {
        warnings.push(format!(
            "Stored monthly payment {} differs from the {} implied by the loan terms",
            mortgage.monthly_payment, calculated.monthly_payment
        ));
    }
    if mortgage.current_balance > mortgage.loan_amount {
        warnings.push("Current balance exceeds the original loan amount".into());
    }
    if as_of.is_some() && mortgage.start_date.is_none() {
        warnings.push("No start date; balance projection skipped".into());
    }

    let (payments_elapsed, projected_balance) = match as_of {
        Some(date) => (
            mortgage.payments_elapsed(date),
            mortgage.projected_balance(date)?,
        ),
        None => (None, None),
    };

    let output = MortgageSummary {
        lender: mortgage.lender.clone(),
        monthly_payment: mortgage.monthly_payment,
        escrow_amount: mortgage.escrow_amount,
        total_monthly_outlay: mortgage.total_monthly_outlay(),
        calculated_monthly_payment: calculated.monthly_payment,
        maturity_date: mortgage.maturity_date(),
        payments_elapsed,
        projected_balance,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Mortgage record summary",
        &serde_json::json!({
            "lender": mortgage.lender,
            "as_of": as_of.map(|d| d.to_string()),
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample() -> Mortgage {
        Mortgage {
            property_id: Some("prop-1".into()),
            lender: "First National".into(),
            loan_amount: dec!(285000),
            interest_rate: dec!(4.25),
            term_years: 30,
            monthly_payment: dec!(1402.03),
            principal_amount: dec!(392.65),
            interest_amount: dec!(1009.38),
            escrow_amount: dec!(350),
            current_balance: dec!(285000),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 15),
        }
    }

    #[test]
    fn test_total_monthly_outlay() {
        assert_eq!(sample().total_monthly_outlay(), dec!(1752.03));
    }

    #[test]
    fn test_maturity_date() {
        assert_eq!(sample().maturity_date(), NaiveDate::from_ymd_opt(2054, 1, 15));
    }

    #[test]
    fn test_payments_elapsed() {
        let m = sample();
        assert_eq!(m.payments_elapsed(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()), Some(0));
        assert_eq!(m.payments_elapsed(NaiveDate::from_ymd_opt(2024, 2, 14).unwrap()), Some(0));
        assert_eq!(m.payments_elapsed(NaiveDate::from_ymd_opt(2024, 2, 15).unwrap()), Some(1));
        assert_eq!(m.payments_elapsed(NaiveDate::from_ymd_opt(2099, 1, 1).unwrap()), Some(360));
    }

    #[test]
    fn test_projected_balance_after_first_payment() {
        let m = sample();
        let bal = m
            .projected_balance(NaiveDate::from_ymd_opt(2024, 2, 15).unwrap())
            .unwrap()
            .unwrap();
        assert!((bal - dec!(284607.35)).abs() <= dec!(0.01));
    }

    #[test]
    fn test_projected_balance_without_start_date() {
        let mut m = sample();
        m.start_date = None;
        assert_eq!(m.projected_balance(NaiveDate::from_ymd_opt(2030, 1, 1).unwrap()).unwrap(), None);
    }

    #[test]
    fn test_summary_flags_hand_edited_payment() {
        let mut m = sample();
        m.monthly_payment = dec!(1500);
        let out = summarize_mortgage(&m, None).unwrap();
        assert_eq!(out.result.calculated_monthly_payment, dec!(1402.03));
        assert!(out.warnings.iter().any(|w| w.contains("differs")));
    }

    #[test]
    fn test_camel_case_wire_format() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json.get("monthlyPayment").is_some());
        assert!(json.get("escrowAmount").is_some());
        assert_eq!(json["startDate"], "2024-01-15");
    }
}
