//! Fixed-rate mortgage payment and principal/interest split.
//!
//! Standard level-payment amortisation: `M = P * r(1+r)^n / ((1+r)^n - 1)`
//! with `r` the monthly rate and `n` the number of monthly payments. A zero
//! rate degenerates to straight-line repayment `M = P / n`. All outputs are
//! rounded to cents, half-up, and the principal portion is derived from the
//! rounded payment and interest so the split always sums to the payment.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::PropdeskError;
use crate::time_value;
use crate::types::{round_cents, with_metadata, ComputationOutput, Money, Percent, Rate};
use crate::PropdeskResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const MONTHS_PER_YEAR: u32 = 12;

/// Annual percent to monthly fraction: `/ 100 / 12`.
const PERCENT_MONTHS: Decimal = dec!(1200);

/// Rates above this are accepted but flagged.
const HIGH_RATE_PERCENT: Decimal = dec!(30);

/// Terms above this are accepted but flagged.
const LONG_TERM_YEARS: u32 = 50;

/// Longest term accepted at all.
pub const MAX_TERM_YEARS: u32 = 100;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Loan terms as harvested from the mortgage form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MortgageTerms {
    /// Original loan amount.
    #[serde(alias = "loanAmount", alias = "amount")]
    pub principal: Money,
    /// Annual interest rate in percent (4.25 = 4.25%).
    #[serde(alias = "annualInterestRatePercent", alias = "interestRate", alias = "rate")]
    pub annual_interest_rate_percent: Percent,
    /// Loan duration in whole years.
    #[serde(alias = "termYears", alias = "term")]
    pub term_years: u32,
}

/// Fixed monthly payment and its first-period split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmortizationResult {
    #[serde(alias = "monthlyPayment")]
    pub monthly_payment: Money,
    /// Interest portion of the first payment.
    #[serde(alias = "interestAmount")]
    pub first_period_interest: Money,
    /// Principal portion of the first payment.
    #[serde(alias = "principalAmount")]
    pub first_period_principal: Money,
}

/// Principal/interest split for one payment period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodSplit {
    pub period: u32,
    pub opening_balance: Money,
    pub payment: Money,
    pub interest: Money,
    pub principal: Money,
    pub closing_balance: Money,
}

impl MortgageTerms {
    pub fn new(principal: Money, annual_interest_rate_percent: Percent, term_years: u32) -> Self {
        Self {
            principal,
            annual_interest_rate_percent,
            term_years,
        }
    }

    /// Reject terms the formula cannot handle.
    pub fn validate(&self) -> PropdeskResult<()> {
        if self.principal <= Decimal::ZERO {
            return Err(PropdeskError::invalid(
                "principal",
                "Loan amount must be positive",
            ));
        }
        if self.annual_interest_rate_percent < Decimal::ZERO {
            return Err(PropdeskError::invalid(
                "annual_interest_rate_percent",
                "Interest rate cannot be negative",
            ));
        }
        if self.term_years == 0 {
            return Err(PropdeskError::invalid(
                "term_years",
                "Term must be at least 1 year (zero payments is undefined)",
            ));
        }
        if self.term_years > MAX_TERM_YEARS {
            return Err(PropdeskError::invalid(
                "term_years",
                format!("Term cannot exceed {MAX_TERM_YEARS} years"),
            ));
        }
        self.number_of_payments()?;
        Ok(())
    }

    /// Total monthly payments over the life of the loan.
    pub fn number_of_payments(&self) -> PropdeskResult<u32> {
        self.term_years
            .checked_mul(MONTHS_PER_YEAR)
            .ok_or_else(|| PropdeskError::invalid("term_years", "Term is too long"))
    }

    pub fn monthly_rate(&self) -> Rate {
        self.annual_interest_rate_percent / PERCENT_MONTHS
    }

    /// Interest accrued over one month on `balance`.
    pub(crate) fn monthly_interest_on(&self, balance: Money) -> Money {
        balance * self.annual_interest_rate_percent / PERCENT_MONTHS
    }

    /// Level payment before rounding. Terms must already be valid.
    pub(crate) fn exact_payment(&self) -> PropdeskResult<Money> {
        let n = self.number_of_payments()?;
        let rate = self.monthly_rate();
        if rate.is_zero() {
            return Ok(self.principal / Decimal::from(n));
        }
        Ok(-time_value::pmt(rate, n, self.principal, Decimal::ZERO)?)
    }

    /// Level payment rounded to cents; zero cents is rejected.
    pub(crate) fn rounded_payment(&self) -> PropdeskResult<Money> {
        let payment = round_cents(self.exact_payment()?);
        if payment.is_zero() {
            return Err(PropdeskError::invalid(
                "principal",
                "Loan amount is too small: monthly payment rounds to zero cents",
            ));
        }
        Ok(payment)
    }

    /// Balance owed after `periods_paid` exact level payments.
    pub(crate) fn exact_balance_after(&self, payment: Money, periods_paid: u32) -> PropdeskResult<Money> {
        time_value::remaining_balance(self.monthly_rate(), self.principal, payment, periods_paid)
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Monthly payment and first-period principal/interest split.
///
/// Errors with `InvalidInput` for a non-positive principal, a zero term, a
/// term above [`MAX_TERM_YEARS`], a negative rate, or a loan so small that
/// the payment rounds to zero cents. A zero rate is valid and repays the
/// principal in equal instalments with no interest.
pub fn compute_amortization(
    principal: Money,
    annual_interest_rate_percent: Percent,
    term_years: u32,
) -> PropdeskResult<AmortizationResult> {
    let terms = MortgageTerms::new(principal, annual_interest_rate_percent, term_years);
    amortize(&terms)
}

/// Same as [`compute_amortization`], taking the terms struct.
pub fn amortize(terms: &MortgageTerms) -> PropdeskResult<AmortizationResult> {
    terms.validate()?;

    let monthly_payment = terms.rounded_payment()?;
    let first_period_interest = round_cents(terms.monthly_interest_on(terms.principal));

    Ok(AmortizationResult {
        monthly_payment,
        first_period_interest,
        first_period_principal: monthly_payment - first_period_interest,
    })
}

/// Amortisation wrapped in the standard computation envelope.
pub fn analyze_mortgage(
    terms: &MortgageTerms,
) -> PropdeskResult<ComputationOutput<AmortizationResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let result = amortize(terms)?;

    if terms.annual_interest_rate_percent.is_zero() {
        warnings.push("Zero interest rate: payment is principal / months, no interest accrues".into());
    }
    if terms.annual_interest_rate_percent > HIGH_RATE_PERCENT {
        warnings.push(format!(
            "Interest rate {}% is above {}%; check the rate is in percent, not a fraction",
            terms.annual_interest_rate_percent, HIGH_RATE_PERCENT
        ));
    }
    if terms.term_years > LONG_TERM_YEARS {
        warnings.push(format!(
            "Term of {} years exceeds {} years",
            terms.term_years, LONG_TERM_YEARS
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Fixed-rate level-payment amortisation",
        &serde_json::json!({
            "principal": terms.principal.to_string(),
            "annual_rate_percent": terms.annual_interest_rate_percent.to_string(),
            "monthly_rate": terms.monthly_rate().to_string(),
            "term_years": terms.term_years,
            "rounding": "cents, half-up",
        }),
        warnings,
        elapsed,
        result,
    ))
}

/// Principal/interest split for payment `period` (1-based).
///
/// Balances come from the closed-form remaining balance of the exact
/// (unrounded) level payment, so any period can be queried without walking
/// the schedule. Period 1 matches [`amortize`].
pub fn period_split(terms: &MortgageTerms, period: u32) -> PropdeskResult<PeriodSplit> {
    terms.validate()?;
    let n = terms.number_of_payments()?;
    if period == 0 || period > n {
        return Err(PropdeskError::invalid(
            "period",
            format!("Period must be between 1 and {n}"),
        ));
    }

    let payment = terms.rounded_payment()?;
    let exact = terms.exact_payment()?;
    let opening = if period == 1 {
        terms.principal
    } else {
        terms.exact_balance_after(exact, period - 1)?
    };
    let closing = terms.exact_balance_after(exact, period)?;

    let interest = round_cents(terms.monthly_interest_on(opening));

    Ok(PeriodSplit {
        period,
        opening_balance: non_negative_cents(opening),
        payment,
        interest,
        principal: payment - interest,
        closing_balance: non_negative_cents(closing),
    })
}

/// Cent-rounded balance with residual negative dust clamped to zero.
pub(crate) fn non_negative_cents(balance: Money) -> Money {
    let rounded = round_cents(balance);
    if rounded <= Decimal::ZERO {
        Decimal::ZERO
    } else {
        rounded
    }
}
