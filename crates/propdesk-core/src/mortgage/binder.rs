//! Binds the amortisation calculator to the dashboard's mortgage form.
//!
//! The form keeps every field as the string the user typed. The binder
//! watches loan amount, interest rate and term; when all three parse it runs
//! the calculator and writes the suggested payment split back into the
//! derived fields. Recomputation is explicit: the host calls [`recompute`]
//! (or [`set_input`], which calls it once) after each input change.
//!
//! [`recompute`]: MortgageRecordBinder::recompute
//! [`set_input`]: MortgageRecordBinder::set_input

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

use crate::error::PropdeskError;
use crate::mortgage::amortization::{self, AmortizationResult, MortgageTerms};
use crate::mortgage::record::Mortgage;
use crate::types::Money;
use crate::PropdeskResult;

/// Mortgage entry form state, one string per input box.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MortgageForm {
    pub property_id: String,
    pub lender: String,
    pub loan_amount: String,
    pub interest_rate: String,
    pub term_years: String,
    pub monthly_payment: String,
    pub principal_amount: String,
    pub interest_amount: String,
    pub escrow_amount: String,
    pub current_balance: String,
    pub start_date: String,
}

/// Inputs the binder watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputField {
    LoanAmount,
    InterestRate,
    TermYears,
}

/// Fields the binder writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivedField {
    MonthlyPayment,
    PrincipalAmount,
    InterestAmount,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinderState {
    #[default]
    Idle,
    Recomputing,
}

/// What a recompute does to derived fields the user has typed into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverwritePolicy {
    /// Every recompute overwrites all derived fields.
    #[default]
    LastWriteWins,
    /// Hand-edited derived fields are left alone until the edits are cleared.
    PreserveManualEdits,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// One or more watched inputs are blank.
    Incomplete { missing: Vec<InputField> },
    /// Inputs are present but unusable.
    Invalid { field: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RecomputeOutcome {
    Applied {
        result: AmortizationResult,
        /// Derived fields kept because of manual edits.
        preserved: Vec<DerivedField>,
    },
    Skipped(SkipReason),
}

impl RecomputeOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, RecomputeOutcome::Applied { .. })
    }
}

impl From<PropdeskError> for SkipReason {
    fn from(e: PropdeskError) -> Self {
        match e {
            PropdeskError::InvalidInput { field, reason } => SkipReason::Invalid {
                field,
                message: reason,
            },
            other => SkipReason::Invalid {
                field: String::new(),
                message: other.to_string(),
            },
        }
    }
}

impl InputField {
    fn label(self) -> &'static str {
        match self {
            InputField::LoanAmount => "loan_amount",
            InputField::InterestRate => "interest_rate",
            InputField::TermYears => "term_years",
        }
    }
}

impl MortgageForm {
    fn input(&self, field: InputField) -> &str {
        match field {
            InputField::LoanAmount => &self.loan_amount,
            InputField::InterestRate => &self.interest_rate,
            InputField::TermYears => &self.term_years,
        }
    }

    fn input_mut(&mut self, field: InputField) -> &mut String {
        match field {
            InputField::LoanAmount => &mut self.loan_amount,
            InputField::InterestRate => &mut self.interest_rate,
            InputField::TermYears => &mut self.term_years,
        }
    }

    fn derived_mut(&mut self, field: DerivedField) -> &mut String {
        match field {
            DerivedField::MonthlyPayment => &mut self.monthly_payment,
            DerivedField::PrincipalAmount => &mut self.principal_amount,
            DerivedField::InterestAmount => &mut self.interest_amount,
        }
    }
}

/// Form session for one mortgage entry.
#[derive(Debug, Clone, Default)]
pub struct MortgageRecordBinder {
    form: MortgageForm,
    suggestion: Option<AmortizationResult>,
    manual_edits: HashSet<DerivedField>,
    policy: OverwritePolicy,
    state: BinderState,
}

impl MortgageRecordBinder {
    pub fn new(form: MortgageForm) -> Self {
        Self::with_policy(form, OverwritePolicy::default())
    }

    pub fn with_policy(form: MortgageForm, policy: OverwritePolicy) -> Self {
        Self {
            form,
            policy,
            ..Self::default()
        }
    }

    pub fn form(&self) -> &MortgageForm {
        &self.form
    }

    /// Direct access for fields the binder does not watch (lender, escrow,
    /// dates). Changing a watched input here needs an explicit `recompute`.
    pub fn form_mut(&mut self) -> &mut MortgageForm {
        &mut self.form
    }

    pub fn into_form(self) -> MortgageForm {
        self.form
    }

    /// Last calculator output, whether or not it was written to the form.
    pub fn suggestion(&self) -> Option<&AmortizationResult> {
        self.suggestion.as_ref()
    }

    pub fn state(&self) -> BinderState {
        self.state
    }

    pub fn policy(&self) -> OverwritePolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: OverwritePolicy) {
        self.policy = policy;
    }

    pub fn manual_edits(&self) -> &HashSet<DerivedField> {
        &self.manual_edits
    }

    /// Change a watched input and recompute.
    pub fn set_input(&mut self, field: InputField, value: impl Into<String>) -> RecomputeOutcome {
        *self.form.input_mut(field) = value.into();
        self.recompute()
    }

    /// Record a user edit to a derived field.
    pub fn edit_derived(&mut self, field: DerivedField, value: impl Into<String>) {
        *self.form.derived_mut(field) = value.into();
        self.manual_edits.insert(field);
    }

    pub fn clear_manual_edits(&mut self) {
        self.manual_edits.clear();
    }

    /// Terms from the current form, or why they cannot be read.
    pub fn read_terms(&self) -> Result<MortgageTerms, SkipReason> {
        let missing: Vec<InputField> = [
            InputField::LoanAmount,
            InputField::InterestRate,
            InputField::TermYears,
        ]
        .into_iter()
        .filter(|f| self.form.input(*f).trim().is_empty())
        .collect();
        if !missing.is_empty() {
            return Err(SkipReason::Incomplete { missing });
        }

        let principal = parse_decimal(InputField::LoanAmount.label(), &self.form.loan_amount)
            .map_err(SkipReason::from)?;
        let rate = parse_decimal(InputField::InterestRate.label(), &self.form.interest_rate)
            .map_err(SkipReason::from)?;
        let term = parse_term(&self.form.term_years).map_err(SkipReason::from)?;
        Ok(MortgageTerms::new(principal, rate, term))
    }

    /// Run the calculator against the current inputs.
    ///
    /// Incomplete or invalid inputs leave every field untouched.
    pub fn recompute(&mut self) -> RecomputeOutcome {
        self.state = BinderState::Recomputing;
        let outcome = self.recompute_inner();
        self.state = BinderState::Idle;
        outcome
    }

    fn recompute_inner(&mut self) -> RecomputeOutcome {
        let terms = match self.read_terms() {
            Ok(t) => t,
            Err(reason) => {
                tracing::debug!(?reason, "mortgage recompute skipped");
                return RecomputeOutcome::Skipped(reason);
            }
        };

        let result = match amortization::amortize(&terms) {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(error = %e, "mortgage recompute rejected");
                return RecomputeOutcome::Skipped(e.into());
            }
        };

        let mut preserved = Vec::new();
        for (field, value) in [
            (DerivedField::MonthlyPayment, result.monthly_payment),
            (DerivedField::PrincipalAmount, result.first_period_principal),
            (DerivedField::InterestAmount, result.first_period_interest),
        ] {
            if self.policy == OverwritePolicy::PreserveManualEdits
                && self.manual_edits.contains(&field)
            {
                preserved.push(field);
                continue;
            }
            *self.form.derived_mut(field) = format_money(value);
            self.manual_edits.remove(&field);
        }

        tracing::debug!(
            monthly_payment = %result.monthly_payment,
            preserved = preserved.len(),
            "mortgage recompute applied"
        );
        self.suggestion = Some(result.clone());
        RecomputeOutcome::Applied { result, preserved }
    }

    /// Parse the whole form into a mortgage record for submission.
    pub fn commit(&self) -> PropdeskResult<Mortgage> {
        let f = &self.form;

        let lender = f.lender.trim();
        if lender.is_empty() {
            return Err(PropdeskError::invalid("lender", "Lender is required"));
        }

        let loan_amount = parse_decimal("loan_amount", &f.loan_amount)?;
        let interest_rate = parse_decimal("interest_rate", &f.interest_rate)?;
        let term_years = parse_term(&f.term_years)?;
        MortgageTerms::new(loan_amount, interest_rate, term_years).validate()?;

        let escrow_amount = parse_optional_decimal("escrow_amount", &f.escrow_amount)?
            .unwrap_or(Decimal::ZERO);
        if escrow_amount < Decimal::ZERO {
            return Err(PropdeskError::invalid(
                "escrow_amount",
                "Escrow amount cannot be negative",
            ));
        }

        let start_date = match f.start_date.trim() {
            "" => None,
            s => Some(parse_date("start_date", s)?),
        };
        let property_id = match f.property_id.trim() {
            "" => None,
            s => Some(s.to_string()),
        };

        Ok(Mortgage {
            property_id,
            lender: lender.to_string(),
            loan_amount,
            interest_rate,
            term_years,
            monthly_payment: parse_decimal("monthly_payment", &f.monthly_payment)?,
            principal_amount: parse_decimal("principal_amount", &f.principal_amount)?,
            interest_amount: parse_decimal("interest_amount", &f.interest_amount)?,
            escrow_amount,
            current_balance: parse_optional_decimal("current_balance", &f.current_balance)?
                .unwrap_or(loan_amount),
            start_date,
        })
    }
}

/// Two-decimal string for a form field.
pub fn format_money(value: Money) -> String {
    format!("{value:.2}")
}

fn parse_decimal(field: &str, raw: &str) -> PropdeskResult<Decimal> {
    parse_optional_decimal(field, raw)?
        .ok_or_else(|| PropdeskError::invalid(field, "Value is required"))
}

fn parse_optional_decimal(field: &str, raw: &str) -> PropdeskResult<Option<Decimal>> {
    let s = raw.trim();
    if s.is_empty() {
        return Ok(None);
    }
    Decimal::from_str(s)
        .map(Some)
        .map_err(|_| PropdeskError::invalid(field, format!("'{s}' is not a number")))
}

/// Whole years; "30" and "30.0" both parse, "30.5" does not.
fn parse_term(raw: &str) -> PropdeskResult<u32> {
    let value = parse_decimal("term_years", raw)?;
    if !value.fract().is_zero() {
        return Err(PropdeskError::invalid(
            "term_years",
            "Term must be a whole number of years",
        ));
    }
    value
        .to_u32()
        .ok_or_else(|| PropdeskError::invalid("term_years", "Term must be a non-negative whole number"))
}

/// `YYYY-MM-DD`, tolerating a trailing ISO time component.
fn parse_date(field: &str, raw: &str) -> PropdeskResult<NaiveDate> {
    let date_part = raw.split('T').next().unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|e| PropdeskError::DateError(format!("{field}: '{raw}' ({e})")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn filled_binder() -> MortgageRecordBinder {
        let mut b = MortgageRecordBinder::default();
        b.set_input(InputField::LoanAmount, "285000");
        b.set_input(InputField::InterestRate, "4.25");
        b.set_input(InputField::TermYears, "30");
        b
    }

    #[test]
    fn test_incomplete_inputs_skip() {
        let mut b = MortgageRecordBinder::default();
        let out = b.set_input(InputField::LoanAmount, "285000");
        assert_eq!(
            out,
            RecomputeOutcome::Skipped(SkipReason::Incomplete {
                missing: vec![InputField::InterestRate, InputField::TermYears],
            })
        );
        assert_eq!(b.form().monthly_payment, "");
        assert!(b.suggestion().is_none());
    }

    #[test]
    fn test_complete_inputs_fill_derived_fields() {
        let b = filled_binder();
        assert_eq!(b.form().monthly_payment, "1402.03");
        assert_eq!(b.form().principal_amount, "392.65");
        assert_eq!(b.form().interest_amount, "1009.38");
        assert_eq!(b.state(), BinderState::Idle);
    }

    #[test]
    fn test_zero_rate_formats_two_decimals() {
        let mut b = MortgageRecordBinder::default();
        b.set_input(InputField::LoanAmount, "100000");
        b.set_input(InputField::InterestRate, "0");
        b.set_input(InputField::TermYears, "10");
        assert_eq!(b.form().interest_amount, "0.00");
        assert_eq!(b.form().monthly_payment, "833.33");
    }

    #[test]
    fn test_invalid_input_keeps_prior_values() {
        let mut b = filled_binder();
        let out = b.set_input(InputField::TermYears, "0");
        assert!(matches!(
            out,
            RecomputeOutcome::Skipped(SkipReason::Invalid { ref field, .. }) if field == "term_years"
        ));
        assert_eq!(b.form().monthly_payment, "1402.03");

        let out = b.set_input(InputField::InterestRate, "abc");
        assert!(!out.is_applied());
        assert_eq!(b.form().monthly_payment, "1402.03");
    }

    #[test]
    fn test_zero_principal_passes_gate_but_is_invalid() {
        let mut b = filled_binder();
        let out = b.set_input(InputField::LoanAmount, "0");
        assert_eq!(
            out,
            RecomputeOutcome::Skipped(SkipReason::Invalid {
                field: "principal".into(),
                message: "Loan amount must be positive".into(),
            })
        );
        assert_eq!(b.form().monthly_payment, "1402.03");
        assert_eq!(b.form().principal_amount, "392.65");
        assert_eq!(b.state(), BinderState::Idle);
    }

    #[test]
    fn test_negative_rate_passes_gate_but_is_invalid() {
        let mut b = filled_binder();
        let out = b.set_input(InputField::InterestRate, "-1.5");
        assert!(matches!(
            out,
            RecomputeOutcome::Skipped(SkipReason::Invalid { ref field, .. })
                if field == "annual_interest_rate_percent"
        ));
        assert_eq!(b.form().interest_amount, "1009.38");
        assert_eq!(b.suggestion().map(|r| r.monthly_payment), Some(dec!(1402.03)));
    }

    #[test]
    fn test_fractional_term_is_invalid() {
        let mut b = filled_binder();
        assert!(!b.set_input(InputField::TermYears, "29.5").is_applied());
        assert!(b.set_input(InputField::TermYears, "15.0").is_applied());
    }

    #[test]
    fn test_last_write_wins_clobbers_manual_edit() {
        let mut b = filled_binder();
        b.edit_derived(DerivedField::MonthlyPayment, "1500.00");
        assert_eq!(b.form().monthly_payment, "1500.00");

        b.set_input(InputField::InterestRate, "5");
        assert_ne!(b.form().monthly_payment, "1500.00");
        assert!(b.manual_edits().is_empty());
    }

    #[test]
    fn test_preserve_manual_edits_policy() {
        let mut b = filled_binder();
        b.set_policy(OverwritePolicy::PreserveManualEdits);
        b.edit_derived(DerivedField::MonthlyPayment, "1500.00");

        let out = b.set_input(InputField::InterestRate, "5");
        match out {
            RecomputeOutcome::Applied { preserved, result } => {
                assert_eq!(preserved, vec![DerivedField::MonthlyPayment]);
                assert_eq!(result.monthly_payment, dec!(1529.94));
            }
            other => panic!("Expected Applied, got {other:?}"),
        }
        assert_eq!(b.form().monthly_payment, "1500.00");
        assert_eq!(b.form().interest_amount, "1187.50");

        b.clear_manual_edits();
        b.recompute();
        assert_eq!(b.form().monthly_payment, "1529.94");
    }

    #[test]
    fn test_commit_builds_record() {
        let mut b = filled_binder();
        {
            let f = b.form_mut();
            f.lender = "First National".into();
            f.escrow_amount = "350".into();
            f.start_date = "2024-01-15T00:00:00.000Z".into();
        }
        let m = b.commit().unwrap();
        assert_eq!(m.monthly_payment, dec!(1402.03));
        assert_eq!(m.escrow_amount, dec!(350));
        assert_eq!(m.current_balance, dec!(285000));
        assert_eq!(m.start_date, NaiveDate::from_ymd_opt(2024, 1, 15));
        assert_eq!(m.property_id, None);
    }

    #[test]
    fn test_commit_requires_lender() {
        let b = filled_binder();
        match b.commit().unwrap_err() {
            PropdeskError::InvalidInput { field, .. } => assert_eq!(field, "lender"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_commit_rejects_bad_date() {
        let mut b = filled_binder();
        b.form_mut().lender = "Bank".into();
        b.form_mut().start_date = "15/01/2024".into();
        assert!(matches!(b.commit(), Err(PropdeskError::DateError(_))));
    }
}
