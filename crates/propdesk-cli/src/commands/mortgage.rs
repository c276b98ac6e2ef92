use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::{json, Value};

use propdesk_core::mortgage::amortization::{self, MortgageTerms};
use propdesk_core::mortgage::binder::{
    DerivedField, MortgageForm, MortgageRecordBinder, OverwritePolicy,
};
use propdesk_core::mortgage::record::{self, Mortgage};
use propdesk_core::mortgage::schedule::{self, ScheduleInput};

use crate::input;

/// Loan terms given as flags
#[derive(Args)]
pub struct TermsArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Loan amount
    #[arg(long, alias = "amount")]
    pub principal: Option<Decimal>,

    /// Annual interest rate in percent (4.25 = 4.25%)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Term in years
    #[arg(long, alias = "term-years")]
    pub term: Option<u32>,
}

/// Arguments for the monthly payment calculation
#[derive(Args)]
pub struct AmortizeArgs {
    #[command(flatten)]
    pub terms: TermsArgs,
}

/// Arguments for a single period's principal/interest split
#[derive(Args)]
pub struct PeriodSplitArgs {
    #[command(flatten)]
    pub terms: TermsArgs,

    /// Payment number, 1-based
    #[arg(long)]
    pub period: u32,
}

/// Arguments for the full amortisation schedule
#[derive(Args)]
pub struct ScheduleArgs {
    #[command(flatten)]
    pub terms: TermsArgs,

    /// Extra principal paid every month
    #[arg(long)]
    pub extra: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PolicyArg {
    LastWriteWins,
    PreserveManualEdits,
}

/// Arguments for running the record binder over a form
#[derive(Args)]
pub struct BindArgs {
    /// Path to the mortgage form (JSON/YAML, camelCase string fields)
    #[arg(long)]
    pub input: Option<String>,

    /// Keep derived fields already filled in on the form
    #[arg(long, value_enum, default_value = "last-write-wins")]
    pub policy: PolicyArg,
}

/// Arguments for a mortgage record summary
#[derive(Args)]
pub struct MortgageSummaryArgs {
    /// Path to the mortgage record (JSON/YAML)
    #[arg(long)]
    pub input: Option<String>,

    /// Project the balance to this date (YYYY-MM-DD)
    #[arg(long)]
    pub as_of: Option<NaiveDate>,
}

fn resolve_terms(args: &TermsArgs) -> Result<MortgageTerms, Box<dyn std::error::Error>> {
    if args.input.is_none() {
        if let (Some(principal), Some(rate), Some(term)) = (args.principal, args.rate, args.term) {
            return Ok(MortgageTerms::new(principal, rate, term));
        }
    }
    input::load(args.input.as_deref())?.ok_or_else(|| {
        "--principal, --rate and --term are required (or provide --input)".into()
    })
}

pub fn run_amortize(args: AmortizeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let terms = resolve_terms(&args.terms)?;
    let result = amortization::analyze_mortgage(&terms)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_period_split(args: PeriodSplitArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let terms = resolve_terms(&args.terms)?;
    let result = amortization::period_split(&terms, args.period)?;
    Ok(json!({ "result": result }))
}

pub fn run_schedule(args: ScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let schedule_input = if args.terms.input.is_some() {
        let mut parsed: ScheduleInput = input::require(args.terms.input.as_deref(), "schedule")?;
        if args.extra.is_some() {
            parsed.extra_monthly_principal = args.extra;
        }
        parsed
    } else {
        ScheduleInput {
            terms: resolve_terms(&args.terms)?,
            extra_monthly_principal: args.extra,
        }
    };
    let result = schedule::build_amortization_schedule(&schedule_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_bind(args: BindArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let form: MortgageForm = input::require(args.input.as_deref(), "the mortgage binder")?;
    let policy = match args.policy {
        PolicyArg::LastWriteWins => OverwritePolicy::LastWriteWins,
        PolicyArg::PreserveManualEdits => OverwritePolicy::PreserveManualEdits,
    };

    let mut binder = MortgageRecordBinder::with_policy(form, policy);
    if policy == OverwritePolicy::PreserveManualEdits {
        let f = binder.form().clone();
        for (field, value) in [
            (DerivedField::MonthlyPayment, f.monthly_payment),
            (DerivedField::PrincipalAmount, f.principal_amount),
            (DerivedField::InterestAmount, f.interest_amount),
        ] {
            if !value.trim().is_empty() {
                binder.edit_derived(field, value);
            }
        }
    }

    let outcome = binder.recompute();
    let (mortgage, commit_error) = match binder.commit() {
        Ok(m) => (Some(m), None),
        Err(e) => (None, Some(e.to_string())),
    };

    Ok(json!({
        "result": {
            "recompute": outcome,
            "form": binder.form(),
            "mortgage": mortgage,
            "commit_error": commit_error,
        }
    }))
}

pub fn run_mortgage_summary(args: MortgageSummaryArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mortgage: Mortgage = input::require(args.input.as_deref(), "the mortgage summary")?;
    let result = record::summarize_mortgage(&mortgage, args.as_of)?;
    Ok(serde_json::to_value(result)?)
}
