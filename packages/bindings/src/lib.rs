use chrono::NaiveDate;
use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Deserialize;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Mortgage
// ---------------------------------------------------------------------------

#[napi]
pub fn compute_amortization(input_json: String) -> NapiResult<String> {
    let input: propdesk_core::mortgage::amortization::MortgageTerms =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        propdesk_core::mortgage::amortization::analyze_mortgage(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PeriodSplitRequest {
    #[serde(flatten)]
    terms: propdesk_core::mortgage::amortization::MortgageTerms,
    period: u32,
}

#[napi]
pub fn mortgage_period_split(input_json: String) -> NapiResult<String> {
    let input: PeriodSplitRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = propdesk_core::mortgage::amortization::period_split(&input.terms, input.period)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn amortization_schedule(input_json: String) -> NapiResult<String> {
    let input: propdesk_core::mortgage::schedule::ScheduleInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = propdesk_core::mortgage::schedule::build_amortization_schedule(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryRequest {
    mortgage: propdesk_core::mortgage::record::Mortgage,
    #[serde(default)]
    as_of: Option<NaiveDate>,
}

#[napi]
pub fn mortgage_summary(input_json: String) -> NapiResult<String> {
    let input: SummaryRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = propdesk_core::mortgage::record::summarize_mortgage(&input.mortgage, input.as_of)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Mortgage form binder
// ---------------------------------------------------------------------------

/// One recompute pass over the dashboard's mortgage form.
///
/// Takes the form JSON and returns `{ outcome, form }`; the host writes
/// `form` back into its state. Skipped recomputes return the form unchanged.
#[napi]
pub fn recompute_mortgage_form(form_json: String) -> NapiResult<String> {
    use propdesk_core::mortgage::binder::{MortgageForm, MortgageRecordBinder};

    let form: MortgageForm = serde_json::from_str(&form_json).map_err(to_napi_error)?;
    let mut binder = MortgageRecordBinder::new(form);
    let outcome = binder.recompute();
    serde_json::to_string(&serde_json::json!({
        "outcome": outcome,
        "form": binder.form(),
    }))
    .map_err(to_napi_error)
}

/// Parse a mortgage form into the record posted to `/api/mortgages`.
#[napi]
pub fn commit_mortgage_form(form_json: String) -> NapiResult<String> {
    use propdesk_core::mortgage::binder::{MortgageForm, MortgageRecordBinder};

    let form: MortgageForm = serde_json::from_str(&form_json).map_err(to_napi_error)?;
    let mortgage = MortgageRecordBinder::new(form)
        .commit()
        .map_err(to_napi_error)?;
    serde_json::to_string(&mortgage).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Property
// ---------------------------------------------------------------------------

#[napi]
pub fn portfolio_summary(input_json: String) -> NapiResult<String> {
    let input: propdesk_core::property::portfolio::PortfolioInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        propdesk_core::property::portfolio::summarize_portfolio(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn occupancy_rate(occupied: u32, total: u32) -> String {
    let rate: Decimal =
        propdesk_core::property::portfolio::occupancy_rate(occupied as usize, total as usize);
    rate.to_string()
}

// ---------------------------------------------------------------------------
// Billing
// ---------------------------------------------------------------------------

#[napi]
pub fn outstanding_balance(input_json: String) -> NapiResult<String> {
    let input: propdesk_core::billing::ledger::BalanceInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        propdesk_core::billing::ledger::outstanding_balance(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn generate_monthly_billing(input_json: String) -> NapiResult<String> {
    let input: propdesk_core::billing::ledger::BillingRunInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        propdesk_core::billing::ledger::generate_monthly_billing(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn refresh_billing_statuses(input_json: String) -> NapiResult<String> {
    let input: propdesk_core::billing::ledger::StatusRefreshInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        propdesk_core::billing::ledger::refresh_statuses(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn run_automatic_billing(input_json: String) -> NapiResult<String> {
    let input: propdesk_core::billing::ledger::AutomaticBillingInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        propdesk_core::billing::ledger::run_automatic_billing(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
