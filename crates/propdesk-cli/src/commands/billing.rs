use chrono::NaiveDate;
use clap::Args;
use serde_json::Value;

use propdesk_core::billing::ledger::{
    self, AutomaticBillingInput, BalanceInput, BillingRunInput, StatusRefreshInput,
};
use propdesk_core::billing::period::BillingPeriod;

use crate::input;

/// Arguments for a tenant's outstanding balance
#[derive(Args)]
pub struct BalanceArgs {
    /// Path to JSON/YAML file with tenantId, records and payments
    #[arg(long)]
    pub input: Option<String>,

    /// Tenant to report on (overrides tenantId in the input)
    #[arg(long)]
    pub tenant: Option<String>,
}

/// Arguments for the monthly billing run
#[derive(Args)]
pub struct GenerateBillingArgs {
    /// Path to JSON/YAML file with leases, period and existing records
    #[arg(long)]
    pub input: Option<String>,

    /// Billing period YYYY-MM (overrides period in the input)
    #[arg(long)]
    pub period: Option<BillingPeriod>,
}

/// Arguments for refreshing billing statuses
#[derive(Args)]
pub struct RefreshBillingArgs {
    /// Path to JSON/YAML file with records, payments and today
    #[arg(long)]
    pub input: Option<String>,

    /// Reference date (overrides today in the input)
    #[arg(long)]
    pub today: Option<NaiveDate>,
}

/// Arguments for the automatic billing pass
#[derive(Args)]
pub struct RunBillingArgs {
    /// Path to JSON/YAML file with leases, period, existing records, payments and today
    #[arg(long)]
    pub input: Option<String>,

    /// Billing period YYYY-MM (overrides period in the input)
    #[arg(long)]
    pub period: Option<BillingPeriod>,

    /// Reference date (overrides today in the input)
    #[arg(long)]
    pub today: Option<NaiveDate>,
}

pub fn run_outstanding_balance(args: BalanceArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut balance_input: BalanceInput = input::require(args.input.as_deref(), "outstanding balance")?;
    if let Some(tenant) = args.tenant {
        balance_input.tenant_id = tenant;
    }
    let result = ledger::outstanding_balance(&balance_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_generate_billing(args: GenerateBillingArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut run_input: BillingRunInput = input::require(args.input.as_deref(), "billing generation")?;
    if let Some(period) = args.period {
        run_input.period = period;
    }
    let result = ledger::generate_monthly_billing(&run_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_refresh_billing(args: RefreshBillingArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut refresh_input: StatusRefreshInput = input::require(args.input.as_deref(), "billing refresh")?;
    if let Some(today) = args.today {
        refresh_input.today = today;
    }
    let result = ledger::refresh_statuses(&refresh_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_automatic_billing(args: RunBillingArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut run_input: AutomaticBillingInput = input::require(args.input.as_deref(), "automatic billing")?;
    if let Some(period) = args.period {
        run_input.period = period;
    }
    if let Some(today) = args.today {
        run_input.today = today;
    }
    let result = ledger::run_automatic_billing(&run_input)?;
    Ok(serde_json::to_value(result)?)
}
