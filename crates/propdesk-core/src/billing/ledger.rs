//! Billing records against rent payments.
//!
//! Payments are pooled per tenant and applied to that tenant's open
//! records oldest due date first. Cancelled records never count.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::time::Instant;

use crate::billing::period::BillingPeriod;
use crate::error::PropdeskError;
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::PropdeskResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingStatus {
    #[default]
    Pending,
    Paid,
    Overdue,
    Cancelled,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingType {
    #[default]
    Rent,
    Fee,
    Utility,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub tenant_id: String,
    pub unit_id: String,
    pub amount: Money,
    pub billing_period: BillingPeriod,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub status: BillingStatus,
    #[serde(rename = "type", default)]
    pub kind: BillingType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentPayment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub tenant_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_id: Option<String>,
    pub amount: Money,
    pub paid_date: NaiveDate,
}

/// Active rental agreement that drives monthly billing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lease {
    pub tenant_id: String,
    pub unit_id: String,
    pub monthly_rent: Money,
    /// Day of month rent falls due; clamped to the month's last day.
    #[serde(default = "default_due_day")]
    pub due_day: u32,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_due_day() -> u32 {
    1
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceInput {
    pub tenant_id: String,
    #[serde(default)]
    pub records: Vec<BillingRecord>,
    #[serde(default)]
    pub payments: Vec<RentPayment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantBalance {
    pub tenant_id: String,
    pub total_billed: Money,
    pub total_paid: Money,
    /// Amount still owed, never negative.
    pub balance: Money,
    /// Overpayment carried as credit.
    pub credit: Money,
    /// Records the tenant's payments do not cover, oldest due first.
    pub open_records: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingRunInput {
    pub leases: Vec<Lease>,
    pub period: BillingPeriod,
    #[serde(default)]
    pub existing: Vec<BillingRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingRunOutput {
    pub period: BillingPeriod,
    pub generated: Vec<BillingRecord>,
    /// Tenants that already had a rent record for the period.
    pub skipped_tenants: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRefreshInput {
    pub records: Vec<BillingRecord>,
    #[serde(default)]
    pub payments: Vec<RentPayment>,
    pub today: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusRefreshOutput {
    pub records: Vec<BillingRecord>,
    pub paid: usize,
    pub overdue: usize,
    pub pending: usize,
    /// Records whose status changed.
    pub updated: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomaticBillingInput {
    pub leases: Vec<Lease>,
    pub period: BillingPeriod,
    #[serde(default)]
    pub existing: Vec<BillingRecord>,
    #[serde(default)]
    pub payments: Vec<RentPayment>,
    pub today: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomaticBillingOutput {
    pub period: BillingPeriod,
    /// New rent records created for the period.
    pub generated: usize,
    /// Existing records whose status changed.
    pub updated: usize,
    pub skipped_tenants: Vec<String>,
    /// Existing records followed by the generated ones, statuses refreshed.
    pub records: Vec<BillingRecord>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// What `tenant_id` owes after all of their payments.
pub fn outstanding_balance(input: &BalanceInput) -> PropdeskResult<ComputationOutput<TenantBalance>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_amounts(&input.records, &input.payments)?;

    let covered = settle(&input.records, &input.payments);
    let billed: Vec<(&BillingRecord, bool)> = input
        .records
        .iter()
        .zip(covered)
        .filter(|(r, _)| r.tenant_id == input.tenant_id && r.status != BillingStatus::Cancelled)
        .collect();
    let total_billed: Money = billed.iter().map(|(r, _)| r.amount).sum();
    let total_paid: Money = input
        .payments
        .iter()
        .filter(|p| p.tenant_id == input.tenant_id)
        .map(|p| p.amount)
        .sum();

    if billed.is_empty() {
        warnings.push(format!("No billing records for tenant {}", input.tenant_id));
    }

    let net = total_billed - total_paid;
    let output = TenantBalance {
        tenant_id: input.tenant_id.clone(),
        total_billed,
        total_paid,
        balance: net.max(Decimal::ZERO),
        credit: (-net).max(Decimal::ZERO),
        open_records: billed.iter().filter(|(_, paid)| !paid).count(),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Tenant outstanding balance (billed less paid)",
        &serde_json::json!({
            "tenant_id": input.tenant_id,
            "records": input.records.len(),
            "payments": input.payments.len(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// Pending rent records for every active lease not yet billed for the period.
pub fn generate_monthly_billing(
    input: &BillingRunInput,
) -> PropdeskResult<ComputationOutput<BillingRunOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let already_billed: HashSet<&str> = input
        .existing
        .iter()
        .filter(|r| {
            r.billing_period == input.period
                && r.kind == BillingType::Rent
                && r.status != BillingStatus::Cancelled
        })
        .map(|r| r.tenant_id.as_str())
        .collect();

    let mut generated = Vec::new();
    let mut skipped_tenants = Vec::new();

    for lease in input.leases.iter().filter(|l| l.active) {
        if lease.monthly_rent <= Decimal::ZERO {
            return Err(PropdeskError::invalid(
                "leases.monthly_rent",
                format!("Rent for tenant {} must be positive", lease.tenant_id),
            ));
        }
        if !(1..=31).contains(&lease.due_day) {
            return Err(PropdeskError::invalid(
                "leases.due_day",
                format!("Due day {} is not a day of the month", lease.due_day),
            ));
        }
        if already_billed.contains(lease.tenant_id.as_str()) {
            skipped_tenants.push(lease.tenant_id.clone());
            continue;
        }

        generated.push(BillingRecord {
            id: None,
            tenant_id: lease.tenant_id.clone(),
            unit_id: lease.unit_id.clone(),
            amount: lease.monthly_rent,
            billing_period: input.period,
            due_date: input.period.day_clamped(lease.due_day)?,
            status: BillingStatus::Pending,
            kind: BillingType::Rent,
        });
    }

    let inactive = input.leases.iter().filter(|l| !l.active).count();
    if inactive > 0 {
        warnings.push(format!("{inactive} inactive lease(s) not billed"));
    }
    tracing::debug!(
        period = %input.period,
        generated = generated.len(),
        skipped = skipped_tenants.len(),
        "monthly billing run"
    );

    let output = BillingRunOutput {
        period: input.period,
        generated,
        skipped_tenants,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Monthly rent billing run",
        &serde_json::json!({
            "period": input.period.to_string(),
            "leases": input.leases.len(),
            "existing_records": input.existing.len(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// Re-derive record statuses from payments as of `today`.
pub fn refresh_statuses(
    input: &StatusRefreshInput,
) -> PropdeskResult<ComputationOutput<StatusRefreshOutput>> {
    let start = Instant::now();
    let warnings: Vec<String> = Vec::new();

    validate_amounts(&input.records, &input.payments)?;

    let covered = settle(&input.records, &input.payments);
    let mut records = input.records.clone();
    let mut updated = 0;
    for (record, paid) in records.iter_mut().zip(covered) {
        if record.status == BillingStatus::Cancelled {
            continue;
        }
        let status = if paid {
            BillingStatus::Paid
        } else if record.due_date < input.today {
            BillingStatus::Overdue
        } else {
            BillingStatus::Pending
        };
        if status != record.status {
            record.status = status;
            updated += 1;
        }
    }

    let count = |s: BillingStatus| records.iter().filter(|r| r.status == s).count();
    let output = StatusRefreshOutput {
        paid: count(BillingStatus::Paid),
        overdue: count(BillingStatus::Overdue),
        pending: count(BillingStatus::Pending),
        updated,
        records,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Billing status refresh (payments applied oldest due first)",
        &serde_json::json!({
            "today": input.today.to_string(),
            "records": input.records.len(),
            "payments": input.payments.len(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// One automatic billing pass: bill the period, then refresh every status.
pub fn run_automatic_billing(
    input: &AutomaticBillingInput,
) -> PropdeskResult<ComputationOutput<AutomaticBillingOutput>> {
    let start = Instant::now();

    let run = generate_monthly_billing(&BillingRunInput {
        leases: input.leases.clone(),
        period: input.period,
        existing: input.existing.clone(),
    })?;
    let mut warnings = run.warnings;
    let generated = run.result.generated.len();

    let mut records = input.existing.clone();
    records.extend(run.result.generated);
    let refresh = refresh_statuses(&StatusRefreshInput {
        records,
        payments: input.payments.clone(),
        today: input.today,
    })?;
    warnings.extend(refresh.warnings);

    let updated = input
        .existing
        .iter()
        .zip(&refresh.result.records)
        .filter(|(before, after)| before.status != after.status)
        .count();
    tracing::debug!(period = %input.period, generated, updated, "automatic billing run");

    let output = AutomaticBillingOutput {
        period: input.period,
        generated,
        updated,
        skipped_tenants: run.result.skipped_tenants,
        records: refresh.result.records,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Automatic billing (monthly run, then status refresh)",
        &serde_json::json!({
            "period": input.period.to_string(),
            "today": input.today.to_string(),
            "leases": input.leases.len(),
            "existing_records": input.existing.len(),
            "payments": input.payments.len(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// Which records the pooled per-tenant payments cover, applied oldest due
/// date first. Cancelled records are never covered.
fn settle(records: &[BillingRecord], payments: &[RentPayment]) -> Vec<bool> {
    let mut pools: HashMap<&str, Money> = HashMap::new();
    for p in payments {
        *pools.entry(p.tenant_id.as_str()).or_insert(Decimal::ZERO) += p.amount;
    }

    let mut order: Vec<usize> = (0..records.len()).collect();
    order.sort_by_key(|&i| (records[i].due_date, i));

    let mut covered = vec![false; records.len()];
    for i in order {
        let record = &records[i];
        if record.status == BillingStatus::Cancelled {
            continue;
        }
        let pool = pools.entry(record.tenant_id.as_str()).or_insert(Decimal::ZERO);
        if *pool >= record.amount {
            *pool -= record.amount;
            covered[i] = true;
        }
    }
    covered
}

fn validate_amounts(records: &[BillingRecord], payments: &[RentPayment]) -> PropdeskResult<()> {
    if records.iter().any(|r| r.amount < Decimal::ZERO) {
        return Err(PropdeskError::invalid("records.amount", "Billed amounts cannot be negative"));
    }
    if payments.iter().any(|p| p.amount <= Decimal::ZERO) {
        return Err(PropdeskError::invalid("payments.amount", "Payments must be positive"));
    }
    Ok(())
}
