//! Portfolio-level figures shown on the landlord dashboard: occupancy,
//! rent roll, net operating income and cash flow after debt service.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

use crate::error::PropdeskError;
use crate::types::{round_cents, with_metadata, ComputationOutput, Money};
use crate::PropdeskResult;

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitStatus {
    Occupied,
    Vacant,
    Maintenance,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_id: Option<String>,
    pub status: UnitStatus,
    /// Asking or contracted monthly rent.
    #[serde(default)]
    pub monthly_rent: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseInput {
    pub category: String,
    pub amount: Money,
}

/// Monthly debt service for one mortgage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtServiceInput {
    pub monthly_payment: Money,
    #[serde(default)]
    pub escrow_amount: Money,
}

/// One period (typically a month) of portfolio activity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PortfolioInput {
    pub units: Vec<UnitInput>,
    /// Rent payments received in the period.
    pub rent_collected: Vec<Money>,
    pub expenses: Vec<ExpenseInput>,
    pub mortgages: Vec<DebtServiceInput>,
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub total_units: usize,
    pub occupied_units: usize,
    pub vacant_units: usize,
    pub maintenance_units: usize,
    /// Occupied / total, in percent to two places.
    pub occupancy_rate_pct: Decimal,
    /// Rent if every unit were let.
    pub potential_monthly_rent: Money,
    /// Rent from occupied units only.
    pub occupied_monthly_rent: Money,
    pub total_rent_collected: Money,
    /// Collected / occupied rent, in percent. None without occupied rent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_rate_pct: Option<Decimal>,
    pub total_expenses: Money,
    pub expenses_by_category: BTreeMap<String, Money>,
    /// Mortgage payments plus escrow.
    pub total_debt_service: Money,
    /// Rent collected less operating expenses.
    pub net_operating_income: Money,
    /// NOI less debt service.
    pub net_cash_flow: Money,
    /// NOI / debt service. None when there is no debt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dscr: Option<Decimal>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Occupancy in percent. Zero units is reported as zero occupancy.
pub fn occupancy_rate(occupied: usize, total: usize) -> Decimal {
    if total == 0 {
        return Decimal::ZERO;
    }
    round_cents(Decimal::from(occupied as u64) * dec!(100) / Decimal::from(total as u64))
}

pub fn summarize_portfolio(
    input: &PortfolioInput,
) -> PropdeskResult<ComputationOutput<PortfolioSummary>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input)?;

    let count = |status: UnitStatus| input.units.iter().filter(|u| u.status == status).count();
    let total_units = input.units.len();
    let occupied_units = count(UnitStatus::Occupied);
    let vacant_units = count(UnitStatus::Vacant);
    let maintenance_units = count(UnitStatus::Maintenance);

    if total_units == 0 {
        warnings.push("No units supplied; occupancy reported as 0%".into());
    }

    let potential_monthly_rent: Money = input.units.iter().map(|u| u.monthly_rent).sum();
    let occupied_monthly_rent: Money = input
        .units
        .iter()
        .filter(|u| u.status == UnitStatus::Occupied)
        .map(|u| u.monthly_rent)
        .sum();
    let total_rent_collected: Money = input.rent_collected.iter().copied().sum();

    let collection_rate_pct = if occupied_monthly_rent.is_zero() {
        None
    } else {
        Some(round_cents(total_rent_collected * dec!(100) / occupied_monthly_rent))
    };
    if let Some(rate) = collection_rate_pct {
        if rate < dec!(100) {
            warnings.push(format!("Collected {rate}% of occupied rent"));
        }
    }

    let mut expenses_by_category: BTreeMap<String, Money> = BTreeMap::new();
    for e in &input.expenses {
        let key = match e.category.trim() {
            "" => "uncategorized".to_string(),
            c => c.to_lowercase(),
        };
        *expenses_by_category.entry(key).or_insert(Decimal::ZERO) += e.amount;
    }
    let total_expenses: Money = expenses_by_category.values().copied().sum();

    let total_debt_service: Money = input
        .mortgages
        .iter()
        .map(|m| m.monthly_payment + m.escrow_amount)
        .sum();

    let net_operating_income = total_rent_collected - total_expenses;
    let net_cash_flow = net_operating_income - total_debt_service;

    let dscr = if total_debt_service.is_zero() {
        None
    } else {
        Some((net_operating_income / total_debt_service).round_dp(4))
    };
    if let Some(d) = dscr {
        if d < Decimal::ONE {
            warnings.push(format!("DSCR {d} below 1.0x: income does not cover debt service"));
        }
    }

    let output = PortfolioSummary {
        total_units,
        occupied_units,
        vacant_units,
        maintenance_units,
        occupancy_rate_pct: occupancy_rate(occupied_units, total_units),
        potential_monthly_rent,
        occupied_monthly_rent,
        total_rent_collected,
        collection_rate_pct,
        total_expenses,
        expenses_by_category,
        total_debt_service,
        net_operating_income,
        net_cash_flow,
        dscr,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Portfolio occupancy and net income",
        &serde_json::json!({
            "units": total_units,
            "rent_payments": input.rent_collected.len(),
            "expenses": input.expenses.len(),
            "mortgages": input.mortgages.len(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

fn validate_input(input: &PortfolioInput) -> PropdeskResult<()> {
    if input.units.iter().any(|u| u.monthly_rent < Decimal::ZERO) {
        return Err(PropdeskError::invalid("units.monthly_rent", "Rent cannot be negative"));
    }
    if input.rent_collected.iter().any(|r| *r < Decimal::ZERO) {
        return Err(PropdeskError::invalid("rent_collected", "Payments cannot be negative"));
    }
    if input.expenses.iter().any(|e| e.amount < Decimal::ZERO) {
        return Err(PropdeskError::invalid("expenses.amount", "Expenses cannot be negative"));
    }
    if input
        .mortgages
        .iter()
        .any(|m| m.monthly_payment < Decimal::ZERO || m.escrow_amount < Decimal::ZERO)
    {
        return Err(PropdeskError::invalid(
            "mortgages",
            "Payments and escrow cannot be negative",
        ));
    }
    Ok(())
}
