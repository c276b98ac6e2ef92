#![cfg(all(feature = "property", feature = "billing"))]

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use propdesk_core::billing::ledger::{
    self, BalanceInput, BillingRunInput, BillingStatus, Lease, StatusRefreshInput,
};
use propdesk_core::property::portfolio::{self, PortfolioInput};
use rust_decimal_macros::dec;

fn lease(tenant: &str, rent: rust_decimal::Decimal) -> Lease {
    Lease {
        tenant_id: tenant.into(),
        unit_id: format!("unit-{tenant}"),
        monthly_rent: rent,
        due_day: 5,
        active: true,
    }
}

#[test]
fn test_billing_cycle_end_to_end() {
    let leases = vec![lease("alice", dec!(1000)), lease("bob", dec!(1250))];

    let june = ledger::generate_monthly_billing(&BillingRunInput {
        leases: leases.clone(),
        period: "2025-06".parse().unwrap(),
        existing: vec![],
    })
    .unwrap()
    .result
    .generated;
    assert_eq!(june.len(), 2);

    let mut records = june.clone();
    let july = ledger::generate_monthly_billing(&BillingRunInput {
        leases,
        period: "2025-07".parse().unwrap(),
        existing: records.clone(),
    })
    .unwrap()
    .result
    .generated;
    records.extend(july);
    assert_eq!(records.len(), 4);

    let payments: Vec<ledger::RentPayment> = serde_json::from_value(serde_json::json!([
        {"tenantId": "alice", "amount": "1000", "paidDate": "2025-06-03"},
        {"tenantId": "bob", "amount": "500", "paidDate": "2025-06-04"}
    ]))
    .unwrap();

    let refreshed = ledger::refresh_statuses(&StatusRefreshInput {
        records: records.clone(),
        payments: payments.clone(),
        today: NaiveDate::from_ymd_opt(2025, 7, 2).unwrap(),
    })
    .unwrap()
    .result;
    assert_eq!(refreshed.paid, 1);
    assert_eq!(refreshed.overdue, 1);
    assert_eq!(refreshed.pending, 2);

    let bob = ledger::outstanding_balance(&BalanceInput {
        tenant_id: "bob".into(),
        records: refreshed.records,
        payments,
    })
    .unwrap()
    .result;
    assert_eq!(bob.total_billed, dec!(2500));
    assert_eq!(bob.balance, dec!(2000));
    assert_eq!(bob.open_records, 2);
}

#[test]
fn test_regenerating_same_period_is_idempotent() {
    let input = BillingRunInput {
        leases: vec![lease("alice", dec!(1000))],
        period: "2025-06".parse().unwrap(),
        existing: vec![],
    };
    let first = ledger::generate_monthly_billing(&input).unwrap().result.generated;
    let second = ledger::generate_monthly_billing(&BillingRunInput {
        existing: first,
        ..input
    })
    .unwrap()
    .result;
    assert!(second.generated.is_empty());
    assert_eq!(second.skipped_tenants, vec!["alice".to_string()]);
}

#[test]
fn test_portfolio_from_dashboard_json() {
    let input: PortfolioInput = serde_json::from_value(serde_json::json!({
        "units": [
            {"status": "occupied", "monthlyRent": "1000"},
            {"status": "occupied", "monthlyRent": "1250"},
            {"status": "vacant", "monthlyRent": "1100"}
        ],
        "rentCollected": ["1000", "625"],
        "expenses": [{"category": "Utilities", "amount": "180"}],
        "mortgages": [{"monthlyPayment": "1402.03", "escrowAmount": "350"}]
    }))
    .unwrap();
    let out = portfolio::summarize_portfolio(&input).unwrap();
    let s = &out.result;
    assert_eq!(s.occupancy_rate_pct, dec!(66.67));
    assert_eq!(s.collection_rate_pct, Some(dec!(72.22)));
    assert_eq!(s.net_operating_income, dec!(1445));
    assert_eq!(s.net_cash_flow, dec!(-307.03));
    assert!(out.warnings.iter().any(|w| w.contains("DSCR")));
}
