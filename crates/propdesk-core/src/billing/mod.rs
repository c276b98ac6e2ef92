//! Tenant billing: monthly rent records, payments and outstanding balances.

pub mod ledger;
pub mod period;
