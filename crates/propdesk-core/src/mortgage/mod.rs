//! Fixed-rate mortgage calculations and the record binder that feeds them
//! into the dashboard's mortgage form.

pub mod amortization;
pub mod binder;
pub mod record;
pub mod schedule;
