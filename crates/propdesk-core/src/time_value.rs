use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;

use crate::error::PropdeskError;
use crate::types::{Money, Rate};
use crate::PropdeskResult;

/// Compound growth factor `(1 + rate)^nper` by exact repeated multiplication.
pub fn growth_factor(rate: Rate, nper: u32) -> PropdeskResult<Decimal> {
    if rate <= -Decimal::ONE {
        return Err(PropdeskError::invalid(
            "rate",
            "Periodic rate must be greater than -100%",
        ));
    }
    (Decimal::ONE + rate)
        .checked_powu(u64::from(nper))
        .ok_or_else(|| {
            PropdeskError::FinancialImpossibility(format!(
                "(1 + {rate})^{nper} overflows decimal range"
            ))
        })
}

/// Future Value
pub fn fv(rate: Rate, nper: u32, pmt: Money, present_value: Money) -> PropdeskResult<Money> {
    if rate.is_zero() {
        return Ok(-(present_value + pmt * Decimal::from(nper)));
    }

    let factor = growth_factor(rate, nper)?;
    let annuity_factor = (factor - Decimal::ONE) / rate;

    Ok(-(present_value * factor + pmt * annuity_factor))
}

/// Payment (PMT)
pub fn pmt(rate: Rate, nper: u32, present_value: Money, future_value: Money) -> PropdeskResult<Money> {
    if nper == 0 {
        return Err(PropdeskError::InvalidInput {
            field: "nper".into(),
            reason: "Number of periods must be > 0".into(),
        });
    }

    if rate.is_zero() {
        return Ok(-(present_value + future_value) / Decimal::from(nper));
    }

    let factor = growth_factor(rate, nper)?;
    let annuity_factor = (factor - Decimal::ONE) / rate;

    if annuity_factor.is_zero() {
        return Err(PropdeskError::DivisionByZero {
            context: "PMT annuity factor".into(),
        });
    }

    Ok(-(present_value * factor + future_value) / annuity_factor)
}

/// Balance still owed on a level-payment loan after `periods_paid` payments.
///
/// Sign-flipped `fv` with the borrower's convention: principal in, payment out.
pub fn remaining_balance(
    rate: Rate,
    principal: Money,
    payment: Money,
    periods_paid: u32,
) -> PropdeskResult<Money> {
    fv(rate, periods_paid, payment, -principal)
}
