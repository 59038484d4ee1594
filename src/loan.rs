//! Loan payment calculations for financing an offer.
use crate::units::{Dimensionless, Money};
use chrono::{Months, NaiveDate};

/// The fixed monthly payment for an annuity loan.
///
/// Standard formula `P * r * (1+r)^n / ((1+r)^n - 1)` with the monthly rate `r` derived from the
/// annual percentage; a zero-interest loan divides the principal evenly over the term.
#[allow(clippy::cast_possible_wrap)]
pub fn monthly_payment(principal: Money, term_months: u32, annual_rate_percent: f64) -> Money {
    if term_months == 0 {
        return Money(0.0);
    }

    let monthly_rate = annual_rate_percent / 12.0 / 100.0;
    if monthly_rate == 0.0 {
        return principal / Dimensionless(term_months as f64);
    }

    let factor = (1.0 + monthly_rate).powi(term_months as i32);
    principal * (monthly_rate * factor / (factor - 1.0))
}

/// The date of the first instalment given an optional deferment.
///
/// Deferment is informational only: it shifts the first payment date and does not change the
/// payment amount or capitalise interest during the deferred months.
pub fn first_payment_date(start: NaiveDate, deferment_months: u32) -> NaiveDate {
    start
        .checked_add_months(Months::new(deferment_months))
        .unwrap_or(start)
}
