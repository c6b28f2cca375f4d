//! Financial metrics over payment records: internal rate of return (IRR)
//! and profit-and-loss (P&L).
//!
//! Everything in here is a pure function of its input. Callers fetch and
//! order the records; nothing in this module touches storage.
use crate::core::payment::PaymentType;
use serde::{Deserialize, Serialize};
use tracing::debug;

const MAX_ITERATIONS: usize = 100;
const TOLERANCE: f64 = 1e-6;
const INITIAL_RATE: f64 = 0.1;

/// A record that moves money in or out of a project.
pub trait PaymentRecord {
    fn payment_type(&self) -> PaymentType;

    /// Non-negative magnitude of the payment.
    fn amount(&self) -> f64;

    /// Amount signed by direction: received money is positive, paid out
    /// money is negative.
    fn signed_amount(&self) -> f64 {
        match self.payment_type() {
            PaymentType::ClientPayment => self.amount(),
            PaymentType::SupplierPayment => -self.amount(),
        }
    }
}

impl<P: PaymentRecord + ?Sized> PaymentRecord for &P {
    fn payment_type(&self) -> PaymentType {
        (**self).payment_type()
    }

    fn amount(&self) -> f64 {
        (**self).amount()
    }
}

/// Aggregate income versus expenses over a set of payments.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PnLResult {
    pub total_income: f64,
    pub total_expenses: f64,
    pub net_profit: f64,
    pub profit_margin: f64,
    pub client_payments: usize,
    pub supplier_payments: usize,
}

/// Converts payments into the signed cash-flow sequence consumed by
/// [`compute_irr`]. Input order is kept as-is.
pub fn cash_flows<P: PaymentRecord>(payments: &[P]) -> Vec<f64> {
    payments.iter().map(PaymentRecord::signed_amount).collect()
}

/// Estimates the internal rate of return of `cash_flows`, one entry per
/// period, using Newton-Raphson. The result is a percentage.
///
/// The solver starts at 10% and runs at most 100 iterations. It returns as
/// soon as |NPV| drops below 1e-6. When the derivative flattens below the
/// same tolerance, or the iteration cap is reached, the last estimate is
/// returned as a best effort. An empty sequence yields 0.
pub fn compute_irr(cash_flows: &[f64]) -> f64 {
    if cash_flows.is_empty() {
        return 0.0;
    }

    let mut rate = INITIAL_RATE;
    for iteration in 0..MAX_ITERATIONS {
        let (npv, derivative) = npv_with_derivative(cash_flows, rate);

        if npv.abs() < TOLERANCE {
            debug!("IRR converged after {iteration} iterations: rate={rate}");
            return rate * 100.0;
        }

        if derivative.abs() < TOLERANCE {
            debug!("IRR derivative vanished at iteration {iteration}: rate={rate}");
            break;
        }

        let next = rate - npv / derivative;
        if !next.is_finite() {
            debug!("IRR step left the real line at iteration {iteration}: rate={rate}");
            break;
        }
        rate = next;
    }

    debug!("IRR did not converge, returning last estimate: rate={rate}");
    rate * 100.0
}

/// Net present value of `cash_flows` discounted at `rate` (a fraction, not a
/// percentage). Period 0 is not discounted.
pub fn npv(cash_flows: &[f64], rate: f64) -> f64 {
    npv_with_derivative(cash_flows, rate).0
}

/// Index of the first period where the running total of `cash_flows`
/// becomes non-negative, or `None` when the investment is never recovered.
pub fn payback_period(cash_flows: &[f64]) -> Option<usize> {
    let mut cumulative = 0.0;
    for (period, flow) in cash_flows.iter().enumerate() {
        cumulative += flow;
        if cumulative >= 0.0 {
            return Some(period);
        }
    }
    None
}

fn npv_with_derivative(cash_flows: &[f64], rate: f64) -> (f64, f64) {
    let mut npv = 0.0;
    let mut derivative = 0.0;
    for (j, flow) in cash_flows.iter().enumerate() {
        let discount = (1.0 + rate).powi(j as i32);
        npv += flow / discount;
        derivative -= j as f64 * flow / (discount * (1.0 + rate));
    }
    (npv, derivative)
}

/// Splits `payments` into client (income) and supplier (expense) payments
/// and totals each side.
///
/// The margin is reported as 0 whenever there is no income.
pub fn compute_pnl<P: PaymentRecord>(payments: &[P]) -> PnLResult {
    let (income, expenses): (Vec<&P>, Vec<&P>) = payments
        .iter()
        .partition(|p| p.payment_type() == PaymentType::ClientPayment);

    let total_income = income.iter().fold(0.0, |sum, p| sum + p.amount());
    let total_expenses = expenses.iter().fold(0.0, |sum, p| sum + p.amount());
    let net_profit = total_income - total_expenses;
    let profit_margin = if total_income > 0.0 {
        (net_profit / total_income) * 100.0
    } else {
        0.0
    };

    PnLResult {
        total_income,
        total_expenses,
        net_profit,
        profit_margin,
        client_payments: income.len(),
        supplier_payments: expenses.len(),
    }
}
