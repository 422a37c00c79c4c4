use chrono::{DateTime, Utc};
use tracing::debug;

use crate::dates::add_months;
use crate::decimal::Money;
use crate::errors::{CreditError, Result};
use crate::schedule::Schedule;
use crate::state::AccountState;
use crate::types::{InstallmentStatus, OverpaymentPolicy};

use super::Payment;

/// outcome of applying an installment payment to a schedule
#[derive(Debug, Clone, PartialEq)]
pub struct InstallmentApplication {
    /// rows whose paid_amount changed, in order
    pub rows_touched: Vec<u32>,
    /// amount absorbed by the schedule
    pub applied: Money,
    /// excess retained on the target row under KeepOnInstallment
    pub excess_retained: Money,
}

/// apply an installment payment to the matching schedule row
///
/// paid_amount accumulates across partial payments; the row settles once
/// it covers the row total. must run under the per-account single-writer
/// discipline: the schedule is read, mutated, and written back whole.
pub fn apply_installment_payment(
    schedule: &mut Schedule,
    payment: &Payment,
    policy: OverpaymentPolicy,
) -> Result<InstallmentApplication> {
    let number = payment
        .installment_number
        .ok_or(CreditError::MissingInstallmentNumber)?;

    let row = schedule.installment_mut(number)?;

    let mut rows_touched = vec![number];
    let mut excess_retained = Money::ZERO;

    let paid_before = row.paid_amount;
    row.paid_amount += payment.amount;
    row.paid_date = Some(payment.payment_date);

    if row.paid_amount >= row.total_amount {
        row.status = InstallmentStatus::Paid;

        // only the portion of this payment beyond the row's outstanding
        // counts as excess; an already-overpaid row contributes nothing
        let excess = row.paid_amount - row.total_amount.max(paid_before);
        if excess.is_positive() {
            match policy {
                OverpaymentPolicy::KeepOnInstallment => {
                    excess_retained = excess;
                }
                OverpaymentPolicy::RollToNext => {
                    row.paid_amount = row.total_amount.max(paid_before);
                    roll_excess_forward(
                        schedule,
                        number,
                        excess,
                        payment.payment_date,
                        &mut rows_touched,
                        &mut excess_retained,
                    );
                }
            }
        }
    }

    debug!(
        installment = number,
        amount = %payment.amount,
        rows = rows_touched.len(),
        "installment payment applied"
    );

    Ok(InstallmentApplication {
        rows_touched,
        applied: payment.amount - excess_retained,
        excess_retained,
    })
}

/// cascade an overpayment into the following unsettled rows; whatever
/// survives past the last row stays retained on the final one touched
fn roll_excess_forward(
    schedule: &mut Schedule,
    after: u32,
    mut excess: Money,
    payment_date: DateTime<Utc>,
    rows_touched: &mut Vec<u32>,
    excess_retained: &mut Money,
) {
    for row in schedule
        .installments
        .iter_mut()
        .filter(|row| row.number > after && !row.is_settled())
    {
        if excess.is_zero() {
            break;
        }

        let portion = excess.min(row.outstanding());
        row.paid_amount += portion;
        row.paid_date = Some(payment_date);
        if row.paid_amount >= row.total_amount {
            row.status = InstallmentStatus::Paid;
        }
        rows_touched.push(row.number);
        excess -= portion;
    }

    if excess.is_positive() {
        // schedule is fully covered; nothing left to absorb the rest
        *excess_retained = excess;
        if let Some(last) = schedule.installments.last_mut() {
            last.paid_amount += excess;
        }
    }
}

/// summary returned by the direct-balance path
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DirectPaymentSummary {
    pub remaining_amount: Money,
    pub monthly_payment: Money,
    pub paid_installments: u32,
    pub remaining_months: u32,
}

/// apply a payment directly against the account balance
///
/// no schedule row is touched; the average monthly payment is re-derived
/// over the months left of the original nominal term, so it drifts as
/// payments come in larger or smaller than nominal.
pub fn apply_direct_payment(
    state: &mut AccountState,
    term_months: u32,
    amount: Money,
    payment_date: DateTime<Utc>,
) -> Result<DirectPaymentSummary> {
    if state.status != crate::types::AccountStatus::Active {
        return Err(CreditError::AccountNotActive {
            status: state.status,
        });
    }
    if !amount.is_positive() || amount > state.remaining_amount {
        return Err(CreditError::InvalidAmount {
            amount,
            remaining: state.remaining_amount,
        });
    }

    state.record_payment(amount, payment_date);
    state.paid_installments += 1;

    let remaining_months = term_months.saturating_sub(state.paid_installments);
    let monthly_payment = if remaining_months > 0 && state.remaining_amount.is_positive() {
        state.remaining_amount.div_ceil(remaining_months)
    } else {
        Money::ZERO
    };
    state.monthly_payment = monthly_payment;

    if state.remaining_amount.is_positive() {
        state.next_payment_date = Some(add_months(payment_date, 1));
    }

    debug!(
        account = %state.account_id,
        amount = %amount,
        remaining = %state.remaining_amount,
        monthly = %monthly_payment,
        "direct payment applied"
    );

    Ok(DirectPaymentSummary {
        remaining_amount: state.remaining_amount,
        monthly_payment,
        paid_installments: state.paid_installments,
        remaining_months,
    })
}
