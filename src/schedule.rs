use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::dates::add_months;
use crate::decimal::{Money, Rate};
use crate::errors::{CreditError, Result};
use crate::types::InstallmentStatus;

/// one row of a payment schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Installment {
    /// 1-based, contiguous
    pub number: u32,
    pub due_date: DateTime<Utc>,
    pub principal_amount: Money,
    pub interest_amount: Money,
    /// principal + interest, whole currency units
    pub total_amount: Money,
    pub status: InstallmentStatus,
    pub paid_date: Option<DateTime<Utc>>,
    /// accumulates across partial payments
    pub paid_amount: Money,
}

impl Installment {
    /// outstanding portion of this row
    pub fn outstanding(&self) -> Money {
        (self.total_amount - self.paid_amount).max(Money::ZERO)
    }

    pub fn is_settled(&self) -> bool {
        self.status == InstallmentStatus::Paid
    }
}

/// ordered payment schedule, generated once at account opening;
/// row count, dates, and nominal amounts never change afterwards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub principal: Money,
    pub annual_rate: Rate,
    pub term_months: u32,
    pub start_date: DateTime<Utc>,
    pub monthly_payment: Money,
    pub installments: Vec<Installment>,
    pub total_interest: Money,
}

impl Schedule {
    /// generate a deterministic installment schedule
    ///
    /// zero rate: level principal, zero interest. positive rate: annuity
    /// payment P*r*(1+r)^n / ((1+r)^n - 1) with r = annual/12. every
    /// monetary field is rounded half-up to a whole unit at row
    /// construction, and the last row absorbs the rounding drift so the
    /// principal portions sum to the principal exactly.
    pub fn generate(
        principal: Money,
        term_months: u32,
        annual_rate: Rate,
        start_date: DateTime<Utc>,
    ) -> Result<Self> {
        if term_months < 1 {
            return Err(CreditError::InvalidTerm {
                months: term_months,
            });
        }
        if principal.is_negative() {
            return Err(CreditError::InvalidPrincipal { amount: principal });
        }
        if annual_rate.is_negative() {
            return Err(CreditError::InvalidRate { rate: annual_rate });
        }

        let monthly_rate = annual_rate.monthly_rate().as_decimal();
        let monthly_payment = annuity_payment(principal, monthly_rate, term_months);

        let mut installments = Vec::with_capacity(term_months as usize);
        let mut balance = principal;

        for i in 1..=term_months {
            let due_date = add_months(start_date, i);
            let is_last = i == term_months;

            let interest_amount = Money::from_decimal(balance.as_decimal() * monthly_rate);
            let principal_amount = if is_last {
                // absorb rounding drift so principal portions sum exactly
                balance
            } else {
                (monthly_payment - interest_amount)
                    .min(balance)
                    .max(Money::ZERO)
            };
            let total_amount = principal_amount + interest_amount;

            balance = (balance - principal_amount).max(Money::ZERO);

            installments.push(Installment {
                number: i,
                due_date,
                principal_amount,
                interest_amount,
                total_amount,
                status: InstallmentStatus::Pending,
                paid_date: None,
                paid_amount: Money::ZERO,
            });
        }

        let total_interest = installments
            .iter()
            .map(|row| row.interest_amount)
            .fold(Money::ZERO, |acc, x| acc + x);

        Ok(Self {
            principal,
            annual_rate,
            term_months,
            start_date,
            monthly_payment,
            installments,
            total_interest,
        })
    }

    /// get row by installment number
    pub fn installment(&self, number: u32) -> Option<&Installment> {
        self.installments.get(number.checked_sub(1)? as usize)
    }

    /// get mutable row by installment number
    pub fn installment_mut(&mut self, number: u32) -> Result<&mut Installment> {
        number
            .checked_sub(1)
            .and_then(|idx| self.installments.get_mut(idx as usize))
            .ok_or(CreditError::InstallmentNotFound { number })
    }

    /// earliest row not yet settled
    pub fn next_unpaid(&self) -> Option<&Installment> {
        self.installments.iter().find(|row| !row.is_settled())
    }

    /// sum of the unsettled portions still owed across the schedule
    pub fn outstanding_total(&self) -> Money {
        self.installments
            .iter()
            .map(|row| row.outstanding())
            .fold(Money::ZERO, |acc, x| acc + x)
    }

    /// flip past-due pending rows to overdue, day-granular
    pub fn mark_overdue(&mut self, now: DateTime<Utc>) -> u32 {
        let mut flipped = 0;
        for row in &mut self.installments {
            if row.status == InstallmentStatus::Pending
                && crate::dates::days_between(row.due_date, now) >= 1
            {
                row.status = InstallmentStatus::Overdue;
                flipped += 1;
            }
        }
        flipped
    }
}

/// monthly annuity payment, rounded half-up to a whole unit
fn annuity_payment(principal: Money, monthly_rate: Decimal, months: u32) -> Money {
    if monthly_rate.is_zero() {
        return Money::from_decimal(principal.as_decimal() / Decimal::from(months));
    }

    // payment = P * r * (1+r)^n / ((1+r)^n - 1)
    let base = Decimal::ONE + monthly_rate;
    let mut compound = Decimal::ONE;
    for _ in 0..months {
        compound *= base;
    }

    let numerator = principal.as_decimal() * monthly_rate * compound;
    let denominator = compound - Decimal::ONE;

    Money::from_decimal(numerator / denominator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_zero_rate_schedule() {
        let schedule =
            Schedule::generate(Money::from_major(1_200_000), 12, Rate::ZERO, start()).unwrap();

        assert_eq!(schedule.installments.len(), 12);
        assert_eq!(schedule.monthly_payment, Money::from_major(100_000));
        for row in &schedule.installments {
            assert_eq!(row.principal_amount, Money::from_major(100_000));
            assert_eq!(row.interest_amount, Money::ZERO);
            assert_eq!(row.total_amount, Money::from_major(100_000));
            assert_eq!(row.status, InstallmentStatus::Pending);
            assert_eq!(row.paid_amount, Money::ZERO);
        }
        assert_eq!(schedule.total_interest, Money::ZERO);
    }

    #[test]
    fn test_principal_sums_exactly() {
        let cases = [
            (Money::from_major(1_000_000), 10, Rate::from_percentage(24)),
            (Money::from_major(999_999), 7, Rate::from_percentage(18)),
            (Money::from_major(1_200_000), 12, Rate::ZERO),
            (Money::from_major(500_000), 3, Rate::from_percentage(36)),
        ];

        for (principal, term, rate) in cases {
            let schedule = Schedule::generate(principal, term, rate, start()).unwrap();
            let principal_sum = schedule
                .installments
                .iter()
                .map(|row| row.principal_amount)
                .fold(Money::ZERO, |acc, x| acc + x);
            assert_eq!(principal_sum, principal, "drift for term {}", term);
        }
    }

    #[test]
    fn test_annuity_schedule() {
        let principal = Money::from_major(1_000_000);
        let schedule =
            Schedule::generate(principal, 10, Rate::from_percentage(24), start()).unwrap();

        // r = 0.02: payment = 1_000_000 * 0.02 * 1.02^10 / (1.02^10 - 1)
        assert_eq!(schedule.monthly_payment, Money::from_major(111_327));

        for row in &schedule.installments {
            assert_eq!(
                row.principal_amount + row.interest_amount,
                row.total_amount,
                "row {} inconsistent",
                row.number
            );
        }

        // first row interest is one monthly-rate bite of the full principal
        assert_eq!(
            schedule.installments[0].interest_amount,
            Money::from_major(20_000)
        );
    }

    #[test]
    fn test_due_dates_are_month_increments() {
        let schedule =
            Schedule::generate(Money::from_major(300_000), 3, Rate::ZERO, start()).unwrap();

        assert_eq!(
            schedule.installments[0].due_date,
            Utc.with_ymd_and_hms(2024, 2, 15, 0, 0, 0).unwrap()
        );
        assert_eq!(
            schedule.installments[2].due_date,
            Utc.with_ymd_and_hms(2024, 4, 15, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_due_dates_clamp_at_month_end() {
        let jan31 = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap();
        let schedule = Schedule::generate(Money::from_major(300_000), 3, Rate::ZERO, jan31).unwrap();

        assert_eq!(
            schedule.installments[0].due_date,
            Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap()
        );
        assert_eq!(
            schedule.installments[1].due_date,
            Utc.with_ymd_and_hms(2024, 3, 31, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_rejects_zero_term() {
        let result = Schedule::generate(Money::from_major(100_000), 0, Rate::ZERO, start());
        assert!(matches!(result, Err(CreditError::InvalidTerm { months: 0 })));
    }

    #[test]
    fn test_rejects_negative_principal() {
        let result = Schedule::generate(Money::from_major(-1), 12, Rate::ZERO, start());
        assert!(matches!(result, Err(CreditError::InvalidPrincipal { .. })));
    }

    #[test]
    fn test_mark_overdue_is_day_granular() {
        let mut schedule =
            Schedule::generate(Money::from_major(200_000), 2, Rate::ZERO, start()).unwrap();

        // late evening of the due day itself is not overdue
        let due_day_evening = Utc.with_ymd_and_hms(2024, 2, 15, 23, 30, 0).unwrap();
        assert_eq!(schedule.mark_overdue(due_day_evening), 0);

        let next_morning = Utc.with_ymd_and_hms(2024, 2, 16, 0, 30, 0).unwrap();
        assert_eq!(schedule.mark_overdue(next_morning), 1);
        assert_eq!(
            schedule.installments[0].status,
            InstallmentStatus::Overdue
        );
        assert_eq!(
            schedule.installments[1].status,
            InstallmentStatus::Pending
        );
    }
}
