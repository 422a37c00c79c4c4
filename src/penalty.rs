use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::config::DEFAULT_PENALTY_RATE_PER_DAY;
use crate::dates::days_late;
use crate::decimal::Money;

/// late-payment penalty configuration
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PenaltyConfig {
    /// fraction of the monthly payment charged per day late
    pub rate_per_day: Decimal,
}

impl Default for PenaltyConfig {
    fn default() -> Self {
        Self {
            rate_per_day: DEFAULT_PENALTY_RATE_PER_DAY,
        }
    }
}

impl PenaltyConfig {
    pub fn new(rate_per_day: Decimal) -> Self {
        Self { rate_per_day }
    }
}

/// penalty calculation result
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PenaltyCalculation {
    pub amount: Money,
    pub days_late: u32,
    pub monthly_payment: Money,
}

/// compute the late-payment penalty for a payment against a due date
///
/// zero when paid on or before the due date; otherwise the monthly
/// payment times the per-day rate times whole days late, rounded
/// half-up to a whole unit
pub fn compute_penalty(
    due_date: DateTime<Utc>,
    payment_date: DateTime<Utc>,
    monthly_payment: Money,
    config: &PenaltyConfig,
) -> PenaltyCalculation {
    let days = days_late(due_date, payment_date);
    if days == 0 {
        return PenaltyCalculation {
            amount: Money::ZERO,
            days_late: 0,
            monthly_payment,
        };
    }

    let amount = Money::from_decimal(
        monthly_payment.as_decimal() * config.rate_per_day * Decimal::from(days),
    );

    PenaltyCalculation {
        amount,
        days_late: days,
        monthly_payment,
    }
}
