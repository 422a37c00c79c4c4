use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{CreditError, Result};
use crate::types::{OverpaymentPolicy, PaymentDiscipline};

/// default late-payment penalty: 0.1% of the monthly payment per day late
pub const DEFAULT_PENALTY_RATE_PER_DAY: Decimal = dec!(0.001);

/// terms fixed at account opening
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountTerms {
    /// full selling price of the goods
    pub selling_price: Money,
    /// paid up front; principal = selling_price - down_payment
    pub down_payment: Money,
    pub term_months: u32,
    /// 0 = interest-free
    pub annual_rate: Rate,
    pub start_date: DateTime<Utc>,
    pub discipline: PaymentDiscipline,
    pub overpayment_policy: OverpaymentPolicy,
    /// per-day penalty rate; falls back to the default when unset
    pub penalty_rate_per_day: Option<Decimal>,
}

impl AccountTerms {
    /// interest-free retail terms on a fixed schedule
    pub fn interest_free(
        selling_price: Money,
        down_payment: Money,
        term_months: u32,
        start_date: DateTime<Utc>,
    ) -> Self {
        Self {
            selling_price,
            down_payment,
            term_months,
            annual_rate: Rate::ZERO,
            start_date,
            discipline: PaymentDiscipline::FixedSchedule,
            overpayment_policy: OverpaymentPolicy::default(),
            penalty_rate_per_day: None,
        }
    }

    /// financed terms at an annual rate on a fixed schedule
    pub fn financed(
        selling_price: Money,
        down_payment: Money,
        term_months: u32,
        annual_rate: Rate,
        start_date: DateTime<Utc>,
    ) -> Self {
        Self {
            annual_rate,
            ..Self::interest_free(selling_price, down_payment, term_months, start_date)
        }
    }

    /// direct-balance terms: no row mutation, the average monthly payment
    /// is re-derived after every payment
    pub fn direct_balance(
        selling_price: Money,
        down_payment: Money,
        term_months: u32,
        start_date: DateTime<Utc>,
    ) -> Self {
        Self {
            discipline: PaymentDiscipline::DirectBalance,
            ..Self::interest_free(selling_price, down_payment, term_months, start_date)
        }
    }

    /// amount financed
    pub fn principal(&self) -> Money {
        self.selling_price - self.down_payment
    }

    /// effective per-day penalty rate
    pub fn penalty_rate(&self) -> Decimal {
        self.penalty_rate_per_day
            .unwrap_or(DEFAULT_PENALTY_RATE_PER_DAY)
    }

    pub fn validate(&self) -> Result<()> {
        if self.term_months < 1 {
            return Err(CreditError::InvalidTerm {
                months: self.term_months,
            });
        }
        if self.selling_price.is_negative() || self.principal().is_negative() {
            return Err(CreditError::InvalidPrincipal {
                amount: self.principal(),
            });
        }
        if self.down_payment.is_negative() {
            return Err(CreditError::InvalidConfiguration {
                message: format!("down payment must be >= 0, got {}", self.down_payment),
            });
        }
        if self.annual_rate.is_negative() {
            return Err(CreditError::InvalidRate {
                rate: self.annual_rate,
            });
        }
        Ok(())
    }
}
