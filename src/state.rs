use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{AccountId, AccountStatus};

/// mutable balance state of an account
///
/// invariants held between operations:
/// remaining_amount + total_paid == principal,
/// status == Completed iff remaining_amount == 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountState {
    pub account_id: AccountId,
    pub customer_id: String,

    // core balances
    pub principal: Money,
    pub remaining_amount: Money,
    pub total_paid: Money,

    // payment tracking
    pub paid_installments: u32,
    pub monthly_payment: Money,
    pub next_payment_date: Option<DateTime<Utc>>,
    pub last_payment_amount: Option<Money>,
    pub last_payment_date: Option<DateTime<Utc>>,
    pub total_penalties_assessed: Money,

    // dates
    pub opened_date: DateTime<Utc>,
    pub completed_date: Option<DateTime<Utc>>,

    pub status: AccountStatus,

    /// bumped on every successful save; the store compares it on write
    pub revision: u64,
}

impl AccountState {
    pub fn new(
        account_id: AccountId,
        customer_id: String,
        principal: Money,
        monthly_payment: Money,
        opened_date: DateTime<Utc>,
        first_payment_date: DateTime<Utc>,
    ) -> Self {
        Self {
            account_id,
            customer_id,
            principal,
            remaining_amount: principal,
            total_paid: Money::ZERO,
            paid_installments: 0,
            monthly_payment,
            next_payment_date: Some(first_payment_date),
            last_payment_amount: None,
            last_payment_date: None,
            total_penalties_assessed: Money::ZERO,
            opened_date,
            completed_date: None,
            status: AccountStatus::Active,
            revision: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }

    /// record a payment against the aggregate balances
    pub fn record_payment(&mut self, amount: Money, timestamp: DateTime<Utc>) {
        self.remaining_amount = (self.remaining_amount - amount).max(Money::ZERO);
        self.total_paid += amount;
        self.last_payment_amount = Some(amount);
        self.last_payment_date = Some(timestamp);

        if self.remaining_amount.is_zero() {
            self.status = AccountStatus::Completed;
            self.next_payment_date = None;
            self.completed_date = Some(timestamp);
        }
    }

    /// check the balance invariant
    pub fn balances_consistent(&self) -> bool {
        self.remaining_amount + self.total_paid == self.principal
            && (self.status == AccountStatus::Completed) == self.remaining_amount.is_zero()
    }
}
