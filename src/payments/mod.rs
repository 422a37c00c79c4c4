pub mod application;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{CreditError, Result};
use crate::types::{AccountId, PaymentId, PaymentMethod, PaymentType};

pub use application::{
    apply_direct_payment, apply_installment_payment, DirectPaymentSummary, InstallmentApplication,
};

/// immutable payment event; created once, never mutated or deleted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub account_id: AccountId,
    pub amount: Money,
    pub payment_date: DateTime<Utc>,
    pub method: PaymentMethod,
    pub payment_type: PaymentType,
    /// required for `Installment` payments, absent otherwise
    pub installment_number: Option<u32>,
}

impl Payment {
    pub fn new(
        account_id: AccountId,
        amount: Money,
        payment_date: DateTime<Utc>,
        method: PaymentMethod,
        payment_type: PaymentType,
        installment_number: Option<u32>,
    ) -> Result<Self> {
        if !amount.is_positive() {
            return Err(CreditError::InvalidAmount {
                amount,
                remaining: Money::ZERO,
            });
        }
        if payment_type == PaymentType::Installment && installment_number.is_none() {
            return Err(CreditError::MissingInstallmentNumber);
        }

        Ok(Self {
            id: Uuid::new_v4(),
            account_id,
            amount,
            payment_date,
            method,
            payment_type,
            installment_number,
        })
    }

    /// convenience constructor for an installment payment
    pub fn installment(
        account_id: AccountId,
        amount: Money,
        payment_date: DateTime<Utc>,
        method: PaymentMethod,
        installment_number: u32,
    ) -> Result<Self> {
        Self::new(
            account_id,
            amount,
            payment_date,
            method,
            PaymentType::Installment,
            Some(installment_number),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_rejects_non_positive_amount() {
        let date = Utc.with_ymd_and_hms(2024, 2, 10, 0, 0, 0).unwrap();
        let result = Payment::installment(
            Uuid::new_v4(),
            Money::ZERO,
            date,
            PaymentMethod::Cash,
            1,
        );
        assert!(matches!(result, Err(CreditError::InvalidAmount { .. })));
    }

    #[test]
    fn test_installment_type_requires_number() {
        let date = Utc.with_ymd_and_hms(2024, 2, 10, 0, 0, 0).unwrap();
        let result = Payment::new(
            Uuid::new_v4(),
            Money::from_major(50_000),
            date,
            PaymentMethod::Card,
            PaymentType::Installment,
            None,
        );
        assert!(matches!(
            result,
            Err(CreditError::MissingInstallmentNumber)
        ));
    }
}
