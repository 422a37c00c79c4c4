use thiserror::Error;

use crate::decimal::{Money, Rate};
use crate::types::{AccountId, AccountStatus, PaymentDiscipline};

#[derive(Error, Debug)]
pub enum CreditError {
    #[error("invalid payment amount: {amount} (remaining balance {remaining})")]
    InvalidAmount { amount: Money, remaining: Money },

    #[error("installment not found: {number}")]
    InstallmentNotFound { number: u32 },

    #[error("invalid term: {months} months")]
    InvalidTerm { months: u32 },

    #[error("invalid principal: {amount}")]
    InvalidPrincipal { amount: Money },

    #[error("invalid interest rate: {rate}")]
    InvalidRate { rate: Rate },

    #[error("account not active: current status is {status:?}")]
    AccountNotActive { status: AccountStatus },

    #[error("payment discipline mismatch: account uses {expected:?}, operation requires {actual:?}")]
    DisciplineMismatch {
        expected: PaymentDiscipline,
        actual: PaymentDiscipline,
    },

    #[error("installment payment requires an installment number")]
    MissingInstallmentNumber,

    #[error("account not found: {id}")]
    AccountNotFound { id: AccountId },

    #[error("version conflict on account {account_id}: expected revision {expected}, found {found}")]
    VersionConflict {
        account_id: AccountId,
        expected: u64,
        found: u64,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CreditError {
    /// conflicts are the one retryable kind: re-run the whole
    /// read-modify-write against a fresh load
    pub fn is_retryable(&self) -> bool {
        matches!(self, CreditError::VersionConflict { .. })
    }
}

pub type Result<T> = std::result::Result<T, CreditError>;
