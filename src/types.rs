use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// unique identifier for an account
pub type AccountId = Uuid;

/// unique identifier for a payment event
pub type PaymentId = Uuid;

/// account status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountStatus {
    /// balance outstanding, payments expected
    Active,
    /// fully paid off
    Completed,
}

/// status of a single schedule row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstallmentStatus {
    Pending,
    Paid,
    Overdue,
}

/// payment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentType {
    DownPayment,
    Installment,
    Penalty,
    EarlyPayment,
}

/// payment method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
}

/// how payments are applied over the life of an account, fixed at opening
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentDiscipline {
    /// fixed schedule generated once; payments settle individual rows
    FixedSchedule,
    /// no row mutation; balance decremented and the average monthly
    /// payment re-derived over the remaining nominal term
    DirectBalance,
}

/// what happens when an installment payment exceeds the row total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OverpaymentPolicy {
    /// excess stays recorded against the paid row
    #[default]
    KeepOnInstallment,
    /// excess cascades into the following pending rows
    RollToNext,
}

/// payment-urgency bucket used to drive reminder dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DueBucket {
    DueToday,
    DueIn2Days,
    Overdue1Day,
    Overdue3PlusDays,
}
