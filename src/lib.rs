pub mod account;
pub mod classifier;
pub mod config;
pub mod dates;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod payments;
pub mod penalty;
pub mod reminder;
pub mod schedule;
pub mod state;
pub mod store;
pub mod types;

// re-export key types
pub use account::Account;
pub use classifier::{bucket_for, classify, Classification};
pub use config::AccountTerms;
pub use decimal::{Money, Rate};
pub use errors::{CreditError, Result};
pub use events::{Event, EventStore};
pub use payments::{
    apply_direct_payment, apply_installment_payment, DirectPaymentSummary, Payment,
};
pub use penalty::{compute_penalty, PenaltyCalculation, PenaltyConfig};
pub use reminder::{Notifier, ReminderPayload, ReminderSweep, SweepReport};
pub use schedule::{Installment, Schedule};
pub use state::AccountState;
pub use store::{with_cas_retry, AccountFilter, AccountStore, MemoryStore};
pub use types::{
    AccountId, AccountStatus, DueBucket, InstallmentStatus, OverpaymentPolicy, PaymentDiscipline,
    PaymentId, PaymentMethod, PaymentType,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
