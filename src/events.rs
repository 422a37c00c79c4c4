use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{AccountId, DueBucket, PaymentId, PaymentType};

/// all events emitted by account operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    AccountOpened {
        account_id: AccountId,
        principal: Money,
        term_months: u32,
        timestamp: DateTime<Utc>,
    },
    ScheduleGenerated {
        account_id: AccountId,
        installments: u32,
        monthly_payment: Money,
        first_due_date: DateTime<Utc>,
    },
    PaymentReceived {
        account_id: AccountId,
        payment_id: PaymentId,
        amount: Money,
        payment_type: PaymentType,
        timestamp: DateTime<Utc>,
    },
    InstallmentSettled {
        account_id: AccountId,
        installment_number: u32,
        paid_amount: Money,
        timestamp: DateTime<Utc>,
    },
    OverpaymentRolled {
        account_id: AccountId,
        from_installment: u32,
        amount: Money,
        timestamp: DateTime<Utc>,
    },
    PenaltyAssessed {
        account_id: AccountId,
        amount: Money,
        days_late: u32,
        timestamp: DateTime<Utc>,
    },
    AccountCompleted {
        account_id: AccountId,
        total_paid: Money,
        timestamp: DateTime<Utc>,
    },
    ReminderQueued {
        account_id: AccountId,
        bucket: DueBucket,
        timestamp: DateTime<Utc>,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default, Clone)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
