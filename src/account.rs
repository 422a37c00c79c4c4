use chrono::{DateTime, Utc};
use hourglass_rs::SafeTimeProvider;
use tracing::info;
use uuid::Uuid;

use crate::config::AccountTerms;
use crate::dates::add_months;
use crate::decimal::Money;
use crate::errors::{CreditError, Result};
use crate::events::{Event, EventStore};
use crate::payments::{
    apply_direct_payment, apply_installment_payment, DirectPaymentSummary, InstallmentApplication,
    Payment,
};
use crate::penalty::{compute_penalty, PenaltyCalculation, PenaltyConfig};
use crate::schedule::Schedule;
use crate::state::AccountState;
use crate::types::{AccountId, PaymentDiscipline};

/// an installment-credit account: terms fixed at opening, mutable
/// balance state, and the schedule for fixed-schedule accounts
pub struct Account {
    pub id: AccountId,
    pub terms: AccountTerms,
    pub state: AccountState,
    pub schedule: Option<Schedule>,
    pub events: EventStore,
}

impl Account {
    /// open an account; the schedule is generated here, exactly once,
    /// and never regenerated by any later operation
    pub fn open(
        customer_id: String,
        terms: AccountTerms,
        time_provider: &SafeTimeProvider,
    ) -> Result<Self> {
        terms.validate()?;

        let account_id = Uuid::new_v4();
        let now = time_provider.now();
        let principal = terms.principal();
        let first_due = add_months(terms.start_date, 1);

        let (schedule, total_payable, monthly_payment) = match terms.discipline {
            PaymentDiscipline::FixedSchedule => {
                let schedule = Schedule::generate(
                    principal,
                    terms.term_months,
                    terms.annual_rate,
                    terms.start_date,
                )?;
                let total_payable = principal + schedule.total_interest;
                let monthly_payment = schedule.monthly_payment;
                (Some(schedule), total_payable, monthly_payment)
            }
            PaymentDiscipline::DirectBalance => {
                (None, principal, principal.div_ceil(terms.term_months))
            }
        };

        let state = AccountState::new(
            account_id,
            customer_id,
            total_payable,
            monthly_payment,
            now,
            first_due,
        );

        let mut events = EventStore::new();
        events.emit(Event::AccountOpened {
            account_id,
            principal,
            term_months: terms.term_months,
            timestamp: now,
        });
        if let Some(schedule) = &schedule {
            events.emit(Event::ScheduleGenerated {
                account_id,
                installments: schedule.term_months,
                monthly_payment: schedule.monthly_payment,
                first_due_date: first_due,
            });
        }

        info!(
            account = %account_id,
            principal = %principal,
            term = terms.term_months,
            discipline = ?terms.discipline,
            "account opened"
        );

        Ok(Self {
            id: account_id,
            terms,
            state,
            schedule,
            events,
        })
    }

    /// apply an installment payment against the schedule
    ///
    /// fixed-schedule accounts only; the aggregate balances and the
    /// next payment date stay in step with the mutated rows
    pub fn pay_installment(&mut self, payment: &Payment) -> Result<InstallmentApplication> {
        self.require_discipline(PaymentDiscipline::FixedSchedule)?;
        self.require_active()?;

        let schedule = self
            .schedule
            .as_mut()
            .ok_or_else(|| CreditError::InvalidConfiguration {
                message: "fixed-schedule account has no schedule".to_string(),
            })?;

        let application =
            apply_installment_payment(schedule, payment, self.terms.overpayment_policy)?;

        self.state
            .record_payment(application.applied, payment.payment_date);
        self.state.paid_installments = schedule
            .installments
            .iter()
            .filter(|row| row.is_settled())
            .count() as u32;
        if self.state.is_active() {
            self.state.next_payment_date = schedule.next_unpaid().map(|row| row.due_date);
        }

        self.events.emit(Event::PaymentReceived {
            account_id: self.id,
            payment_id: payment.id,
            amount: payment.amount,
            payment_type: payment.payment_type,
            timestamp: payment.payment_date,
        });
        for &number in &application.rows_touched {
            if let Some(row) = schedule_row(self.schedule.as_ref(), number) {
                if row.is_settled() {
                    self.events.emit(Event::InstallmentSettled {
                        account_id: self.id,
                        installment_number: number,
                        paid_amount: row.paid_amount,
                        timestamp: payment.payment_date,
                    });
                }
            }
        }
        if application.rows_touched.len() > 1 {
            self.events.emit(Event::OverpaymentRolled {
                account_id: self.id,
                from_installment: application.rows_touched[0],
                amount: payment.amount,
                timestamp: payment.payment_date,
            });
        }
        self.emit_if_completed(payment.payment_date);

        Ok(application)
    }

    /// apply a payment directly against the balance
    ///
    /// direct-balance accounts only; re-derives the average monthly
    /// payment over the months left of the nominal term
    pub fn pay_direct(
        &mut self,
        amount: Money,
        payment_date: DateTime<Utc>,
    ) -> Result<DirectPaymentSummary> {
        self.require_discipline(PaymentDiscipline::DirectBalance)?;

        let summary =
            apply_direct_payment(&mut self.state, self.terms.term_months, amount, payment_date)?;

        // a payoff ahead of the nominal term is an early payment
        let payment_type = if summary.remaining_amount.is_zero() && summary.remaining_months > 0 {
            crate::types::PaymentType::EarlyPayment
        } else {
            crate::types::PaymentType::Installment
        };
        self.events.emit(Event::PaymentReceived {
            account_id: self.id,
            payment_id: Uuid::new_v4(),
            amount,
            payment_type,
            timestamp: payment_date,
        });
        self.emit_if_completed(payment_date);

        Ok(summary)
    }

    /// assess the late-payment penalty for a payment made on the given
    /// date against the current due date; assessment only, the balance
    /// is untouched
    pub fn assess_penalty(&mut self, payment_date: DateTime<Utc>) -> Result<PenaltyCalculation> {
        self.require_active()?;

        let due_date = self
            .state
            .next_payment_date
            .ok_or_else(|| CreditError::InvalidConfiguration {
                message: "no next payment date to assess against".to_string(),
            })?;

        let config = PenaltyConfig::new(self.terms.penalty_rate());
        let calculation =
            compute_penalty(due_date, payment_date, self.state.monthly_payment, &config);

        if calculation.amount.is_positive() {
            self.state.total_penalties_assessed += calculation.amount;
            self.events.emit(Event::PenaltyAssessed {
                account_id: self.id,
                amount: calculation.amount,
                days_late: calculation.days_late,
                timestamp: payment_date,
            });
        }

        Ok(calculation)
    }

    /// flip past-due pending rows to overdue; returns how many flipped
    pub fn mark_overdue_rows(&mut self, now: DateTime<Utc>) -> u32 {
        match self.schedule.as_mut() {
            Some(schedule) => schedule.mark_overdue(now),
            None => 0,
        }
    }

    /// drain accumulated events
    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.take_events()
    }

    fn require_discipline(&self, required: PaymentDiscipline) -> Result<()> {
        if self.terms.discipline != required {
            return Err(CreditError::DisciplineMismatch {
                expected: self.terms.discipline,
                actual: required,
            });
        }
        Ok(())
    }

    fn require_active(&self) -> Result<()> {
        if !self.state.is_active() {
            return Err(CreditError::AccountNotActive {
                status: self.state.status,
            });
        }
        Ok(())
    }

    fn emit_if_completed(&mut self, timestamp: DateTime<Utc>) {
        if !self.state.is_active() && self.state.completed_date == Some(timestamp) {
            self.events.emit(Event::AccountCompleted {
                account_id: self.id,
                total_paid: self.state.total_paid,
                timestamp,
            });
        }
    }
}

fn schedule_row(schedule: Option<&Schedule>, number: u32) -> Option<&crate::schedule::Installment> {
    schedule.and_then(|s| s.installment(number))
}
