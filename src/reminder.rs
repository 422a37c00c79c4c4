use hourglass_rs::SafeTimeProvider;
use tracing::{info, warn};

use crate::classifier::{classify, Classification};
use crate::decimal::Money;
use crate::errors::Result;
use crate::state::AccountState;
use crate::store::{AccountFilter, AccountStore};
use crate::types::{AccountId, DueBucket};

/// what a notification channel needs to know about an account
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderPayload {
    pub account_id: AccountId,
    pub customer_id: String,
    pub monthly_payment: Money,
    pub remaining_amount: Money,
}

impl From<&AccountState> for ReminderPayload {
    fn from(state: &AccountState) -> Self {
        Self {
            account_id: state.account_id,
            customer_id: state.customer_id.clone(),
            monthly_payment: state.monthly_payment,
            remaining_amount: state.remaining_amount,
        }
    }
}

/// notification collaborator boundary; delivery is fire-and-forget,
/// a false return is logged and never retried by the core
pub trait Notifier {
    fn notify(&self, payload: &ReminderPayload, bucket: DueBucket) -> bool;
}

/// per-sweep dispatch counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SweepReport {
    pub classified: usize,
    pub sent: usize,
    pub failed: usize,
}

/// periodic reminder sweep, driven by an external scheduler
///
/// reads active accounts, classifies them by urgency, and hands each
/// bucket entry to the notifier. re-running with unchanged accounts
/// yields the same classification; deduplication of resent reminders
/// belongs to the notification collaborator.
pub struct ReminderSweep<'a, S, N> {
    store: &'a S,
    notifier: &'a N,
    time: &'a SafeTimeProvider,
}

impl<'a, S, N> ReminderSweep<'a, S, N>
where
    S: AccountStore,
    N: Notifier,
{
    pub fn new(store: &'a S, notifier: &'a N, time: &'a SafeTimeProvider) -> Self {
        Self {
            store,
            notifier,
            time,
        }
    }

    /// run one sweep; read-only against the store
    pub fn run(&self) -> Result<SweepReport> {
        let accounts = self.store.list_accounts(AccountFilter::active())?;
        let classification = classify(&accounts, self.time.now());
        let report = self.dispatch(&accounts, &classification);

        info!(
            classified = report.classified,
            sent = report.sent,
            failed = report.failed,
            "reminder sweep finished"
        );
        Ok(report)
    }

    fn dispatch(&self, accounts: &[AccountState], classification: &Classification) -> SweepReport {
        let mut report = SweepReport {
            classified: classification.total(),
            ..SweepReport::default()
        };

        for (account_id, bucket) in classification.entries() {
            let Some(state) = accounts.iter().find(|a| a.account_id == account_id) else {
                continue;
            };
            let payload = ReminderPayload::from(state);
            if self.notifier.notify(&payload, bucket) {
                report.sent += 1;
            } else {
                warn!(account = %account_id, bucket = ?bucket, "reminder delivery failed");
                report.failed += 1;
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::Account;
    use crate::config::AccountTerms;
    use crate::store::MemoryStore;
    use chrono::{DateTime, TimeZone, Utc};
    use hourglass_rs::TimeSource;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingNotifier {
        delivered: Mutex<Vec<(AccountId, DueBucket)>>,
        fail: bool,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, payload: &ReminderPayload, bucket: DueBucket) -> bool {
            if self.fail {
                return false;
            }
            self.delivered
                .lock()
                .unwrap()
                .push((payload.account_id, bucket));
            true
        }
    }

    fn date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn open_with_start(store: &MemoryStore, start: DateTime<Utc>) -> AccountId {
        let time = SafeTimeProvider::new(TimeSource::Test(start));
        let terms = AccountTerms::interest_free(
            Money::from_major(1_200_000),
            Money::ZERO,
            12,
            start,
        );
        let mut account = Account::open("customer".to_string(), terms, &time).unwrap();
        store.insert(&mut account).unwrap();
        account.id
    }

    #[test]
    fn test_sweep_notifies_due_accounts() {
        let store = MemoryStore::new();
        // first due dates: feb 10 and feb 7
        let due_today = open_with_start(&store, date(2024, 1, 10));
        let overdue = open_with_start(&store, date(2024, 1, 7));

        let now = SafeTimeProvider::new(TimeSource::Test(date(2024, 2, 10)));
        let notifier = RecordingNotifier::default();
        let report = ReminderSweep::new(&store, &notifier, &now).run().unwrap();

        assert_eq!(report.classified, 2);
        assert_eq!(report.sent, 2);
        assert_eq!(report.failed, 0);

        let delivered = notifier.delivered.lock().unwrap();
        assert!(delivered.contains(&(due_today, DueBucket::DueToday)));
        assert!(delivered.contains(&(overdue, DueBucket::Overdue3PlusDays)));
    }

    #[test]
    fn test_failed_delivery_is_counted_not_retried() {
        let store = MemoryStore::new();
        open_with_start(&store, date(2024, 1, 10));

        let now = SafeTimeProvider::new(TimeSource::Test(date(2024, 2, 10)));
        let notifier = RecordingNotifier {
            fail: true,
            ..RecordingNotifier::default()
        };
        let report = ReminderSweep::new(&store, &notifier, &now).run().unwrap();

        assert_eq!(report.sent, 0);
        assert_eq!(report.failed, 1);
    }

    #[test]
    fn test_sweep_is_idempotent() {
        let store = MemoryStore::new();
        open_with_start(&store, date(2024, 1, 10));

        let now = SafeTimeProvider::new(TimeSource::Test(date(2024, 2, 10)));
        let notifier = RecordingNotifier::default();
        let sweep = ReminderSweep::new(&store, &notifier, &now);

        let first = sweep.run().unwrap();
        let second = sweep.run().unwrap();
        assert_eq!(first, second);
    }
}
