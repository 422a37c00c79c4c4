use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::account::Account;
use crate::config::AccountTerms;
use crate::errors::{CreditError, Result};
use crate::events::EventStore;
use crate::schedule::Schedule;
use crate::state::AccountState;
use crate::types::{AccountId, AccountStatus};

/// serializable account document, the unit the store reads and writes
/// as a whole; events are per-operation and never persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountDocument {
    pub terms: AccountTerms,
    pub state: AccountState,
    pub schedule: Option<Schedule>,
}

impl From<&Account> for AccountDocument {
    fn from(account: &Account) -> Self {
        Self {
            terms: account.terms.clone(),
            state: account.state.clone(),
            schedule: account.schedule.clone(),
        }
    }
}

impl AccountDocument {
    pub fn into_account(self) -> Account {
        Account {
            id: self.state.account_id,
            terms: self.terms,
            state: self.state,
            schedule: self.schedule,
            events: EventStore::new(),
        }
    }
}

/// filter for account listing
#[derive(Debug, Clone, Copy, Default)]
pub struct AccountFilter {
    pub status: Option<AccountStatus>,
}

impl AccountFilter {
    pub fn active() -> Self {
        Self {
            status: Some(AccountStatus::Active),
        }
    }

    fn matches(&self, state: &AccountState) -> bool {
        self.status.map_or(true, |status| state.status == status)
    }
}

/// persistence collaborator boundary
///
/// save_account must uphold the single-writer-per-account discipline:
/// the write succeeds only when nobody else saved the account since it
/// was loaded, otherwise it fails with a retryable VersionConflict
pub trait AccountStore {
    fn load_account(&self, id: AccountId) -> Result<Account>;
    fn save_account(&self, account: &mut Account) -> Result<()>;
    fn list_accounts(&self, filter: AccountFilter) -> Result<Vec<AccountState>>;
}

/// in-memory document store with compare-and-swap on the revision field
///
/// accounts live as json documents keyed by id, mirroring how a real
/// document store would hold them; enough to exercise the concurrency
/// contract in tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RwLock<HashMap<AccountId, (u64, serde_json::Value)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, account: &mut Account) -> Result<()> {
        self.save_account(account)
    }
}

impl AccountStore for MemoryStore {
    fn load_account(&self, id: AccountId) -> Result<Account> {
        let documents = self.documents.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        let (_, value) = documents
            .get(&id)
            .ok_or(CreditError::AccountNotFound { id })?;
        let document: AccountDocument = serde_json::from_value(value.clone())?;
        Ok(document.into_account())
    }

    fn save_account(&self, account: &mut Account) -> Result<()> {
        let mut documents = self.documents.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        let id = account.id;

        if let Some((stored_revision, _)) = documents.get(&id) {
            if *stored_revision != account.state.revision {
                warn!(
                    account = %id,
                    expected = account.state.revision,
                    found = stored_revision,
                    "stale write rejected"
                );
                return Err(CreditError::VersionConflict {
                    account_id: id,
                    expected: account.state.revision,
                    found: *stored_revision,
                });
            }
        }

        account.state.revision += 1;
        let value = serde_json::to_value(AccountDocument::from(&*account))?;
        documents.insert(id, (account.state.revision, value));
        debug!(account = %id, revision = account.state.revision, "account saved");
        Ok(())
    }

    fn list_accounts(&self, filter: AccountFilter) -> Result<Vec<AccountState>> {
        let documents = self.documents.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut states = Vec::new();
        for (_, value) in documents.values() {
            let document: AccountDocument = serde_json::from_value(value.clone())?;
            if filter.matches(&document.state) {
                states.push(document.state);
            }
        }
        Ok(states)
    }
}

/// run a read-modify-write against an account, retrying the whole cycle
/// on version conflict up to `max_attempts` times
pub fn with_cas_retry<S, F, T>(
    store: &S,
    id: AccountId,
    max_attempts: u32,
    mut operation: F,
) -> Result<T>
where
    S: AccountStore,
    F: FnMut(&mut Account) -> Result<T>,
{
    let mut last_error = None;
    for attempt in 0..max_attempts {
        let mut account = store.load_account(id)?;
        let outcome = operation(&mut account)?;
        match store.save_account(&mut account) {
            Ok(()) => return Ok(outcome),
            Err(err) if err.is_retryable() => {
                debug!(account = %id, attempt, "retrying after version conflict");
                last_error = Some(err);
            }
            Err(err) => return Err(err),
        }
    }
    Err(last_error.unwrap_or(CreditError::AccountNotFound { id }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Money;
    use chrono::{TimeZone, Utc};
    use hourglass_rs::{SafeTimeProvider, TimeSource};

    fn open_account(store: &MemoryStore) -> AccountId {
        let start = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        let time = SafeTimeProvider::new(TimeSource::Test(start));
        let terms = AccountTerms::direct_balance(
            Money::from_major(1_000_000),
            Money::ZERO,
            10,
            start,
        );
        let mut account = Account::open("customer-1".to_string(), terms, &time).unwrap();
        store.insert(&mut account).unwrap();
        account.id
    }

    #[test]
    fn test_load_round_trips_document() {
        let store = MemoryStore::new();
        let id = open_account(&store);

        let account = store.load_account(id).unwrap();
        assert_eq!(account.state.remaining_amount, Money::from_major(1_000_000));
        assert_eq!(account.state.revision, 1);
        assert!(account.events.events().is_empty());
    }

    #[test]
    fn test_missing_account() {
        let store = MemoryStore::new();
        let result = store.load_account(uuid::Uuid::new_v4());
        assert!(matches!(result, Err(CreditError::AccountNotFound { .. })));
    }

    #[test]
    fn test_stale_write_raises_conflict() {
        let store = MemoryStore::new();
        let id = open_account(&store);
        let paid_at = Utc.with_ymd_and_hms(2024, 2, 10, 0, 0, 0).unwrap();

        // two writers load the same revision
        let mut first = store.load_account(id).unwrap();
        let mut second = store.load_account(id).unwrap();

        first.pay_direct(Money::from_major(100_000), paid_at).unwrap();
        store.save_account(&mut first).unwrap();

        second.pay_direct(Money::from_major(50_000), paid_at).unwrap();
        let result = store.save_account(&mut second);
        assert!(matches!(result, Err(CreditError::VersionConflict { .. })));

        // the first write survives untouched
        let current = store.load_account(id).unwrap();
        assert_eq!(current.state.remaining_amount, Money::from_major(900_000));
    }

    #[test]
    fn test_cas_retry_reapplies_operation() {
        let store = MemoryStore::new();
        let id = open_account(&store);
        let paid_at = Utc.with_ymd_and_hms(2024, 2, 10, 0, 0, 0).unwrap();

        // stale competitor commits between load and save on the first pass
        let mut competitor = store.load_account(id).unwrap();
        let mut first_pass = true;
        let summary = with_cas_retry(&store, id, 3, |account| {
            if first_pass {
                first_pass = false;
                competitor
                    .pay_direct(Money::from_major(100_000), paid_at)
                    .unwrap();
                store.save_account(&mut competitor).unwrap();
            }
            account.pay_direct(Money::from_major(200_000), paid_at)
        })
        .unwrap();

        // both payments landed
        assert_eq!(summary.remaining_amount, Money::from_major(700_000));
        let current = store.load_account(id).unwrap();
        assert_eq!(current.state.remaining_amount, Money::from_major(700_000));
    }

    #[test]
    fn test_list_filters_by_status() {
        let store = MemoryStore::new();
        let id = open_account(&store);
        let other = open_account(&store);
        let paid_at = Utc.with_ymd_and_hms(2024, 2, 10, 0, 0, 0).unwrap();

        let mut account = store.load_account(id).unwrap();
        account
            .pay_direct(Money::from_major(1_000_000), paid_at)
            .unwrap();
        store.save_account(&mut account).unwrap();

        let active = store.list_accounts(AccountFilter::active()).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].account_id, other);

        let all = store.list_accounts(AccountFilter::default()).unwrap();
        assert_eq!(all.len(), 2);
    }
}
