use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dates::days_between;
use crate::state::AccountState;
use crate::types::{AccountId, DueBucket};

/// result of one classification sweep
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Classification {
    pub due_today: Vec<AccountId>,
    pub due_in_2_days: Vec<AccountId>,
    pub overdue_1_day: Vec<AccountId>,
    pub overdue_3_plus_days: Vec<AccountId>,
}

impl Classification {
    pub fn is_empty(&self) -> bool {
        self.due_today.is_empty()
            && self.due_in_2_days.is_empty()
            && self.overdue_1_day.is_empty()
            && self.overdue_3_plus_days.is_empty()
    }

    pub fn total(&self) -> usize {
        self.due_today.len()
            + self.due_in_2_days.len()
            + self.overdue_1_day.len()
            + self.overdue_3_plus_days.len()
    }

    /// iterate (account, bucket) pairs in bucket order
    pub fn entries(&self) -> impl Iterator<Item = (AccountId, DueBucket)> + '_ {
        let buckets = [
            (&self.due_today, DueBucket::DueToday),
            (&self.due_in_2_days, DueBucket::DueIn2Days),
            (&self.overdue_1_day, DueBucket::Overdue1Day),
            (&self.overdue_3_plus_days, DueBucket::Overdue3PlusDays),
        ];
        buckets
            .into_iter()
            .flat_map(|(ids, bucket)| ids.iter().map(move |id| (*id, bucket)))
    }
}

/// bucket a single account by payment urgency, day-granular
///
/// both timestamps are truncated to midnight before differencing so the
/// time of day of either side never shifts the bucket. accounts due
/// tomorrow, due more than 2 days out, completed, or without a next
/// payment date fall in no bucket.
pub fn bucket_for(state: &AccountState, now: DateTime<Utc>) -> Option<DueBucket> {
    if !state.is_active() {
        return None;
    }
    let due = state.next_payment_date?;

    match days_between(due, now) {
        0 => Some(DueBucket::DueToday),
        -2 => Some(DueBucket::DueIn2Days),
        1..=2 => Some(DueBucket::Overdue1Day),
        d if d >= 3 => Some(DueBucket::Overdue3PlusDays),
        _ => None,
    }
}

/// partition accounts into reminder buckets; pure and idempotent
pub fn classify<'a, I>(accounts: I, now: DateTime<Utc>) -> Classification
where
    I: IntoIterator<Item = &'a AccountState>,
{
    let mut result = Classification::default();

    for state in accounts {
        match bucket_for(state, now) {
            Some(DueBucket::DueToday) => result.due_today.push(state.account_id),
            Some(DueBucket::DueIn2Days) => result.due_in_2_days.push(state.account_id),
            Some(DueBucket::Overdue1Day) => result.overdue_1_day.push(state.account_id),
            Some(DueBucket::Overdue3PlusDays) => {
                result.overdue_3_plus_days.push(state.account_id)
            }
            None => {}
        }
    }

    result
}
