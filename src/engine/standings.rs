//! Read-only views over both participants' balance and win-count records.

use std::collections::BTreeMap;
use tracing::error;

use super::Ledger;
use crate::storage::StoreError;
use crate::types::{BalanceRecord, BetmoError, Participant, Roster, WinCountRecord};

/// Records keyed by participant name.
pub type Standings<T> = BTreeMap<String, T>;

impl Ledger {
    pub async fn balances(&self) -> Result<Standings<BalanceRecord>, BetmoError> {
        let _guard = self.gate.read().await;
        let first = self.store.read_balance(&self.roster.first).await;
        let second = self.store.read_balance(&self.roster.second).await;
        collect_pair(&self.roster, [first, second], "Could not load current balances", "balances")
    }

    pub async fn total_wins(&self) -> Result<Standings<WinCountRecord>, BetmoError> {
        let _guard = self.gate.read().await;
        let first = self.store.read_win_count(&self.roster.first).await;
        let second = self.store.read_win_count(&self.roster.second).await;
        collect_pair(&self.roster, [first, second], "Could not load current balances", "total wins")
    }
}

/// Load failures win over empty records, so an unreadable file is always
/// reported as a storage fault.
fn collect_pair<T>(
    roster: &Roster,
    results: [Result<T, StoreError>; 2],
    load_message: &str,
    label: &str,
) -> Result<Standings<T>, BetmoError> {
    let mut records = Standings::new();
    let mut empty = None;

    for (participant, result) in Participant::ALL.into_iter().zip(results) {
        let name = roster.name(participant);
        match result {
            Ok(record) => {
                records.insert(name.to_string(), record);
            }
            Err(e) if e.is_empty() => {
                empty.get_or_insert(name);
            }
            Err(e) => {
                error!(user = name, error = %e, "Loading record failed");
                return Err(BetmoError::storage(load_message, e));
            }
        }
    }

    if let Some(name) = empty {
        return Err(BetmoError::Validation(format!("No {name} {label} found")));
    }
    Ok(records)
}
