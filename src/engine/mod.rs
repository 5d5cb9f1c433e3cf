//! Core engine: guess submission, settlement, transfers, and standings.
//!
//! `Ledger` owns no record state of its own. Every operation re-reads from
//! the store, mutates, and writes back. Read-modify-write cycles are
//! serialized through a single writer gate so concurrent requests cannot
//! lose updates; reads share the gate.

pub mod session;
pub mod settlement;
pub mod standings;
pub mod transfer;

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::config::RulesConfig;
use crate::storage::RecordStore;
use crate::types::{BalanceRecord, BetmoError, Participant, Roster, WinCountRecord};

pub use session::SubmitGuessCmd;
pub use settlement::{pick_winner, FinalScoreCmd, Settlement};
pub use transfer::{apply_transfer, Transfer, TransferCmd};

pub struct Ledger {
    store: Arc<dyn RecordStore>,
    roster: Roster,
    rules: RulesConfig,
    gate: RwLock<()>,
}

impl Ledger {
    pub fn new(store: Arc<dyn RecordStore>, roster: Roster, rules: RulesConfig) -> Self {
        Self {
            store,
            roster,
            rules,
            gate: RwLock::new(()),
        }
    }

    /// Create the storage root and any missing balance or win-count record.
    /// Existing records are never touched. Returns how many records were
    /// created.
    pub async fn seed_missing_records(&self, initial_balance: i64) -> Result<usize, BetmoError> {
        let _guard = self.gate.write().await;
        let message = "Could not initialize participant records";

        self.store
            .prepare()
            .await
            .map_err(|e| BetmoError::storage(message, e))?;

        let mut created = 0;
        for participant in Participant::ALL {
            let name = self.roster.name(participant);

            match self.store.read_balance(name).await {
                Err(e) if e.is_not_found() => {
                    let record = BalanceRecord { balance: initial_balance };
                    self.store
                        .write_balance(name, record)
                        .await
                        .map_err(|e| BetmoError::storage(message, e))?;
                    info!(user = name, balance = initial_balance, "Seeded balance record");
                    created += 1;
                }
                Err(e) => warn!(user = name, error = %e, "Balance record unreadable, leaving as is"),
                Ok(_) => {}
            }

            match self.store.read_win_count(name).await {
                Err(e) if e.is_not_found() => {
                    self.store
                        .write_win_count(name, WinCountRecord::default())
                        .await
                        .map_err(|e| BetmoError::storage(message, e))?;
                    info!(user = name, "Seeded win-count record");
                    created += 1;
                }
                Err(e) => warn!(user = name, error = %e, "Win-count record unreadable, leaving as is"),
                Ok(_) => {}
            }
        }

        Ok(created)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::storage::FileStore;
    use chrono::NaiveDateTime;
    use std::path::PathBuf;

    pub fn temp_root() -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("betmo_test_ledger_{}", uuid::Uuid::new_v4()));
        p
    }

    pub fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    /// A ledger over a fresh temp directory with the default roster and
    /// the given starting balances.
    pub async fn ledger_with(rules: RulesConfig, first: i64, second: i64) -> (Ledger, Arc<FileStore>) {
        let store = Arc::new(FileStore::new(temp_root()));
        store.prepare().await.unwrap();
        let roster = Roster::default();
        store.write_balance(&roster.first, BalanceRecord { balance: first }).await.unwrap();
        store.write_balance(&roster.second, BalanceRecord { balance: second }).await.unwrap();
        store.write_win_count(&roster.first, WinCountRecord::default()).await.unwrap();
        store.write_win_count(&roster.second, WinCountRecord::default()).await.unwrap();
        let ledger = Ledger::new(store.clone(), roster, rules);
        (ledger, store)
    }

    pub fn cleanup(store: &FileStore) {
        let _ = std::fs::remove_dir_all(store.root());
    }
}
