//! Settlement: compare both guesses to the final score and credit the winner.

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, info};

use super::Ledger;
use crate::types::{
    parse_numeric, BalanceRecord, BetmoError, GuessSession, Participant, WinCountRecord,
};

/// Body of a final score submission: `{"final_score": ...}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FinalScoreCmd {
    pub final_score: Option<Value>,
}

impl FinalScoreCmd {
    pub fn new(final_score: Value) -> Self {
        Self {
            final_score: Some(final_score),
        }
    }
}

/// Outcome of a settled round.
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    pub winner: Participant,
    pub final_score: f64,
    /// Distance of each participant's guess from the final score,
    /// first participant first.
    pub distances: [f64; 2],
    pub balance: BalanceRecord,
    pub wins: WinCountRecord,
}

/// The first participant wins only when strictly closer. Equal distances
/// go to the second participant.
pub fn pick_winner(first_guess: f64, second_guess: f64, final_score: f64) -> Participant {
    let first_dx = (first_guess - final_score).abs();
    let second_dx = (second_guess - final_score).abs();

    if first_dx < second_dx {
        Participant::First
    } else {
        Participant::Second
    }
}

impl Ledger {
    /// Settle the running round against `final_score`.
    ///
    /// The winner's balance and win count are updated as two separate
    /// writes; a failure in the second leaves the first in place and is
    /// reported on its own.
    pub async fn settle_final_score(&self, cmd: FinalScoreCmd) -> Result<Settlement, BetmoError> {
        let raw = cmd
            .final_score
            .ok_or_else(|| BetmoError::Validation("Final score not found".into()))?;
        let final_score = parse_numeric(&raw)
            .and_then(|n| n.as_f64())
            .ok_or_else(|| BetmoError::Validation("Final score must be numeric".into()))?;

        let _guard = self.gate.write().await;

        let session = self.store.read_guess_session().await.map_err(|e| {
            error!(error = %e, "Loading current guesses failed");
            BetmoError::storage("Could not load current guesses", e)
        })?;

        let first_guess = self.guess_of(&session, Participant::First)?;
        let second_guess = self.guess_of(&session, Participant::Second)?;
        let winner = pick_winner(first_guess, second_guess, final_score);
        let distances = [
            (first_guess - final_score).abs(),
            (second_guess - final_score).abs(),
        ];
        if distances[0] == distances[1] {
            debug!(final_score, "Equal distances, tie goes to the second participant");
        }

        let name = self.roster.name(winner);

        let balance = self.credit_balance(name).await.map_err(|e| {
            error!(user = name, error = %e, "Updating winner's balance failed");
            e
        })?;

        let wins = self.credit_win(name).await.map_err(|e| {
            error!(user = name, error = %e, "Updating winner's total failed");
            e
        })?;

        if self.rules.close_round_on_settle {
            self.store
                .write_guess_session(&GuessSession::new())
                .await
                .map_err(|e| BetmoError::storage("Could not clear current guesses", e))?;
            debug!("Round closed");
        }

        info!(
            winner = name,
            final_score,
            first_dx = distances[0],
            second_dx = distances[1],
            balance = balance.balance,
            total_wins = wins.total_wins,
            "Round settled"
        );

        Ok(Settlement {
            winner,
            final_score,
            distances,
            balance,
            wins,
        })
    }

    fn guess_of(&self, session: &GuessSession, participant: Participant) -> Result<f64, BetmoError> {
        let name = self.roster.name(participant);
        session
            .get(name)
            .and_then(|entry| entry.value())
            .ok_or_else(|| BetmoError::Determination(format!("no guess recorded for {name}")))
    }

    async fn credit_balance(&self, name: &str) -> Result<BalanceRecord, BetmoError> {
        let message = "Could not update winner's balance";
        let current = self
            .store
            .read_balance(name)
            .await
            .map_err(|e| BetmoError::storage(message, e))?;
        let updated = BalanceRecord {
            balance: current
                .balance
                .checked_add(1)
                .ok_or_else(|| BetmoError::Internal(message.into()))?,
        };
        self.store
            .write_balance(name, updated)
            .await
            .map_err(|e| BetmoError::storage(message, e))?;
        Ok(updated)
    }

    async fn credit_win(&self, name: &str) -> Result<WinCountRecord, BetmoError> {
        let message = "Could not update winner's guessed count";
        let current = self
            .store
            .read_win_count(name)
            .await
            .map_err(|e| BetmoError::storage(message, e))?;
        let updated = WinCountRecord {
            total_wins: current
                .total_wins
                .checked_add(1)
                .ok_or_else(|| BetmoError::Internal(message.into()))?,
        };
        self.store
            .write_win_count(name, updated)
            .await
            .map_err(|e| BetmoError::storage(message, e))?;
        Ok(updated)
    }
}
