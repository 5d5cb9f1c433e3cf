//! Guess submission and the current-guesses view.

use chrono::{Local, NaiveDateTime};
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info};

use super::Ledger;
use crate::types::{parse_numeric, BetmoError, GuessEntry, GuessSession};

/// Body of a guess submission: `{"User": ..., "Guess": ...}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmitGuessCmd {
    #[serde(rename = "User")]
    pub user: Option<String>,
    #[serde(rename = "Guess")]
    pub guess: Option<Value>,
}

impl SubmitGuessCmd {
    pub fn new(user: impl Into<String>, guess: Value) -> Self {
        Self {
            user: Some(user.into()),
            guess: Some(guess),
        }
    }
}

impl Ledger {
    /// Record (or overwrite) the caller's guess for the running round,
    /// stamped with the current local time.
    pub async fn submit_guess(&self, cmd: SubmitGuessCmd) -> Result<GuessEntry, BetmoError> {
        self.submit_guess_at(cmd, Local::now().naive_local()).await
    }

    pub async fn submit_guess_at(
        &self,
        cmd: SubmitGuessCmd,
        submitted_at: NaiveDateTime,
    ) -> Result<GuessEntry, BetmoError> {
        let user = cmd
            .user
            .ok_or_else(|| BetmoError::Validation("User not found".into()))?;
        let raw_guess = cmd
            .guess
            .ok_or_else(|| BetmoError::Validation("Guess not found".into()))?;

        if self.roster.resolve(&user).is_none() {
            return Err(BetmoError::Validation(format!("Unknown user: {user}")));
        }
        let guess = parse_numeric(&raw_guess)
            .ok_or_else(|| BetmoError::Validation("Guess must be numeric".into()))?;

        let _guard = self.gate.write().await;

        // A missing snapshot means this is the first guess of the round.
        let mut session = match self.store.read_guess_session().await {
            Ok(session) => session,
            Err(e) if e.is_not_found() => {
                self.store.prepare().await.map_err(|e| {
                    error!(error = %e, "Could not create guess storage");
                    BetmoError::storage("Could not load (or initialize) current guesses", e)
                })?;
                GuessSession::new()
            }
            Err(e) => {
                error!(error = %e, "Loading current guesses failed");
                return Err(BetmoError::storage(
                    "Could not load (or initialize) current guesses",
                    e,
                ));
            }
        };

        let entry = GuessEntry::new(guess, submitted_at);
        session.record(&user, entry.clone());

        self.store.write_guess_session(&session).await.map_err(|e| {
            error!(error = %e, "Writing current guesses failed");
            BetmoError::storage("Could not write to current guesses file", e)
        })?;

        info!(user = %user, guess = %entry.guess, "Guess submitted");
        Ok(entry)
    }

    /// The guess snapshot as last written.
    pub async fn current_guesses(&self) -> Result<GuessSession, BetmoError> {
        let _guard = self.gate.read().await;

        match self.store.read_guess_session().await {
            Ok(session) => Ok(session),
            Err(e) if e.is_empty() => Err(BetmoError::Validation("No guesses found".into())),
            Err(e) => {
                error!(error = %e, "Loading current guesses failed");
                Err(BetmoError::storage("Could not load current guesses", e))
            }
        }
    }
}
