//! Shared types for the BETMO service.
//!
//! Participants, the persisted records, the guess session snapshot, and
//! the domain error returned by every ledger operation.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::collections::BTreeMap;
use std::fmt;

use crate::storage::StoreError;

// ---------------------------------------------------------------------------
// Participants
// ---------------------------------------------------------------------------

/// One of the two fixed seats in the game.
///
/// `First` is checked first during settlement; `Second` takes equal-distance
/// ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Participant {
    First,
    Second,
}

impl Participant {
    pub const ALL: [Participant; 2] = [Participant::First, Participant::Second];

    /// The other participant.
    pub fn other(self) -> Self {
        match self {
            Participant::First => Participant::Second,
            Participant::Second => Participant::First,
        }
    }
}

impl fmt::Display for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Participant::First => write!(f, "first"),
            Participant::Second => write!(f, "second"),
        }
    }
}

/// Names bound to the two seats. Names double as storage keys and as the
/// keys of every JSON map the service returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    #[serde(default = "default_first")]
    pub first: String,
    #[serde(default = "default_second")]
    pub second: String,
}

fn default_first() -> String {
    "Megan".to_string()
}

fn default_second() -> String {
    "Josh".to_string()
}

impl Default for Roster {
    fn default() -> Self {
        Self {
            first: default_first(),
            second: default_second(),
        }
    }
}

impl Roster {
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
        }
    }

    pub fn name(&self, participant: Participant) -> &str {
        match participant {
            Participant::First => &self.first,
            Participant::Second => &self.second,
        }
    }

    /// Exact, case-sensitive lookup.
    pub fn resolve(&self, name: &str) -> Option<Participant> {
        Participant::ALL
            .into_iter()
            .find(|p| self.name(*p) == name)
    }
}

// ---------------------------------------------------------------------------
// Persisted records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BalanceRecord {
    pub balance: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WinCountRecord {
    pub total_wins: i64,
}

/// A participant's guess for the running round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuessEntry {
    #[serde(rename = "Guess")]
    pub guess: Number,
    #[serde(rename = "Guess_Time", with = "guess_time")]
    pub submitted_at: NaiveDateTime,
}

impl GuessEntry {
    pub fn new(guess: Number, submitted_at: NaiveDateTime) -> Self {
        Self { guess, submitted_at }
    }

    pub fn value(&self) -> Option<f64> {
        self.guess.as_f64()
    }
}

/// Snapshot of the current round: at most one entry per participant name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuessSession {
    entries: BTreeMap<String, GuessEntry>,
}

impl GuessSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or overwrite the entry for `name`.
    pub fn record(&mut self, name: &str, entry: GuessEntry) {
        self.entries.insert(name.to_string(), entry);
    }

    pub fn get(&self, name: &str) -> Option<&GuessEntry> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

mod guess_time {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S: Serializer>(at: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&at.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Input coercion
// ---------------------------------------------------------------------------

/// Accept a JSON number or a numeric string, keeping integers as integers.
/// Non-finite values are rejected.
pub fn parse_numeric(value: &Value) -> Option<Number> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()).map(|_| n.clone()),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                return Some(Number::from(i));
            }
            s.parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .and_then(Number::from_f64)
        }
        _ => None,
    }
}

/// Accept a JSON integer or an integer string.
pub fn parse_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain errors. Every variant's display text is the message returned to
/// the caller.
#[derive(Debug, thiserror::Error)]
pub enum BetmoError {
    #[error("{0}")]
    Validation(String),

    #[error("{message}")]
    Storage {
        message: String,
        #[source]
        source: StoreError,
    },

    #[error("Sender does not have enough balance")]
    InsufficientFunds { needed: i64, available: i64 },

    #[error("Could not determine winning user: {0}")]
    Determination(String),

    #[error("{0}")]
    Internal(String),
}

impl BetmoError {
    pub fn storage(message: impl Into<String>, source: StoreError) -> Self {
        BetmoError::Storage {
            message: message.into(),
            source,
        }
    }

    /// Status string carried in the response body.
    pub fn status(&self) -> &'static str {
        match self {
            BetmoError::Validation(_) | BetmoError::InsufficientFunds { .. } => "400",
            BetmoError::Storage { .. }
            | BetmoError::Determination(_)
            | BetmoError::Internal(_) => "500",
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
