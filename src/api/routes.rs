//! Route handlers.
//!
//! Every `/betmo/*` endpoint answers with transport status 200 and carries
//! the outcome as a string `status` inside the JSON body.

use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use crate::engine::{FinalScoreCmd, Ledger, SubmitGuessCmd, TransferCmd};
use crate::engine::standings::Standings;
use crate::types::{BalanceRecord, BetmoError, GuessSession, WinCountRecord};

pub type AppState = Arc<Ledger>;

// ---------------------------------------------------------------------------
// Response body
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct Reply {
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guesses: Option<GuessSession>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balances: Option<Standings<BalanceRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_wins: Option<Standings<WinCountRecord>>,
}

impl Reply {
    pub fn new(status: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            message: message.into(),
            guesses: None,
            balances: None,
            total_wins: None,
        }
    }

    pub fn ok(message: impl Into<String>) -> Self {
        Self::new("200", message)
    }
}

impl From<BetmoError> for Reply {
    fn from(e: BetmoError) -> Self {
        Reply::new(e.status(), e.to_string())
    }
}

/// Parse a request body without requiring a JSON content type.
/// An empty body is treated as `{}`.
fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, serde_json::Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET|POST /betmo/submit_guess
pub async fn submit_guess(State(ledger): State<AppState>, body: Bytes) -> Json<Reply> {
    let cmd: SubmitGuessCmd = match parse_body(&body) {
        Ok(cmd) => cmd,
        Err(e) => {
            warn!(error = %e, "Malformed guess submission");
            return Json(Reply::new("400", "Malformed request body"));
        }
    };

    match ledger.submit_guess(cmd).await {
        Ok(_) => Json(Reply::ok("Guess submitted")),
        // Missing fields on this endpoint have always reported "error".
        Err(BetmoError::Validation(message)) => Json(Reply::new("error", message)),
        Err(e) => Json(e.into()),
    }
}

/// GET|POST /betmo/submit_final_score
pub async fn submit_final_score(State(ledger): State<AppState>, body: Bytes) -> Json<Reply> {
    let cmd: FinalScoreCmd = match parse_body(&body) {
        Ok(cmd) => cmd,
        Err(e) => {
            warn!(error = %e, "Malformed final score submission");
            return Json(Reply::new("400", "Malformed request body"));
        }
    };

    match ledger.settle_final_score(cmd).await {
        Ok(_) => Json(Reply::ok("Final score submitted and balances updated")),
        Err(e) => Json(e.into()),
    }
}

/// GET|POST /betmo/get_current_guesses
pub async fn get_current_guesses(State(ledger): State<AppState>) -> Json<Reply> {
    match ledger.current_guesses().await {
        Ok(guesses) => Json(Reply {
            guesses: Some(guesses),
            ..Reply::ok("Current guesses retrieved")
        }),
        Err(e) => Json(e.into()),
    }
}

/// GET|POST /betmo/get_balances
pub async fn get_balances(State(ledger): State<AppState>) -> Json<Reply> {
    match ledger.balances().await {
        Ok(balances) => Json(Reply {
            balances: Some(balances),
            ..Reply::ok("Current balances retrieved")
        }),
        Err(e) => Json(e.into()),
    }
}

/// GET|POST /betmo/get_total_wins
pub async fn get_total_wins(State(ledger): State<AppState>) -> Json<Reply> {
    match ledger.total_wins().await {
        Ok(total_wins) => Json(Reply {
            total_wins: Some(total_wins),
            ..Reply::ok("Current total wins retrieved")
        }),
        Err(e) => Json(e.into()),
    }
}

/// GET|POST /betmo/transfer_balance
pub async fn transfer_balance(State(ledger): State<AppState>, body: Bytes) -> Json<Reply> {
    let cmd: TransferCmd = match parse_body(&body) {
        Ok(cmd) => cmd,
        Err(e) => {
            warn!(error = %e, "Extracting transfer request failed");
            return Json(Reply::new("500", "Could not extract POST request"));
        }
    };

    match ledger.transfer_balance(cmd).await {
        Ok(_) => Json(Reply::ok("Balance transferred")),
        Err(e) => Json(e.into()),
    }
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
