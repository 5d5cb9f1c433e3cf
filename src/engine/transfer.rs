//! Balance transfers between the two participants.

use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info, warn};

use super::Ledger;
use crate::storage::StoreError;
use crate::types::{parse_integer, BalanceRecord, BetmoError, Participant};

/// Body of a transfer request: `{"from": ..., "to": ..., "amount": ...}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransferCmd {
    pub from: Option<String>,
    pub to: Option<String>,
    pub amount: Option<Value>,
}

impl TransferCmd {
    pub fn new(from: impl Into<String>, to: impl Into<String>, amount: Value) -> Self {
        Self {
            from: Some(from.into()),
            to: Some(to.into()),
            amount: Some(amount),
        }
    }
}

/// Result of a completed transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct Transfer {
    pub sender: Participant,
    pub amount: i64,
    pub sender_balance: BalanceRecord,
    pub receiver_balance: BalanceRecord,
}

/// New `(sender, receiver)` balances after moving `amount`.
pub fn apply_transfer(sender: i64, receiver: i64, amount: i64) -> Result<(i64, i64), BetmoError> {
    if sender < amount {
        return Err(BetmoError::InsufficientFunds {
            needed: amount,
            available: sender,
        });
    }
    match (sender.checked_sub(amount), receiver.checked_add(amount)) {
        (Some(sender), Some(receiver)) => Ok((sender, receiver)),
        _ => Err(BetmoError::Internal("Could not transfer balance".into())),
    }
}

impl Ledger {
    /// Move `amount` from the sender to the other participant.
    ///
    /// The receiver is always the sender's counterparty; `to` is only
    /// checked when `strict_transfer_target` is on. Both balances are
    /// written as separate records.
    pub async fn transfer_balance(&self, cmd: TransferCmd) -> Result<Transfer, BetmoError> {
        let _guard = self.gate.write().await;

        let first_name = self.roster.name(Participant::First);
        let second_name = self.roster.name(Participant::Second);
        let load = |e: StoreError| {
            error!(error = %e, "Loading current balances failed");
            if e.is_empty() {
                BetmoError::Internal("Could not validate balances".into())
            } else {
                BetmoError::storage("Could not load current balances", e)
            }
        };
        let first = self.store.read_balance(first_name).await.map_err(load)?;
        let second = self.store.read_balance(second_name).await.map_err(load)?;

        let validate = || BetmoError::Internal("Could not validate sender balance".into());
        let sender = cmd
            .from
            .as_deref()
            .and_then(|name| self.roster.resolve(name))
            .ok_or_else(validate)?;
        let amount = cmd.amount.as_ref().and_then(parse_integer).ok_or_else(validate)?;

        if amount < 0 {
            return Err(BetmoError::Validation(
                "Transfer amount must not be negative".into(),
            ));
        }

        let receiver = sender.other();
        let receiver_name = self.roster.name(receiver);
        if self.rules.strict_transfer_target && cmd.to.as_deref() != Some(receiver_name) {
            return Err(BetmoError::Validation(format!(
                "Transfers from {} must go to {receiver_name}",
                self.roster.name(sender)
            )));
        }

        let (sender_before, receiver_before) = match sender {
            Participant::First => (first.balance, second.balance),
            Participant::Second => (second.balance, first.balance),
        };
        let (sender_after, receiver_after) = apply_transfer(sender_before, receiver_before, amount)
            .map_err(|e| {
                warn!(
                    from = self.roster.name(sender),
                    amount,
                    available = sender_before,
                    "Transfer rejected"
                );
                e
            })?;

        let sender_balance = BalanceRecord { balance: sender_after };
        let receiver_balance = BalanceRecord { balance: receiver_after };
        let (first_after, second_after) = match sender {
            Participant::First => (sender_balance, receiver_balance),
            Participant::Second => (receiver_balance, sender_balance),
        };

        let save = |e: StoreError| {
            error!(error = %e, "Saving new balances failed");
            BetmoError::storage("Could not save new balances", e)
        };
        self.store.write_balance(first_name, first_after).await.map_err(save)?;
        self.store.write_balance(second_name, second_after).await.map_err(save)?;

        info!(
            from = self.roster.name(sender),
            to = receiver_name,
            amount,
            "Balance transferred"
        );

        Ok(Transfer {
            sender,
            amount,
            sender_balance,
            receiver_balance,
        })
    }
}
