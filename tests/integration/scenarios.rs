//! Full rounds: guesses, settlement, and transfers.

use betmo::config::RulesConfig;
use betmo::storage::RecordStore;
use betmo::types::BalanceRecord;
use serde_json::json;

use crate::fixtures::TestApp;

/// Balances {A:5, B:7}, guesses {A:10, B:20}, final score 12.
async fn settled_round() -> TestApp {
    let app = TestApp::start(RulesConfig::default(), 0).await;
    app.store.write_balance("Megan", BalanceRecord { balance: 5 }).await.unwrap();
    app.store.write_balance("Josh", BalanceRecord { balance: 7 }).await.unwrap();

    app.post("/betmo/submit_guess", r#"{"User": "Megan", "Guess": 10}"#).await;
    app.post("/betmo/submit_guess", r#"{"User": "Josh", "Guess": 20}"#).await;
    let reply = app.post("/betmo/submit_final_score", r#"{"final_score": 12}"#).await;
    assert_eq!(reply["status"], "200");
    app
}

#[tokio::test]
async fn test_closer_guess_wins_the_round() {
    let app = settled_round().await;

    assert_eq!(app.balance_of("Megan").await, 6);
    assert_eq!(app.balance_of("Josh").await, 7);
    assert_eq!(app.wins_of("Megan").await, 1);
    assert_eq!(app.wins_of("Josh").await, 0);
}

#[tokio::test]
async fn test_transfer_after_settlement() {
    let app = settled_round().await;

    let reply = app
        .post("/betmo/transfer_balance", r#"{"from": "Megan", "to": "Josh", "amount": 3}"#)
        .await;
    assert_eq!(reply, json!({"status": "200", "message": "Balance transferred"}));

    assert_eq!(app.balance_of("Megan").await, 3);
    assert_eq!(app.balance_of("Josh").await, 10);
}

#[tokio::test]
async fn test_equal_distance_goes_to_second_participant() {
    let app = TestApp::start(RulesConfig::default(), 0).await;

    app.post("/betmo/submit_guess", r#"{"User": "Megan", "Guess": 30}"#).await;
    app.post("/betmo/submit_guess", r#"{"User": "Josh", "Guess": 40}"#).await;
    app.post("/betmo/submit_final_score", r#"{"final_score": 35}"#).await;

    assert_eq!(app.wins_of("Josh").await, 1);
    assert_eq!(app.wins_of("Megan").await, 0);
}

#[tokio::test]
async fn test_resubmitted_guess_replaces_the_old_one() {
    let app = TestApp::start(RulesConfig::default(), 0).await;

    app.post("/betmo/submit_guess", r#"{"User": "Megan", "Guess": 100}"#).await;
    app.post("/betmo/submit_guess", r#"{"User": "Josh", "Guess": 20}"#).await;
    app.post("/betmo/submit_guess", r#"{"User": "Megan", "Guess": 18}"#).await;

    let guesses = app.get("/betmo/get_current_guesses").await["guesses"].clone();
    assert_eq!(guesses.as_object().unwrap().len(), 2);
    assert_eq!(guesses["Megan"]["Guess"], json!(18));

    app.post("/betmo/submit_final_score", r#"{"final_score": 17}"#).await;
    assert_eq!(app.wins_of("Megan").await, 1);
}

#[tokio::test]
async fn test_closed_round_must_be_guessed_again() {
    let rules = RulesConfig {
        close_round_on_settle: true,
        ..RulesConfig::default()
    };
    let app = TestApp::start(rules, 0).await;

    app.post("/betmo/submit_guess", r#"{"User": "Megan", "Guess": 1}"#).await;
    app.post("/betmo/submit_guess", r#"{"User": "Josh", "Guess": 9}"#).await;
    app.post("/betmo/submit_final_score", r#"{"final_score": 2}"#).await;

    let guesses = app.get("/betmo/get_current_guesses").await;
    assert_eq!(guesses["guesses"], json!({}));

    let reply = app.post("/betmo/submit_final_score", r#"{"final_score": 2}"#).await;
    assert_eq!(reply["status"], "500");
    assert_eq!(app.wins_of("Megan").await, 1);
}

#[tokio::test]
async fn test_rejected_transfer_changes_nothing() {
    let app = TestApp::start(RulesConfig::default(), 4).await;

    let reply = app
        .post("/betmo/transfer_balance", r#"{"from": "Josh", "to": "Megan", "amount": "5"}"#)
        .await;
    assert_eq!(reply["status"], "400");

    assert_eq!(app.balance_of("Megan").await, 4);
    assert_eq!(app.balance_of("Josh").await, 4);
}
