//! Shared setup: a router over a throwaway storage root.

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceExt;

use betmo::api::build_router;
use betmo::config::RulesConfig;
use betmo::engine::Ledger;
use betmo::storage::FileStore;
use betmo::types::Roster;

pub struct TestApp {
    pub router: Router,
    pub store: Arc<FileStore>,
}

impl TestApp {
    /// Fresh app with both participants seeded at `initial_balance`.
    pub async fn start(rules: RulesConfig, initial_balance: i64) -> Self {
        let root: PathBuf =
            std::env::temp_dir().join(format!("betmo_it_{}", uuid::Uuid::new_v4()));
        let store = Arc::new(FileStore::new(root));
        let ledger = Ledger::new(store.clone(), Roster::default(), rules);
        ledger.seed_missing_records(initial_balance).await.unwrap();
        Self {
            router: build_router(Arc::new(ledger)),
            store,
        }
    }

    pub async fn post(&self, uri: &str, body: &str) -> Value {
        self.send(Method::POST, uri, body).await
    }

    pub async fn get(&self, uri: &str) -> Value {
        self.send(Method::GET, uri, "").await
    }

    async fn send(&self, method: Method, uri: &str, body: &str) -> Value {
        let resp = self
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), 100_000).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    pub async fn balance_of(&self, name: &str) -> i64 {
        self.get("/betmo/get_balances").await["balances"][name]["balance"]
            .as_i64()
            .unwrap()
    }

    pub async fn wins_of(&self, name: &str) -> i64 {
        self.get("/betmo/get_total_wins").await["total_wins"][name]["total_wins"]
            .as_i64()
            .unwrap()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(self.store.root());
    }
}
