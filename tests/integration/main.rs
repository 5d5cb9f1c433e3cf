//! End-to-end tests over the HTTP router with a real file store.

mod fixtures;
mod scenarios;
