//! BETMO — two-player daily guessing game.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod storage;
pub mod engine;
pub mod api;
