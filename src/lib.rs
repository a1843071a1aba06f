//! WARCHEST — Campaign Economy Ledger for Tabletop Skirmish Rosters
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod narrative;
pub mod storage;
pub mod store;
pub mod types;
