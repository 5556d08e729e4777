//! ccafinder: find the community choice aggregation (CCA) programs an
//! address is eligible for.
//!
//! The crate contains both sides of the lookup: the eligibility API server
//! backed by a SQLite coverage catalog, and the client front ends (a one-shot
//! command and a terminal UI) built around [`finder::FinderView`].

pub mod client;
pub mod config;
pub mod directory;
pub mod eligibility;
pub mod errors;
pub mod finder;
pub mod ingest;
pub mod models;
pub mod server;
pub mod storage;
pub mod tui;
