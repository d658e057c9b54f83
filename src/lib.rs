//! decaylink - A URL shortener whose links decay
//!
//! Links live in memory and disappear after a configured lifetime, after a
//! configured number of fetches, or both. The store is written to a JSON
//! snapshot periodically and on shutdown, and restored at startup.
//!
//! # Architecture
//! - `storage`: link store, token generation and snapshot files
//! - `api`: HTTP handlers and response rendering
//! - `services`: reaper and snapshotter background tasks
//! - `config`: configuration loading and validation
//! - `runtime`: startup, shutdown and server mode
//! - `system`: logging setup

pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
