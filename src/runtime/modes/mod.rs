//! Mode routing
//!
//! The binary either serves HTTP (default) or writes a sample config.

pub mod server;

pub use server::run_server;
