//! Startup and shutdown sequences of the server

pub mod shutdown;
pub mod startup;
