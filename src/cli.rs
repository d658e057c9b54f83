//! Command-line interface definitions using clap
//!
//! This module defines the CLI structure for decaylink using clap's derive macros.

use clap::{Parser, Subcommand};

use crate::config::StaticConfig;
use crate::errors::{DecaylinkError, Result};

/// decaylink - A URL shortener whose links decay by time or by use
#[derive(Parser, Debug)]
#[command(name = "decaylink")]
#[command(version)]
#[command(about = "A URL shortener whose links decay by time or by use", long_about = None)]
pub struct Cli {
    /// Config file (default: config.toml, optional)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<String>,

    /// Listen address, overrides [server] host and port
    #[arg(long, value_name = "HOST:PORT")]
    pub listen: Option<String>,

    /// Snapshot file, overrides [snapshot] path
    #[arg(long, value_name = "PATH")]
    pub dump_file: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Run the HTTP server (default)
    Serve,

    /// Write a sample configuration file
    GenerateConfig {
        /// Output path (default: stdout)
        output: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    /// Apply command-line overrides on top of the loaded configuration.
    pub fn apply_to(&self, config: &mut StaticConfig) -> Result<()> {
        if let Some(listen) = &self.listen {
            let (host, port) = parse_listen(listen)?;
            config.server.host = host;
            config.server.port = port;
        }
        if let Some(dump_file) = &self.dump_file {
            config.snapshot.path = Some(dump_file.clone());
        }
        Ok(())
    }
}

/// Split `host:port`; an IPv6 host is written in brackets (`[::1]:8080`).
fn parse_listen(listen: &str) -> Result<(String, u16)> {
    let invalid = || DecaylinkError::validation(format!("Invalid listen address '{}'", listen));

    let (host, port) = listen.rsplit_once(':').ok_or_else(invalid)?;
    let port = port.parse::<u16>().map_err(|_| invalid())?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.is_empty() {
        return Err(invalid());
    }
    Ok((host.to_string(), port))
}
