//! # rpms-cli
//!
//! Subcommand handlers for the `rpms` binary. Each module owns one
//! subcommand's clap arguments and a `run_*` function that returns the
//! process exit code.
//!
//! - [`context`]: global options, configuration, and backend selection.
//! - [`table`]: `next-id` and `transitions`, which need no database.
//! - [`paper`]: paper lifecycle operations.
//! - [`review`]: review submission and listing.
//! - [`notification`]: inbox, mark-read, and manual messages.
//! - [`user`]: seeding users for a standalone deployment.

pub mod context;
pub mod notification;
pub mod paper;
pub mod review;
pub mod table;
pub mod user;

use anyhow::{Context as _, Result};
use serde::Serialize;

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("failed to render output")?;
    println!("{out}");
    Ok(())
}
