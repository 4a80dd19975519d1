//! User seeding for a standalone deployment.
//!
//! Identity and authentication belong to the hosting system; these
//! commands only populate the table that recipient resolution reads.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use rpms_core::Role;
use rpms_workflow::db::PgStore;
use rpms_workflow::UserRecord;

use crate::print_json;

/// Arguments for the `rpms user` subcommand.
#[derive(Args, Debug)]
pub struct UserArgs {
    #[command(subcommand)]
    pub command: UserCommand,
}

#[derive(Subcommand, Debug)]
pub enum UserCommand {
    /// Register a user under a fresh id.
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        role: Role,
    },

    /// List registered users.
    List,
}

/// Execute a user subcommand.
pub async fn run_user(args: UserArgs, store: &PgStore) -> Result<u8> {
    match args.command {
        UserCommand::Add { name, email, role } => {
            let user = UserRecord::new(name, email, role);
            store
                .add_user(&user)
                .await
                .with_context(|| format!("failed to add user {}", user.email))?;
            print_json(&user)?;
        }
        UserCommand::List => {
            print_json(&store.users().await.context("failed to list users")?)?;
        }
    }
    Ok(0)
}
