//! # rpms CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.
//! `next-id` and `transitions` run without a database; every other
//! subcommand connects to PostgreSQL and waits for notification delivery
//! before exiting.

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use rpms_cli::context::{connect, GlobalOpts};
use rpms_cli::notification::{run_notifications, NotificationArgs};
use rpms_cli::paper::{run_paper, PaperArgs};
use rpms_cli::review::{run_review, ReviewArgs};
use rpms_cli::table::{run_next_id, run_transitions, NextIdArgs};
use rpms_cli::user::{run_user, UserArgs};
use rpms_workflow::Workflow;

/// Research publication workflow CLI.
///
/// Submits and reviews papers, drives them through the publication
/// lifecycle, allocates publication identifiers, and delivers role-based
/// notifications.
#[derive(Parser, Debug)]
#[command(name = "rpms", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(flatten)]
    global: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the publication identifier that follows a given one.
    NextId(NextIdArgs),

    /// Print the active transition table.
    Transitions,

    /// Paper lifecycle (submit, update, recommend, details, delete, show, list).
    Paper(PaperArgs),

    /// Submit and list reviews.
    Review(ReviewArgs),

    /// Read, acknowledge, and send notifications.
    Notifications(NotificationArgs),

    /// Register and list users.
    User(UserArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> Result<u8> {
    match cli.command {
        Commands::NextId(args) => run_next_id(&args),
        Commands::Transitions => run_transitions(cli.global.config()?.enforcement),
        Commands::Paper(args) => {
            let (workflow, _) = connect(&cli.global).await?;
            let result = run_paper(args, &workflow).await;
            finish(&workflow, result).await
        }
        Commands::Review(args) => {
            let (workflow, _) = connect(&cli.global).await?;
            let result = run_review(args, &workflow).await;
            finish(&workflow, result).await
        }
        Commands::Notifications(args) => {
            let (workflow, _) = connect(&cli.global).await?;
            let result = run_notifications(args, &workflow).await;
            finish(&workflow, result).await
        }
        Commands::User(args) => {
            let (_, store) = connect(&cli.global).await?;
            run_user(args, &store).await
        }
    }
}

/// Wait for in-flight notification deliveries before the runtime shuts down.
async fn finish(workflow: &Workflow, result: Result<u8>) -> Result<u8> {
    let report = workflow.flush_notifications().await;
    tracing::debug!(
        delivered = report.delivered,
        failed = report.failed,
        "notifications flushed"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_paper_submit() {
        let cli = Cli::try_parse_from([
            "rpms",
            "paper",
            "submit",
            "--user",
            "6f0c8a5e-3b1d-4c2a-9e7f-1a2b3c4d5e6f",
            "--role",
            "author",
            "--title",
            "Soil Retention in Arid Zones",
            "--type",
            "research",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Paper(_)));
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = Cli::try_parse_from(["rpms", "transitions", "--strict", "-vv"]).unwrap();
        assert!(cli.global.strict);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn rejects_unknown_role() {
        let result = Cli::try_parse_from([
            "rpms",
            "notifications",
            "list",
            "--user",
            "6f0c8a5e-3b1d-4c2a-9e7f-1a2b3c4d5e6f",
            "--role",
            "reviewer",
        ]);
        assert!(result.is_err());
    }
}
