//! Notification inbox, mark-read, and manual messages.

use anyhow::Result;
use clap::{Args, Subcommand};
use rpms_core::{NotificationId, PaperId, UserId};
use rpms_workflow::{ManualNotification, Workflow};

use crate::context::ActingUser;
use crate::print_json;

/// Arguments for the `rpms notifications` subcommand.
#[derive(Args, Debug)]
pub struct NotificationArgs {
    #[command(subcommand)]
    pub command: NotificationCommand,
}

#[derive(Subcommand, Debug)]
pub enum NotificationCommand {
    /// Show the acting user's notifications, newest first.
    List {
        #[command(flatten)]
        actor: ActingUser,
    },

    /// Mark one of the acting user's notifications as read.
    Read {
        #[command(flatten)]
        actor: ActingUser,
        #[arg(long)]
        id: NotificationId,
    },

    /// Send a message to a user.
    Send {
        #[command(flatten)]
        actor: ActingUser,
        /// Recipient.
        #[arg(long)]
        to: UserId,
        #[arg(long)]
        message: String,
        /// Paper the message concerns.
        #[arg(long)]
        paper: Option<PaperId>,
    },
}

/// Execute a notification subcommand.
pub async fn run_notifications(args: NotificationArgs, workflow: &Workflow) -> Result<u8> {
    match args.command {
        NotificationCommand::List { actor } => {
            print_json(&workflow.notifications_for(&actor.actor()).await?)?;
        }
        NotificationCommand::Read { actor, id } => {
            let notification = workflow.mark_notification_read(&actor.actor(), id).await?;
            print_json(&notification)?;
        }
        NotificationCommand::Send {
            actor,
            to,
            message,
            paper,
        } => {
            let input = ManualNotification {
                user_id: to,
                message,
                paper_id: paper,
            };
            print_json(&workflow.notify_user(&actor.actor(), input).await?)?;
        }
    }
    Ok(0)
}
