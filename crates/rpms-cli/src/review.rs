//! Review submission and listing.

use anyhow::Result;
use clap::{Args, Subcommand};
use rpms_core::PaperId;
use rpms_workflow::{NewReview, Workflow};

use crate::context::ActingUser;
use crate::print_json;

/// Arguments for the `rpms review` subcommand.
#[derive(Args, Debug)]
pub struct ReviewArgs {
    #[command(subcommand)]
    pub command: ReviewCommand,
}

#[derive(Subcommand, Debug)]
pub enum ReviewCommand {
    /// Review a paper. Notifies the paper's author.
    Submit {
        #[command(flatten)]
        actor: ActingUser,
        /// Paper under review.
        #[arg(long)]
        paper: PaperId,
        /// Rating from 1 to 5.
        #[arg(long)]
        rating: i32,
        /// Recommendation (accept, minor revision, reject, ...).
        #[arg(long)]
        recommendation: String,
        #[arg(long, default_value = "")]
        comments: String,
    },

    /// List reviews, optionally for a single paper.
    List {
        #[arg(long)]
        paper: Option<PaperId>,
    },
}

/// Execute a review subcommand.
pub async fn run_review(args: ReviewArgs, workflow: &Workflow) -> Result<u8> {
    match args.command {
        ReviewCommand::Submit {
            actor,
            paper,
            rating,
            recommendation,
            comments,
        } => {
            let input = NewReview {
                paper_id: paper,
                rating,
                comments,
                recommendation,
            };
            let review = workflow.submit_review(&actor.actor(), input).await?;
            print_json(&review)?;
        }
        ReviewCommand::List { paper } => {
            print_json(&workflow.list_reviews(paper).await?)?;
        }
    }
    Ok(0)
}
