//! # Paper Subcommand
//!
//! Paper lifecycle operations, each routed through the workflow
//! orchestrator so the transition table and fan-out apply.
//!
//! ## Subcommands
//!
//! - `submit`: submit a new paper as its author.
//! - `update`: replace content and set a status.
//! - `recommend`: recommend for publication.
//! - `details`: set publication metadata, allocating an identifier if none
//!   is given.
//! - `delete`: delete a paper.
//! - `show`: print one paper.
//! - `list`: print every paper, newest first.

use anyhow::Result;
use clap::{Args, Subcommand};
use rpms_core::{PaperId, PublicationId, Timestamp};
use rpms_state::{NewPaper, PaperContent, PaperKind, PaperMetadata, PaperStatus};
use rpms_workflow::{PaperUpdate, Workflow};

use crate::context::ActingUser;
use crate::print_json;

/// Arguments for the `rpms paper` subcommand.
#[derive(Args, Debug)]
pub struct PaperArgs {
    #[command(subcommand)]
    pub command: PaperCommand,
}

/// Author-supplied text shared by `submit` and `update`.
#[derive(Args, Debug, Clone)]
pub struct ContentArgs {
    /// Paper title.
    #[arg(long)]
    pub title: String,
    /// Abstract.
    #[arg(long = "abstract", default_value = "")]
    pub abstract_text: String,
    /// Body text.
    #[arg(long, default_value = "")]
    pub content: String,
    /// Location of the uploaded manuscript.
    #[arg(long, default_value = "")]
    pub file_url: String,
}

impl From<ContentArgs> for PaperContent {
    fn from(args: ContentArgs) -> Self {
        Self {
            title: args.title,
            abstract_text: args.abstract_text,
            content: args.content,
            file_url: args.file_url,
        }
    }
}

/// Publication metadata for `details`.
#[derive(Args, Debug, Clone, Default)]
pub struct MetadataArgs {
    /// Publication identifier. Omit to allocate the next one.
    #[arg(long)]
    pub publication_id: Option<PublicationId>,
    #[arg(long, default_value = "")]
    pub institution_code: String,
    #[arg(long, default_value = "")]
    pub isced_band: String,
    /// Title in the second language.
    #[arg(long, default_value = "")]
    pub localized_title: String,
    /// RFC 3339 publication date.
    #[arg(long)]
    pub publication_date: Option<String>,
    #[arg(long, default_value = "")]
    pub publication_type: String,
    #[arg(long, default_value = "")]
    pub journal_type: String,
    #[arg(long, default_value = "")]
    pub journal_name: String,
    #[arg(long)]
    pub indigenous_knowledge: bool,
}

impl MetadataArgs {
    fn into_metadata(self) -> Result<PaperMetadata> {
        let publication_date = self
            .publication_date
            .as_deref()
            .map(Timestamp::parse)
            .transpose()?;
        Ok(PaperMetadata {
            institution_code: self.institution_code,
            publication_id: self.publication_id,
            isced_band: self.isced_band,
            localized_title: self.localized_title,
            publication_date,
            publication_type: self.publication_type,
            journal_type: self.journal_type,
            journal_name: self.journal_name,
            indigenous_knowledge: self.indigenous_knowledge,
        })
    }
}

/// Paper subcommands.
#[derive(Subcommand, Debug)]
pub enum PaperCommand {
    /// Submit a new paper (status: submitted). Notifies every editor.
    Submit {
        #[command(flatten)]
        actor: ActingUser,
        #[command(flatten)]
        content: ContentArgs,
        /// Paper type (research or other).
        #[arg(long = "type", default_value = "research")]
        kind: PaperKind,
    },

    /// Replace content and set a status. Published or rejected notifies
    /// the reviewer of record.
    Update {
        #[command(flatten)]
        actor: ActingUser,
        /// Paper id.
        #[arg(long)]
        id: PaperId,
        #[command(flatten)]
        content: ContentArgs,
        /// Target status.
        #[arg(long)]
        status: PaperStatus,
    },

    /// Recommend for publication. Notifies every admin.
    Recommend {
        #[command(flatten)]
        actor: ActingUser,
        /// Paper id.
        #[arg(long)]
        id: PaperId,
    },

    /// Set publication metadata. Notifies admins and coordinators.
    Details {
        #[command(flatten)]
        actor: ActingUser,
        /// Paper id.
        #[arg(long)]
        id: PaperId,
        #[command(flatten)]
        metadata: MetadataArgs,
    },

    /// Delete a paper and its reviews.
    Delete {
        #[command(flatten)]
        actor: ActingUser,
        /// Paper id.
        #[arg(long)]
        id: PaperId,
    },

    /// Show one paper.
    Show {
        /// Paper id.
        #[arg(long)]
        id: PaperId,
    },

    /// List every paper, newest first.
    List,
}

/// Execute a paper subcommand.
pub async fn run_paper(args: PaperArgs, workflow: &Workflow) -> Result<u8> {
    match args.command {
        PaperCommand::Submit {
            actor,
            content,
            kind,
        } => {
            let input = NewPaper {
                content: content.into(),
                kind,
            };
            let paper = workflow.submit_paper(&actor.actor(), input).await?;
            print_json(&paper)?;
        }
        PaperCommand::Update {
            actor,
            id,
            content,
            status,
        } => {
            let update = PaperUpdate {
                content: content.into(),
                status,
            };
            let paper = workflow.update_paper(&actor.actor(), id, update).await?;
            print_json(&paper)?;
        }
        PaperCommand::Recommend { actor, id } => {
            let paper = workflow.recommend(&actor.actor(), id).await?;
            print_json(&paper)?;
        }
        PaperCommand::Details {
            actor,
            id,
            metadata,
        } => {
            let paper = workflow
                .update_metadata(&actor.actor(), id, metadata.into_metadata()?)
                .await?;
            print_json(&paper)?;
        }
        PaperCommand::Delete { actor, id } => {
            workflow.delete_paper(&actor.actor(), id).await?;
            println!("deleted {id}");
        }
        PaperCommand::Show { id } => {
            print_json(&workflow.get_paper(id).await?)?;
        }
        PaperCommand::List => {
            print_json(&workflow.list_papers().await?)?;
        }
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_args_parse_date() {
        let args = MetadataArgs {
            publication_date: Some("2024-03-01T00:00:00+03:00".into()),
            journal_name: "Ethiopian Journal of Agriculture".into(),
            ..Default::default()
        };
        let meta = args.into_metadata().unwrap();
        assert_eq!(
            meta.publication_date.unwrap().to_rfc3339(),
            "2024-02-29T21:00:00Z"
        );
        assert_eq!(meta.publication_id, None);
    }

    #[test]
    fn metadata_args_reject_bad_date() {
        let args = MetadataArgs {
            publication_date: Some("yesterday".into()),
            ..Default::default()
        };
        assert!(args.into_metadata().is_err());
    }
}
