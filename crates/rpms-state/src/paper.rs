//! # Paper Entity
//!
//! A paper as the workflow sees it: author-supplied content, the lifecycle
//! status, the publication metadata block filled in by editors, and an
//! ordered log of every status change.

use std::str::FromStr;

use rpms_core::error::require_text;
use rpms_core::{PaperId, PublicationId, Role, Timestamp, UserId, ValidationError};
use serde::{Deserialize, Serialize};

use crate::status::PaperStatus;

/// Longest accepted title, in characters.
pub const MAX_TITLE_LEN: usize = 500;

/// Paper type. An empty or absent type means `research`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaperKind {
    /// Research paper.
    #[default]
    Research,
    /// Anything else.
    Other,
}

impl PaperKind {
    /// The persisted string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Research => "research",
            Self::Other => "other",
        }
    }
}

impl FromStr for PaperKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "research" => Ok(Self::Research),
            "other" => Ok(Self::Other),
            _ => Err(ValidationError::UnknownPaperKind(s.to_string())),
        }
    }
}

impl std::fmt::Display for PaperKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Publication metadata, written by editors (and validated by coordinators).
///
/// Field names on the wire match the persisted column names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperMetadata {
    /// Institution code.
    #[serde(default)]
    pub institution_code: String,
    /// Publication identifier. `None` until allocated.
    #[serde(default)]
    pub publication_id: Option<PublicationId>,
    /// ISCED field-of-education band.
    #[serde(default, rename = "publication_isced_band")]
    pub isced_band: String,
    /// Title in the local language.
    #[serde(default, rename = "publication_title_amharic")]
    pub localized_title: String,
    /// Date of publication.
    #[serde(default)]
    pub publication_date: Option<Timestamp>,
    /// Publication type (article, proceedings, ...).
    #[serde(default)]
    pub publication_type: String,
    /// Journal type.
    #[serde(default)]
    pub journal_type: String,
    /// Journal name.
    #[serde(default)]
    pub journal_name: String,
    /// Whether the paper documents indigenous knowledge.
    #[serde(default)]
    pub indigenous_knowledge: bool,
}

/// One entry of a paper's status log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    /// Status before the change; `None` for creation.
    pub from: Option<PaperStatus>,
    /// Status after the change.
    pub to: PaperStatus,
    /// Role of the actor who made the change.
    pub actor_role: Role,
    /// When it happened.
    pub at: Timestamp,
}

/// The author-supplied text fields of a paper.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperContent {
    pub title: String,
    #[serde(default, rename = "abstract")]
    pub abstract_text: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub file_url: String,
}

impl PaperContent {
    /// Title is required and bounded; the other fields are free text.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("title", &self.title, MAX_TITLE_LEN)
    }
}

/// Author input for a new paper.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPaper {
    #[serde(flatten)]
    pub content: PaperContent,
    #[serde(default, rename = "type")]
    pub kind: PaperKind,
}

impl NewPaper {
    /// Check required fields.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.content.validate()
    }
}

/// A paper with its lifecycle state and status history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paper {
    pub id: PaperId,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub content: String,
    pub file_url: String,
    pub author_id: UserId,
    pub status: PaperStatus,
    #[serde(rename = "type")]
    pub kind: PaperKind,
    #[serde(flatten)]
    pub metadata: PaperMetadata,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    /// Ordered log of status changes, oldest first.
    #[serde(default)]
    pub status_log: Vec<StatusChange>,
}

impl Paper {
    /// Build a freshly submitted paper. Creation skips `draft`.
    pub fn submitted(input: NewPaper, author_id: UserId, actor_role: Role, now: Timestamp) -> Self {
        let PaperContent {
            title,
            abstract_text,
            content,
            file_url,
        } = input.content;
        Self {
            id: PaperId::new(),
            title,
            abstract_text,
            content,
            file_url,
            author_id,
            status: PaperStatus::Submitted,
            kind: input.kind,
            metadata: PaperMetadata::default(),
            created_at: now,
            updated_at: now,
            status_log: vec![StatusChange {
                from: None,
                to: PaperStatus::Submitted,
                actor_role,
                at: now,
            }],
        }
    }

    /// Replace the author-supplied text fields. Callers validate first.
    pub fn set_content(&mut self, content: PaperContent) {
        self.title = content.title;
        self.abstract_text = content.abstract_text;
        self.content = content.content;
        self.file_url = content.file_url;
    }

    /// Move to the change's target status and append it to the log.
    pub fn record(&mut self, change: StatusChange) {
        self.status = change.to;
        self.status_log.push(change);
    }

    /// Whether `user` wrote this paper.
    pub fn is_authored_by(&self, user: UserId) -> bool {
        self.author_id == user
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transition::{PaperAction, Transition};

    fn sample(now: Timestamp) -> Paper {
        Paper::submitted(
            NewPaper {
                content: PaperContent {
                    title: "Soil Retention in Arid Zones".into(),
                    abstract_text: "Terracing study".into(),
                    ..Default::default()
                },
                kind: PaperKind::Research,
            },
            UserId::new(),
            Role::Author,
            now,
        )
    }

    #[test]
    fn new_papers_start_submitted_with_one_log_entry() {
        let now = Timestamp::now();
        let paper = sample(now);
        assert_eq!(paper.status, PaperStatus::Submitted);
        assert_eq!(paper.kind, PaperKind::Research);
        assert_eq!(paper.metadata.publication_id, None);
        assert_eq!(paper.status_log.len(), 1);
        assert_eq!(paper.status_log[0].from, None);
    }

    #[test]
    fn record_moves_status_and_appends() {
        let now = Timestamp::now();
        let mut paper = sample(now);
        let transition = Transition {
            action: PaperAction::Recommend,
            from: Some(PaperStatus::Submitted),
            to: PaperStatus::RecommendedForPublication,
            guarded: true,
        };
        paper.record(transition.change(Role::Editor, now).unwrap());
        assert_eq!(paper.status, PaperStatus::RecommendedForPublication);
        assert_eq!(paper.status_log.len(), 2);
        let last = paper.status_log.last().unwrap();
        assert_eq!(last.from, Some(PaperStatus::Submitted));
        assert_eq!(last.actor_role, Role::Editor);
    }

    #[test]
    fn kind_parsing_defaults_blank_to_research() {
        assert_eq!("".parse::<PaperKind>().unwrap(), PaperKind::Research);
        assert_eq!("other".parse::<PaperKind>().unwrap(), PaperKind::Other);
        assert!("thesis".parse::<PaperKind>().is_err());
    }

    #[test]
    fn title_is_required_and_bounded() {
        let blank = NewPaper::default();
        assert_eq!(
            blank.validate(),
            Err(ValidationError::Required { field: "title" })
        );
        let long = PaperContent {
            title: "x".repeat(MAX_TITLE_LEN + 1),
            ..Default::default()
        };
        assert!(matches!(long.validate(), Err(ValidationError::TooLong { .. })));
    }

    #[test]
    fn new_paper_reads_flat_json_with_default_type() {
        let input: NewPaper =
            serde_json::from_str(r#"{"title":"Groundwater Recharge","abstract":"Basin survey"}"#)
                .unwrap();
        assert_eq!(input.content.title, "Groundwater Recharge");
        assert_eq!(input.content.abstract_text, "Basin survey");
        assert_eq!(input.kind, PaperKind::Research);
    }

    #[test]
    fn wire_format_uses_column_names() {
        let paper = sample(Timestamp::now());
        let json = serde_json::to_value(&paper).unwrap();
        assert_eq!(json["abstract"], "Terracing study");
        assert_eq!(json["type"], "research");
        assert_eq!(json["status"], "submitted");
        assert!(json["publication_id"].is_null());
        assert_eq!(json["indigenous_knowledge"], false);
        let back: Paper = serde_json::from_value(json).unwrap();
        assert_eq!(back, paper);
    }
}
