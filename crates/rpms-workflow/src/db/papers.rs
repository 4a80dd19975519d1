//! Paper persistence operations.
//!
//! Updates are partial: each column is rewritten only when the patch carries
//! it, and the status log is appended in SQL, so two writers touching
//! different parts of a row do not clobber each other.

use chrono::{DateTime, Utc};
use rpms_core::{PaperId, PublicationId, Timestamp, UserId, PUBLICATION_PREFIX};
use rpms_state::{Paper, PaperKind, PaperMetadata, PaperStatus, StatusChange};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::StoreError;
use crate::model::PaperWithAuthor;
use crate::store::PaperPatch;

const COLUMNS: &str = "id, title, abstract, content, file_url, author_id, status, type, \
     institution_code, publication_id, publication_isced_band, publication_title_amharic, \
     publication_date, publication_type, journal_type, journal_name, indigenous_knowledge, \
     status_log, created_at, updated_at";

/// Insert a new paper.
pub async fn insert(pool: &PgPool, paper: &Paper) -> Result<(), StoreError> {
    let status_log = serde_json::to_value(&paper.status_log)
        .map_err(|e| StoreError::Corrupt(format!("failed to serialize status_log: {e}")))?;
    let meta = &paper.metadata;

    sqlx::query(
        "INSERT INTO papers (id, title, abstract, content, file_url, author_id, status, type,
             institution_code, publication_id, publication_isced_band, publication_title_amharic,
             publication_date, publication_type, journal_type, journal_name, indigenous_knowledge,
             status_log, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
             $18, $19, $20)",
    )
    .bind(paper.id.0)
    .bind(&paper.title)
    .bind(&paper.abstract_text)
    .bind(&paper.content)
    .bind(&paper.file_url)
    .bind(paper.author_id.0)
    .bind(paper.status.as_str())
    .bind(paper.kind.as_str())
    .bind(&meta.institution_code)
    .bind(meta.publication_id.as_ref().map(PublicationId::as_str))
    .bind(&meta.isced_band)
    .bind(&meta.localized_title)
    .bind(meta.publication_date.map(Timestamp::into_datetime))
    .bind(&meta.publication_type)
    .bind(&meta.journal_type)
    .bind(&meta.journal_name)
    .bind(meta.indigenous_knowledge)
    .bind(&status_log)
    .bind(paper.created_at.into_datetime())
    .bind(paper.updated_at.into_datetime())
    .execute(pool)
    .await
    .map_err(|e| with_publication_id(e, meta.publication_id.as_ref()))?;

    Ok(())
}

/// Fetch a paper by ID.
pub async fn get_by_id(pool: &PgPool, id: PaperId) -> Result<Option<Paper>, StoreError> {
    let row = sqlx::query_as::<_, PaperRow>(&format!("SELECT {COLUMNS} FROM papers WHERE id = $1"))
        .bind(id.0)
        .fetch_optional(pool)
        .await?;

    row.map(PaperRow::into_paper).transpose()
}

/// Apply a partial update and return the new row.
///
/// `None` when the paper does not exist. A status precondition that no
/// longer holds is reported as [`StoreError::StaleStatus`].
pub async fn update(
    pool: &PgPool,
    id: PaperId,
    patch: &PaperPatch,
) -> Result<Option<Paper>, StoreError> {
    let content = patch.content.as_ref();
    let has_metadata = patch.metadata.is_some();
    let meta = patch.metadata.clone().unwrap_or_default();
    let appended = patch
        .status_change
        .as_ref()
        .map(|change| serde_json::to_value([change]))
        .transpose()
        .map_err(|e| StoreError::Corrupt(format!("failed to serialize status change: {e}")))?;

    let sql = format!(
        "UPDATE papers SET
             title = COALESCE($2, title),
             abstract = COALESCE($3, abstract),
             content = COALESCE($4, content),
             file_url = COALESCE($5, file_url),
             status = COALESCE($6, status),
             status_log = CASE WHEN $7::jsonb IS NULL THEN status_log
                               ELSE status_log || $7::jsonb END,
             institution_code = CASE WHEN $8 THEN $9 ELSE institution_code END,
             publication_id = CASE WHEN $8 THEN $10 ELSE publication_id END,
             publication_isced_band = CASE WHEN $8 THEN $11 ELSE publication_isced_band END,
             publication_title_amharic = CASE WHEN $8 THEN $12 ELSE publication_title_amharic END,
             publication_date = CASE WHEN $8 THEN $13 ELSE publication_date END,
             publication_type = CASE WHEN $8 THEN $14 ELSE publication_type END,
             journal_type = CASE WHEN $8 THEN $15 ELSE journal_type END,
             journal_name = CASE WHEN $8 THEN $16 ELSE journal_name END,
             indigenous_knowledge = CASE WHEN $8 THEN $17 ELSE indigenous_knowledge END,
             updated_at = $18
         WHERE id = $1 AND ($19::text IS NULL OR status = $19::text)
         RETURNING {COLUMNS}"
    );

    let row = sqlx::query_as::<_, PaperRow>(&sql)
        .bind(id.0)
        .bind(content.map(|c| c.title.as_str()))
        .bind(content.map(|c| c.abstract_text.as_str()))
        .bind(content.map(|c| c.content.as_str()))
        .bind(content.map(|c| c.file_url.as_str()))
        .bind(patch.status_change.as_ref().map(|c| c.to.as_str()))
        .bind(appended)
        .bind(has_metadata)
        .bind(&meta.institution_code)
        .bind(meta.publication_id.as_ref().map(PublicationId::as_str))
        .bind(&meta.isced_band)
        .bind(&meta.localized_title)
        .bind(meta.publication_date.map(Timestamp::into_datetime))
        .bind(&meta.publication_type)
        .bind(&meta.journal_type)
        .bind(&meta.journal_name)
        .bind(meta.indigenous_knowledge)
        .bind(patch.updated_at.into_datetime())
        .bind(patch.expected_status.map(|s| s.as_str()))
        .fetch_optional(pool)
        .await
        .map_err(|e| with_publication_id(e, meta.publication_id.as_ref()))?;

    match (row, patch.expected_status) {
        (Some(row), _) => row.into_paper().map(Some),
        (None, None) => Ok(None),
        (None, Some(expected)) => {
            let current: Option<String> =
                sqlx::query_scalar("SELECT status FROM papers WHERE id = $1")
                    .bind(id.0)
                    .fetch_optional(pool)
                    .await?;
            match current {
                None => Ok(None),
                Some(raw) => Err(StoreError::StaleStatus {
                    expected,
                    actual: parse_status(id.0, &raw)?,
                }),
            }
        }
    }
}

/// Delete a paper. Reviews go with it (`ON DELETE CASCADE`).
pub async fn delete(pool: &PgPool, id: PaperId) -> Result<bool, StoreError> {
    let result = sqlx::query("DELETE FROM papers WHERE id = $1")
        .bind(id.0)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Every paper with its author's name and email, newest first.
pub async fn list(pool: &PgPool) -> Result<Vec<PaperWithAuthor>, StoreError> {
    let rows = sqlx::query_as::<_, PaperWithAuthorRow>(&format!(
        "SELECT {COLUMNS}, author_name, author_email
         FROM (SELECT papers.*, u.name AS author_name, u.email AS author_email
               FROM papers LEFT JOIN users u ON u.id = papers.author_id) AS p
         ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|row| {
            Ok(PaperWithAuthor {
                paper: row.paper.into_paper()?,
                author_name: row.author_name,
                author_email: row.author_email,
            })
        })
        .collect()
}

/// Greatest `publication_id` with the standard prefix, compared as text.
pub async fn max_publication_id(pool: &PgPool) -> Result<Option<String>, StoreError> {
    let max: Option<String> = sqlx::query_scalar(
        "SELECT publication_id FROM papers
         WHERE publication_id LIKE $1
         ORDER BY publication_id DESC
         LIMIT 1",
    )
    .bind(format!("{PUBLICATION_PREFIX}%"))
    .fetch_optional(pool)
    .await?;

    Ok(max)
}

/// Replace the constraint message with the identifier that collided.
fn with_publication_id(e: sqlx::Error, id: Option<&PublicationId>) -> StoreError {
    match (StoreError::from(e), id) {
        (StoreError::DuplicatePublicationId(_), Some(id)) => {
            StoreError::DuplicatePublicationId(id.to_string())
        }
        (other, _) => other,
    }
}

fn parse_status(id: Uuid, raw: &str) -> Result<PaperStatus, StoreError> {
    raw.parse()
        .map_err(|e| StoreError::Corrupt(format!("paper {id}: {e}")))
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct PaperRow {
    id: Uuid,
    title: String,
    #[sqlx(rename = "abstract")]
    abstract_text: String,
    content: String,
    file_url: String,
    author_id: Uuid,
    status: String,
    #[sqlx(rename = "type")]
    kind: String,
    institution_code: String,
    publication_id: Option<String>,
    publication_isced_band: String,
    publication_title_amharic: String,
    publication_date: Option<DateTime<Utc>>,
    publication_type: String,
    journal_type: String,
    journal_name: String,
    indigenous_knowledge: bool,
    status_log: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct PaperWithAuthorRow {
    #[sqlx(flatten)]
    paper: PaperRow,
    author_name: Option<String>,
    author_email: Option<String>,
}

impl PaperRow {
    fn into_paper(self) -> Result<Paper, StoreError> {
        let status = parse_status(self.id, &self.status)?;

        let kind = self.kind.parse::<PaperKind>().unwrap_or_else(|e| {
            tracing::warn!(
                id = %self.id,
                kind = %self.kind,
                error = %e,
                "unknown paper type in database, defaulting to research"
            );
            PaperKind::Research
        });

        let publication_id = self
            .publication_id
            .filter(|raw| !raw.is_empty())
            .and_then(|raw| match PublicationId::parse(&raw) {
                Ok(id) => Some(id),
                Err(e) => {
                    tracing::warn!(
                        id = %self.id,
                        error = %e,
                        "malformed publication identifier in database, ignoring"
                    );
                    None
                }
            });

        let status_log: Vec<StatusChange> = serde_json::from_value(self.status_log)
            .unwrap_or_else(|e| {
                tracing::warn!(
                    id = %self.id,
                    error = %e,
                    "failed to deserialize paper status_log, defaulting to empty"
                );
                Vec::new()
            });

        Ok(Paper {
            id: PaperId(self.id),
            title: self.title,
            abstract_text: self.abstract_text,
            content: self.content,
            file_url: self.file_url,
            author_id: UserId(self.author_id),
            status,
            kind,
            metadata: PaperMetadata {
                institution_code: self.institution_code,
                publication_id,
                isced_band: self.publication_isced_band,
                localized_title: self.publication_title_amharic,
                publication_date: self.publication_date.map(Timestamp::from_utc),
                publication_type: self.publication_type,
                journal_type: self.journal_type,
                journal_name: self.journal_name,
                indigenous_knowledge: self.indigenous_knowledge,
            },
            created_at: Timestamp::from_utc(self.created_at),
            updated_at: Timestamp::from_utc(self.updated_at),
            status_log,
        })
    }
}
