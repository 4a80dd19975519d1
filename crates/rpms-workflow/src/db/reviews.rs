//! Review persistence operations.

use chrono::{DateTime, Utc};
use rpms_core::{PaperId, ReviewId, Timestamp, UserId};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::StoreError;
use crate::model::{Review, ReviewWithReviewer};

/// Insert a review.
pub async fn insert(pool: &PgPool, review: &Review) -> Result<(), StoreError> {
    sqlx::query(
        "INSERT INTO reviews (id, paper_id, reviewer_id, rating, comments, recommendation,
             created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(review.id.0)
    .bind(review.paper_id.0)
    .bind(review.reviewer_id.0)
    .bind(review.rating)
    .bind(&review.comments)
    .bind(&review.recommendation)
    .bind(review.created_at.into_datetime())
    .bind(review.updated_at.into_datetime())
    .execute(pool)
    .await?;

    Ok(())
}

/// Reviews with reviewer details and paper title, newest first, optionally
/// for one paper.
pub async fn list(
    pool: &PgPool,
    paper: Option<PaperId>,
) -> Result<Vec<ReviewWithReviewer>, StoreError> {
    let rows = sqlx::query_as::<_, ReviewWithReviewerRow>(
        "SELECT r.id, r.paper_id, r.reviewer_id, r.rating, r.comments, r.recommendation,
                r.created_at, r.updated_at,
                u.name AS reviewer_name, u.email AS reviewer_email, p.title AS paper_title
         FROM reviews r
         JOIN papers p ON p.id = r.paper_id
         LEFT JOIN users u ON u.id = r.reviewer_id
         WHERE $1::uuid IS NULL OR r.paper_id = $1
         ORDER BY r.created_at DESC",
    )
    .bind(paper.map(|p| p.0))
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| ReviewWithReviewer {
            review: row.review.into_review(),
            reviewer_name: row.reviewer_name,
            reviewer_email: row.reviewer_email,
            paper_title: row.paper_title,
        })
        .collect())
}

/// Reviewer of the earliest review of the paper.
pub async fn reviewer_of_record(pool: &PgPool, paper: PaperId) -> Result<Option<UserId>, StoreError> {
    let reviewer: Option<Uuid> = sqlx::query_scalar(
        "SELECT reviewer_id FROM reviews WHERE paper_id = $1
         ORDER BY created_at, id
         LIMIT 1",
    )
    .bind(paper.0)
    .fetch_optional(pool)
    .await?;

    Ok(reviewer.map(UserId))
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: Uuid,
    paper_id: Uuid,
    reviewer_id: Uuid,
    rating: i32,
    comments: String,
    recommendation: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct ReviewWithReviewerRow {
    #[sqlx(flatten)]
    review: ReviewRow,
    reviewer_name: Option<String>,
    reviewer_email: Option<String>,
    paper_title: String,
}

impl ReviewRow {
    fn into_review(self) -> Review {
        Review {
            id: ReviewId(self.id),
            paper_id: PaperId(self.paper_id),
            reviewer_id: UserId(self.reviewer_id),
            rating: self.rating,
            comments: self.comments,
            recommendation: self.recommendation,
            created_at: Timestamp::from_utc(self.created_at),
            updated_at: Timestamp::from_utc(self.updated_at),
        }
    }
}
