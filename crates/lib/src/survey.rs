//! # Survey Catalog
//!
//! The list of questions users answer. Questions are inserted in bulk by an
//! administrator and never modified afterwards; each carries a category that
//! decides which profile fields its answers feed.

use crate::{errors::PersonaError, store::rollback};
use serde::{Deserialize, Serialize};
use tracing::info;
use turso::{params, Connection, Database};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SurveyQuestion {
    pub id: i64,
    pub question_text: String,
    pub category: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSurveyQuestion {
    pub question_text: String,
    pub category: String,
}

impl NewSurveyQuestion {
    pub fn new(question_text: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            question_text: question_text.into(),
            category: category.into(),
        }
    }
}

/// Returns every question in the catalog, in insertion order.
pub async fn list_questions(db: &Database) -> Result<Vec<SurveyQuestion>, PersonaError> {
    let conn = db.connect()?;
    let mut rows = conn
        .query(
            "SELECT id, question_text, category FROM survey_questions ORDER BY id ASC",
            (),
        )
        .await?;

    let mut questions = Vec::new();
    while let Some(row) = rows.next().await? {
        questions.push(SurveyQuestion {
            id: row.get(0)?,
            question_text: row.get(1)?,
            category: row.get(2)?,
        });
    }
    Ok(questions)
}

/// Inserts every question in a single transaction and returns how many were added.
///
/// No duplicate detection is done: submitting the same text twice yields two questions.
pub async fn bulk_create_questions(
    db: &Database,
    questions: &[NewSurveyQuestion],
) -> Result<usize, PersonaError> {
    if questions.is_empty() {
        return Ok(0);
    }

    let conn = db.connect()?;
    conn.execute("BEGIN TRANSACTION", ()).await?;
    match insert_questions(&conn, questions).await {
        Ok(count) => {
            conn.execute("COMMIT", ()).await?;
            info!("Transaction committed. Added {count} survey questions.");
            Ok(count)
        }
        Err(e) => {
            rollback(&conn).await;
            Err(e)
        }
    }
}

async fn insert_questions(
    conn: &Connection,
    questions: &[NewSurveyQuestion],
) -> Result<usize, PersonaError> {
    for question in questions {
        conn.execute(
            "INSERT INTO survey_questions (question_text, category) VALUES (?, ?)",
            params![question.question_text.clone(), question.category.clone()],
        )
        .await?;
    }
    Ok(questions.len())
}

pub(crate) async fn question_exists(
    conn: &Connection,
    question_id: i64,
) -> Result<bool, PersonaError> {
    Ok(conn
        .query(
            "SELECT 1 FROM survey_questions WHERE id = ?",
            params![question_id],
        )
        .await?
        .next()
        .await?
        .is_some())
}
