//! # Response Store
//!
//! Per-user answers to survey questions. A user has at most one answer per
//! question; resubmitting overwrites the stored text.

use crate::{errors::PersonaError, store::rollback, survey::question_exists};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use turso::{params, Connection, Database};

/// One answer in a submission batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveyAnswer {
    pub question_id: i64,
    pub response_text: String,
}

impl SurveyAnswer {
    pub fn new(question_id: i64, response_text: impl Into<String>) -> Self {
        Self {
            question_id,
            response_text: response_text.into(),
        }
    }
}

/// How a submission batch was applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SubmissionSummary {
    pub inserted: usize,
    pub updated: usize,
}

/// A stored answer joined with its question, as returned by the read-back endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnsweredQuestion {
    pub question_id: i64,
    pub question_text: String,
    pub category: String,
    pub response_text: String,
}

/// Upserts a batch of answers for `user_id` in one transaction.
///
/// If any answer names a question that does not exist the whole batch is rolled
/// back and `QuestionNotFound` is returned.
pub async fn submit_responses(
    db: &Database,
    user_id: i64,
    answers: &[SurveyAnswer],
) -> Result<SubmissionSummary, PersonaError> {
    let conn = db.connect()?;

    conn.execute("BEGIN TRANSACTION", ()).await?;
    match upsert_answers(&conn, user_id, answers).await {
        Ok(summary) => {
            conn.execute("COMMIT", ()).await?;
            info!(
                user_id,
                inserted = summary.inserted,
                updated = summary.updated,
                "Committed survey responses."
            );
            Ok(summary)
        }
        Err(e) => {
            warn!(user_id, "Rolling back survey submission: {e}");
            rollback(&conn).await;
            Err(e)
        }
    }
}

async fn upsert_answers(
    conn: &Connection,
    user_id: i64,
    answers: &[SurveyAnswer],
) -> Result<SubmissionSummary, PersonaError> {
    let mut summary = SubmissionSummary::default();

    for answer in answers {
        if !question_exists(conn, answer.question_id).await? {
            return Err(PersonaError::QuestionNotFound(answer.question_id));
        }

        let existing_id: Option<i64> = match conn
            .query(
                "SELECT id FROM survey_responses WHERE user_id = ? AND question_id = ?",
                params![user_id, answer.question_id],
            )
            .await?
            .next()
            .await?
        {
            Some(row) => Some(row.get(0)?),
            None => None,
        };

        match existing_id {
            Some(response_id) => {
                conn.execute(
                    "UPDATE survey_responses SET response_text = ? WHERE id = ?",
                    params![answer.response_text.clone(), response_id],
                )
                .await?;
                summary.updated += 1;
            }
            None => {
                conn.execute(
                    "INSERT INTO survey_responses (user_id, question_id, response_text) VALUES (?, ?, ?)",
                    params![user_id, answer.question_id, answer.response_text.clone()],
                )
                .await?;
                summary.inserted += 1;
            }
        }
    }

    Ok(summary)
}

/// Lists the answers of `user_id` with their question text, ordered by question id.
///
/// Fails with `NoResponses` if the user has not answered anything.
pub async fn list_responses(
    db: &Database,
    user_id: i64,
) -> Result<Vec<AnsweredQuestion>, PersonaError> {
    let conn = db.connect()?;
    let answered = fetch_answered_questions(&conn, user_id).await?;
    if answered.is_empty() {
        return Err(PersonaError::NoResponses(user_id));
    }
    Ok(answered)
}

pub(crate) async fn fetch_answered_questions(
    conn: &Connection,
    user_id: i64,
) -> Result<Vec<AnsweredQuestion>, PersonaError> {
    let mut rows = conn
        .query(
            "
            SELECT q.id, q.question_text, q.category, r.response_text
            FROM survey_responses r
            JOIN survey_questions q ON q.id = r.question_id
            WHERE r.user_id = ?
            ORDER BY q.id ASC
            ",
            params![user_id],
        )
        .await?;

    let mut answered = Vec::new();
    while let Some(row) = rows.next().await? {
        answered.push(AnsweredQuestion {
            question_id: row.get(0)?,
            question_text: row.get(1)?,
            category: row.get(2)?,
            response_text: row.get(3)?,
        });
    }
    Ok(answered)
}
